//! Core types, configuration, and error handling for semgit.
//!
//! This crate provides the shared foundation used by all other semgit crates:
//! - [`SemgitError`] — unified error type using `thiserror`
//! - [`SemgitConfig`] — configuration loaded from `.semgit/config.json`
//! - Shared types: [`ChangeKind`], [`ChangeRecord`], [`StructuralStats`],
//!   [`StructuralDelta`], [`AggregatedSummary`], [`Buckets`], [`OutputFormat`]
//! - [`ContentStore`] — the seam between the VCS layer and the analysis layer

mod config;
mod error;
mod types;

pub use config::SemgitConfig;
pub use error::SemgitError;
pub use types::{
    AggregatedSummary, Buckets, ChangeKind, ChangeRecord, ContentStore, OutputFormat,
    StructuralDelta, StructuralStats,
};

/// A convenience `Result` type for semgit operations.
pub type Result<T> = std::result::Result<T, SemgitError>;
