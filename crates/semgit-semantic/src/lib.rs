//! The semantic change analysis pipeline.
//!
//! Turns path-level change records into structural intelligence:
//! - [`parser`] — tree-sitter declaration counting into [`semgit_core::StructuralStats`]
//! - [`delta`] — per-file signed structural deltas
//! - [`aggregate`] — single-pass accumulation over a whole diff
//! - [`classify`] — change-type and scope inference plus commit-message drafting

pub mod aggregate;
pub mod classify;
pub mod delta;
pub mod parser;

pub use aggregate::aggregate;
pub use classify::{classify, draft_message, has_meaningful_content, ChangeType, Classification};
pub use delta::analyze_delta;
pub use parser::structural_stats;
