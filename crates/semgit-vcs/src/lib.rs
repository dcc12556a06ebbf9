//! Tree diff resolution over git2.
//!
//! Resolves refs to tree snapshots (with an [`TreeRef::Empty`] sentinel for
//! the first-commit and empty-repository cases), computes path-level change
//! records with rename detection, and exposes blob loading for the
//! structural delta analyzer.

pub mod repo;

pub use repo::{HeadCommit, Repository, TreeRef};
