//! Append-only commit metadata persistence.
//!
//! One JSON record per completed commit, newline-delimited, UTF-8. Records
//! are created once by the post-commit pipeline stage and never mutated or
//! deleted; [`MetaStore`] is the sole owner of durability.

pub mod store;

pub use store::{MetaRecord, MetaStore, MetaSummary};
