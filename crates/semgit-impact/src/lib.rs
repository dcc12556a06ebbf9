//! Rule-based test-impact resolution.
//!
//! Maps a changed source path to its likely test path through an ordered
//! list of regex-to-template rules, falling back to the
//! `src/main/java` → `src/test/java/...Test.java` convention.

pub mod resolve;
pub mod rules;

pub use resolve::{default_convention, resolve, resolve_all};
pub use rules::{load_rules, ImpactRule, RuleOutcome};
