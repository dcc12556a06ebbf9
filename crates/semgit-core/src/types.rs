use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::SemgitError;

/// Classification of one path-level change between two tree snapshots.
///
/// Renamed and Copied records count as Modified for file statistics.
///
/// # Examples
///
/// ```
/// use semgit_core::ChangeKind;
///
/// assert_eq!(format!("{}", ChangeKind::Added), "added");
/// assert!(ChangeKind::Renamed.counts_as_modified());
/// assert!(!ChangeKind::Deleted.counts_as_modified());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Path exists only in the "to" tree.
    Added,
    /// Path exists in both trees with different content.
    Modified,
    /// Path exists only in the "from" tree.
    Deleted,
    /// Path moved; rename detected by the object store.
    Renamed,
    /// Path duplicated; copy detected by the object store.
    Copied,
}

impl ChangeKind {
    /// Whether this kind is bucketed as a modification for file counts.
    pub fn counts_as_modified(self) -> bool {
        matches!(
            self,
            ChangeKind::Modified | ChangeKind::Renamed | ChangeKind::Copied
        )
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::Renamed => write!(f, "renamed"),
            ChangeKind::Copied => write!(f, "copied"),
        }
    }
}

/// One path-level entry in a diff between two tree snapshots.
///
/// Invariants: at least one of `old_path` / `new_path` is set; `Deleted`
/// implies `new_path` is absent and `Added` implies `old_path` is absent.
/// Content ids are hex blob ids; the all-zero id is normalized to `None`
/// at the VCS boundary.
///
/// # Examples
///
/// ```
/// use semgit_core::{ChangeKind, ChangeRecord};
///
/// let record = ChangeRecord {
///     kind: ChangeKind::Deleted,
///     old_path: Some("src/old.java".into()),
///     new_path: None,
///     old_id: Some("abc123".into()),
///     new_id: None,
/// };
/// assert_eq!(record.path(), Some("src/old.java"));
/// ```
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// What happened to the path.
    pub kind: ChangeKind,
    /// Path in the "from" tree, if the file existed there.
    pub old_path: Option<String>,
    /// Path in the "to" tree, if the file exists there.
    pub new_path: Option<String>,
    /// Content id of the "from" side, if present.
    pub old_id: Option<String>,
    /// Content id of the "to" side, if present.
    pub new_id: Option<String>,
}

impl ChangeRecord {
    /// The representative path: the new path, unless the file was deleted.
    pub fn path(&self) -> Option<&str> {
        if self.kind == ChangeKind::Deleted {
            self.old_path.as_deref()
        } else {
            self.new_path.as_deref()
        }
    }
}

/// Counts of language-level declarations in one version of a source file.
///
/// All counts are zero when the parser cannot make sense of the input; a
/// parse failure never aborts the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralStats {
    /// Concrete type declarations (classes).
    pub types: u32,
    /// Interface declarations.
    pub interfaces: u32,
    /// Enum declarations.
    pub enums: u32,
    /// Method and constructor declarations.
    pub methods: u32,
    /// Field declarations.
    pub fields: u32,
}

impl StructuralStats {
    /// Signed pointwise difference `self − before`.
    ///
    /// # Examples
    ///
    /// ```
    /// use semgit_core::StructuralStats;
    ///
    /// let before = StructuralStats { types: 2, methods: 10, ..Default::default() };
    /// let after = StructuralStats { types: 1, methods: 12, ..Default::default() };
    /// let delta = after.delta_from(&before);
    /// assert_eq!(delta.types, -1);
    /// assert_eq!(delta.methods, 2);
    /// ```
    pub fn delta_from(&self, before: &StructuralStats) -> StructuralDelta {
        StructuralDelta {
            types: i64::from(self.types) - i64::from(before.types),
            interfaces: i64::from(self.interfaces) - i64::from(before.interfaces),
            enums: i64::from(self.enums) - i64::from(before.enums),
            methods: i64::from(self.methods) - i64::from(before.methods),
            fields: i64::from(self.fields) - i64::from(before.fields),
        }
    }
}

/// Signed, pointwise difference between two [`StructuralStats`] snapshots.
///
/// Components may be negative; a wholly deleted file yields the negation
/// of its last-known stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralDelta {
    /// Change in class declarations.
    pub types: i64,
    /// Change in interface declarations.
    pub interfaces: i64,
    /// Change in enum declarations.
    pub enums: i64,
    /// Change in method declarations.
    pub methods: i64,
    /// Change in field declarations.
    pub fields: i64,
}

impl StructuralDelta {
    /// Combined type-like delta: classes + interfaces + enums.
    ///
    /// This is the "types" counter reported in commit trailers and the
    /// metadata store.
    pub fn types_total(&self) -> i64 {
        self.types + self.interfaces + self.enums
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        *self == StructuralDelta::default()
    }

    /// Accumulate another delta into this one.
    pub fn accumulate(&mut self, other: &StructuralDelta) {
        self.types += other.types;
        self.interfaces += other.interfaces;
        self.enums += other.enums;
        self.methods += other.methods;
        self.fields += other.fields;
    }
}

/// An insertion-ordered mapping from label to count.
///
/// The first occurrence of a label fixes its position, which keeps bucket
/// output deterministic for identical input ordering.
///
/// # Examples
///
/// ```
/// use semgit_core::Buckets;
///
/// let mut buckets = Buckets::default();
/// buckets.increment("java");
/// buckets.increment("markdown");
/// buckets.increment("java");
/// let entries: Vec<_> = buckets.iter().collect();
/// assert_eq!(entries, vec![("java", 2), ("markdown", 1)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets(Vec<(String, u64)>);

impl Buckets {
    /// Add one to the count for `label`, inserting it at the end if new.
    pub fn increment(&mut self, label: &str) {
        if let Some(entry) = self.0.iter_mut().find(|(l, _)| l == label) {
            entry.1 += 1;
        } else {
            self.0.push((label.to_string(), 1));
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no labels have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Buckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Accumulated change statistics for a whole diff.
///
/// Invariant: `files_added + files_modified + files_deleted` equals the
/// number of change records aggregated (Renamed/Copied count as Modified).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    /// Files present only in the "to" tree.
    pub files_added: u64,
    /// Files changed in place, renamed, or copied.
    pub files_modified: u64,
    /// Files present only in the "from" tree.
    pub files_deleted: u64,
    /// Structural delta summed across recognized source files.
    pub structural: StructuralDelta,
    /// Touched files bucketed by language label.
    pub by_language: Buckets,
    /// Touched files bucketed by top-level directory.
    pub by_directory: Buckets,
    /// Ordered, duplicate-free scope labels across all touched paths.
    pub scopes: Vec<String>,
}

impl AggregatedSummary {
    /// Record a scope label, preserving first-seen order without duplicates.
    pub fn push_scope(&mut self, scope: &str) {
        if !scope.is_empty() && !self.scopes.iter().any(|s| s == scope) {
            self.scopes.push(scope.to_string());
        }
    }

    /// Total number of change records counted.
    pub fn files_total(&self) -> u64 {
        self.files_added + self.files_modified + self.files_deleted
    }
}

/// Read access to file content in the VCS object store.
///
/// Implemented by the git layer; consumed by the structural delta analyzer
/// so the analysis crate stays independent of git plumbing.
pub trait ContentStore {
    /// Load the content behind a hex blob id.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Git`] when the id does not resolve.
    fn read_content(&self, id: &str) -> Result<Vec<u8>, SemgitError>;
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap`.
///
/// # Examples
///
/// ```
/// use semgit_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown change summaries (default).
    #[default]
    Markdown,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "md"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representative_path_prefers_new_unless_deleted() {
        let modified = ChangeRecord {
            kind: ChangeKind::Renamed,
            old_path: Some("a.java".into()),
            new_path: Some("b.java".into()),
            old_id: None,
            new_id: None,
        };
        assert_eq!(modified.path(), Some("b.java"));

        let deleted = ChangeRecord {
            kind: ChangeKind::Deleted,
            old_path: Some("a.java".into()),
            new_path: None,
            old_id: None,
            new_id: None,
        };
        assert_eq!(deleted.path(), Some("a.java"));
    }

    #[test]
    fn renamed_and_copied_count_as_modified() {
        assert!(ChangeKind::Modified.counts_as_modified());
        assert!(ChangeKind::Renamed.counts_as_modified());
        assert!(ChangeKind::Copied.counts_as_modified());
        assert!(!ChangeKind::Added.counts_as_modified());
        assert!(!ChangeKind::Deleted.counts_as_modified());
    }

    #[test]
    fn delta_of_identical_stats_is_zero() {
        let stats = StructuralStats {
            types: 3,
            interfaces: 1,
            enums: 0,
            methods: 12,
            fields: 7,
        };
        assert!(stats.delta_from(&stats).is_zero());
    }

    #[test]
    fn delta_of_new_file_equals_after_stats() {
        let after = StructuralStats {
            types: 2,
            interfaces: 1,
            enums: 1,
            methods: 5,
            fields: 3,
        };
        let delta = after.delta_from(&StructuralStats::default());
        assert_eq!(delta.types, 2);
        assert_eq!(delta.methods, 5);
        assert_eq!(delta.types_total(), 4);
    }

    #[test]
    fn delta_of_deleted_file_is_negated_before_stats() {
        let before = StructuralStats {
            types: 2,
            interfaces: 0,
            enums: 1,
            methods: 8,
            fields: 4,
        };
        let delta = StructuralStats::default().delta_from(&before);
        assert_eq!(delta.types, -2);
        assert_eq!(delta.enums, -1);
        assert_eq!(delta.methods, -8);
        assert_eq!(delta.fields, -4);
    }

    #[test]
    fn accumulate_sums_componentwise() {
        let mut total = StructuralDelta::default();
        total.accumulate(&StructuralDelta {
            types: 1,
            methods: 3,
            ..Default::default()
        });
        total.accumulate(&StructuralDelta {
            types: -2,
            fields: 1,
            ..Default::default()
        });
        assert_eq!(total.types, -1);
        assert_eq!(total.methods, 3);
        assert_eq!(total.fields, 1);
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let mut buckets = Buckets::default();
        buckets.increment("src");
        buckets.increment("docs");
        buckets.increment("src");
        buckets.increment("build");
        let entries: Vec<_> = buckets.iter().collect();
        assert_eq!(entries, vec![("src", 2), ("docs", 1), ("build", 1)]);
    }

    #[test]
    fn buckets_serialize_in_insertion_order() {
        let mut buckets = Buckets::default();
        buckets.increment("zeta");
        buckets.increment("alpha");
        let json = serde_json::to_string(&buckets).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":1}"#);
    }

    #[test]
    fn scopes_are_deduplicated_in_order() {
        let mut summary = AggregatedSummary::default();
        summary.push_scope("docs");
        summary.push_scope("core");
        summary.push_scope("docs");
        summary.push_scope("");
        assert_eq!(summary.scopes, vec!["docs", "core"]);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = AggregatedSummary::default();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("filesAdded").is_some());
        assert!(json.get("byLanguage").is_some());
        assert!(json.get("files_added").is_none());
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
