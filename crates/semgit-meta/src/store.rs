use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use semgit_core::{SemgitError, StructuralDelta};
use serde::{Deserialize, Serialize};

/// The five summary counters persisted per commit.
///
/// Every field defaults to zero when absent in stored JSON, so older or
/// partial records still read back cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSummary {
    #[serde(default)]
    pub files_added: i64,
    #[serde(default)]
    pub files_modified: i64,
    #[serde(default)]
    pub files_deleted: i64,
    #[serde(default)]
    pub structural_types_delta: i64,
    #[serde(default)]
    pub structural_methods_delta: i64,
}

impl MetaSummary {
    /// Build the persisted counters from file counts and a structural delta.
    pub fn new(added: u64, modified: u64, deleted: u64, structural: &StructuralDelta) -> Self {
        Self {
            files_added: added as i64,
            files_modified: modified as i64,
            files_deleted: deleted as i64,
            structural_types_delta: structural.types_total(),
            structural_methods_delta: structural.methods,
        }
    }
}

/// One persisted fact per commit: immutable id, ISO-8601 timestamp, and
/// the summary counters.
///
/// # Examples
///
/// ```
/// use semgit_meta::{MetaRecord, MetaSummary};
///
/// let record = MetaRecord {
///     commit_id: "abc123".into(),
///     timestamp: "2024-05-01T10:00:00+00:00".into(),
///     summary: MetaSummary { files_added: 1, ..Default::default() },
/// };
/// let json = serde_json::to_string(&record).unwrap();
/// assert!(json.contains("\"commitId\":\"abc123\""));
/// assert!(json.contains("\"files_added\":1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    /// Immutable VCS commit identifier.
    pub commit_id: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// The five summary counters.
    pub summary: MetaSummary,
}

/// Fixed column order of the CSV export.
const CSV_HEADER: &str = "commitId,timestamp,files_added,files_modified,files_deleted,\
structural_types_delta,structural_methods_delta";

/// An append-only, newline-delimited metadata log.
///
/// Appends never overwrite or reorder prior entries. The design assumes a
/// single concurrent writer (one post-commit hook per commit); there is no
/// cross-process locking.
pub struct MetaStore {
    path: PathBuf,
}

impl MetaStore {
    /// A store backed by the log file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The conventional store location under a repository root.
    pub fn in_repo(root: &Path) -> Self {
        Self::new(root.join(".semgit/meta.jsonl"))
    }

    /// Append one newline-terminated record, creating the containing
    /// directory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Store`] on any I/O failure.
    pub fn append(&self, record: &MetaRecord) -> Result<(), SemgitError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SemgitError::Store(format!("failed to create {}: {e}", parent.display())))?;
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SemgitError::Store(format!("failed to open {}: {e}", self.path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| SemgitError::Store(format!("failed to append: {e}")))?;
        Ok(())
    }

    /// A lazy iterator over records in file order, oldest first.
    ///
    /// Malformed lines are skipped rather than aborting the read. A missing
    /// log reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Store`] when the log exists but cannot be
    /// opened.
    pub fn read_all(&self) -> Result<Records, SemgitError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Records {
                lines: Some(BufReader::new(file).lines()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records { lines: None }),
            Err(e) => Err(SemgitError::Store(format!(
                "failed to open {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// The most recent well-formed record, if any.
    ///
    /// # Errors
    ///
    /// Propagates [`SemgitError::Store`] from [`MetaStore::read_all`].
    pub fn read_last(&self) -> Result<Option<MetaRecord>, SemgitError> {
        Ok(self.read_all()?.last())
    }

    /// The record for `commit_id`, if one was persisted.
    ///
    /// # Errors
    ///
    /// Propagates [`SemgitError::Store`] from [`MetaStore::read_all`].
    pub fn find(&self, commit_id: &str) -> Result<Option<MetaRecord>, SemgitError> {
        Ok(self.read_all()?.find(|r| r.commit_id == commit_id))
    }

    /// Export the whole log as CSV lines, header first.
    ///
    /// Absent summary fields render as `0`; fields containing a comma,
    /// quote, or newline are quoted with doubled embedded quotes.
    ///
    /// # Errors
    ///
    /// Propagates [`SemgitError::Store`] from [`MetaStore::read_all`].
    pub fn export_csv(&self) -> Result<Vec<String>, SemgitError> {
        let mut rows = vec![CSV_HEADER.to_string()];
        for record in self.read_all()? {
            let s = record.summary;
            rows.push(format!(
                "{},{},{},{},{},{},{}",
                csv_field(&record.commit_id),
                csv_field(&record.timestamp),
                s.files_added,
                s.files_modified,
                s.files_deleted,
                s.structural_types_delta,
                s.structural_methods_delta,
            ));
        }
        Ok(rows)
    }
}

/// Lazy record iterator returned by [`MetaStore::read_all`].
pub struct Records {
    lines: Option<std::io::Lines<BufReader<File>>>,
}

impl Iterator for Records {
    type Item = MetaRecord;

    fn next(&mut self) -> Option<MetaRecord> {
        let lines = self.lines.as_mut()?;
        for line in lines {
            let Ok(line) = line else { return None };
            if let Ok(record) = serde_json::from_str::<MetaRecord>(&line) {
                return Some(record);
            }
            // Malformed line: skip and keep reading.
        }
        None
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, added: i64) -> MetaRecord {
        MetaRecord {
            commit_id: id.into(),
            timestamp: "2024-05-01T10:00:00+00:00".into(),
            summary: MetaSummary {
                files_added: added,
                files_modified: 2,
                files_deleted: 1,
                structural_types_delta: -1,
                structural_methods_delta: 3,
            },
        }
    }

    #[test]
    fn append_then_read_last_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetaStore::new(dir.path().join("nested/meta.jsonl"));
        let rec = record("deadbeef", 4);
        store.append(&rec).unwrap();
        assert_eq!(store.read_last().unwrap(), Some(rec));
    }

    #[test]
    fn appends_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetaStore::new(dir.path().join("meta.jsonl"));
        store.append(&record("a", 1)).unwrap();
        store.append(&record("b", 2)).unwrap();
        store.append(&record("c", 3)).unwrap();

        let ids: Vec<String> = store.read_all().unwrap().map(|r| r.commit_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.read_last().unwrap().unwrap().commit_id, "c");
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetaStore::new(dir.path().join("absent.jsonl"));
        assert_eq!(store.read_all().unwrap().count(), 0);
        assert_eq!(store.read_last().unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.jsonl");
        let store = MetaStore::new(&path);
        store.append(&record("good1", 1)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "this is not json").unwrap();
        writeln!(file, "{{\"half\":").unwrap();
        drop(file);
        store.append(&record("good2", 2)).unwrap();

        let ids: Vec<String> = store.read_all().unwrap().map(|r| r.commit_id).collect();
        assert_eq!(ids, vec!["good1", "good2"]);
    }

    #[test]
    fn find_locates_a_specific_commit() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetaStore::new(dir.path().join("meta.jsonl"));
        store.append(&record("aaa", 1)).unwrap();
        store.append(&record("bbb", 2)).unwrap();
        assert_eq!(store.find("aaa").unwrap().unwrap().summary.files_added, 1);
        assert_eq!(store.find("zzz").unwrap(), None);
    }

    #[test]
    fn absent_summary_fields_default_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.jsonl");
        std::fs::write(
            &path,
            "{\"commitId\":\"abc\",\"timestamp\":\"t\",\"summary\":{\"files_added\":1}}\n",
        )
        .unwrap();

        let store = MetaStore::new(&path);
        let rec = store.read_last().unwrap().unwrap();
        assert_eq!(rec.summary.files_added, 1);
        assert_eq!(rec.summary.files_modified, 0);
        assert_eq!(rec.summary.structural_types_delta, 0);

        let rows = store.export_csv().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "abc,t,1,0,0,0,0");
    }

    #[test]
    fn csv_export_has_fixed_header_and_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetaStore::new(dir.path().join("meta.jsonl"));
        let mut rec = record("abc", 1);
        rec.timestamp = "weird,\"quoted\" value".into();
        store.append(&rec).unwrap();

        let rows = store.export_csv().unwrap();
        assert_eq!(
            rows[0],
            "commitId,timestamp,files_added,files_modified,files_deleted,\
             structural_types_delta,structural_methods_delta"
        );
        assert_eq!(rows[1], "abc,\"weird,\"\"quoted\"\" value\",1,2,1,-1,3");
    }

    #[test]
    fn summary_from_delta_combines_type_counters() {
        let delta = StructuralDelta {
            types: 1,
            interfaces: 2,
            enums: 1,
            methods: 5,
            fields: 0,
        };
        let summary = MetaSummary::new(1, 2, 3, &delta);
        assert_eq!(summary.structural_types_delta, 4);
        assert_eq!(summary.structural_methods_delta, 5);
        assert_eq!(summary.files_deleted, 3);
    }
}
