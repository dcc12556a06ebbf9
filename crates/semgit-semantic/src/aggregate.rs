//! Single-pass aggregation of change records into a summary.

use semgit_core::{AggregatedSummary, ChangeKind, ChangeRecord, ContentStore, SemgitConfig};

use crate::classify::scope_from_path;
use crate::delta::{analyze_delta, is_source_path};

/// Derive a language label from a path's file extension.
///
/// Unrecognized extensions pass through lowercased; a path without an
/// extension maps to `"other"`.
///
/// # Examples
///
/// ```
/// use semgit_semantic::aggregate::language_label;
///
/// assert_eq!(language_label("src/Main.java"), "java");
/// assert_eq!(language_label("README.md"), "markdown");
/// assert_eq!(language_label("build.GRADLE"), "gradle");
/// assert_eq!(language_label("Makefile"), "other");
/// ```
pub fn language_label(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = name.rsplit_once('.') else {
        return "other".into();
    };
    let ext = ext.to_lowercase();
    match ext.as_str() {
        "java" => "java".into(),
        "md" => "markdown".into(),
        "kt" => "kotlin".into(),
        "js" => "javascript".into(),
        "ts" => "typescript".into(),
        "xml" => "xml".into(),
        _ => ext,
    }
}

/// The top-level path segment, or `"."` for paths with no separator.
pub fn top_directory(path: &str) -> &str {
    match path.find('/') {
        Some(idx) if idx > 0 => &path[..idx],
        _ => ".",
    }
}

/// Walk all change records once, accumulating file counts, structural
/// deltas, language/directory buckets, and the ordered scope set.
///
/// Renamed and Copied records count as Modified, which keeps the invariant
/// `files_added + files_modified + files_deleted == records.len()`. Bucket
/// ordering is first-seen, so identical input ordering gives identical
/// output.
pub fn aggregate<S: ContentStore>(
    records: &[ChangeRecord],
    store: &S,
    config: &SemgitConfig,
) -> AggregatedSummary {
    let mut summary = AggregatedSummary::default();
    let structural_enabled = config.language_enabled("java");

    for record in records {
        match record.kind {
            ChangeKind::Added => summary.files_added += 1,
            ChangeKind::Deleted => summary.files_deleted += 1,
            kind => {
                debug_assert!(kind.counts_as_modified());
                summary.files_modified += 1;
            }
        }

        let Some(path) = record.path() else { continue };

        summary.by_language.increment(&language_label(path));
        summary.by_directory.increment(top_directory(path));
        summary.push_scope(&scope_from_path(path));

        if structural_enabled && is_source_path(path) {
            let delta = analyze_delta(record, store);
            summary.structural.accumulate(&delta);
        }
    }

    summary
}
