//! Per-file structural delta computation.

use semgit_core::{ChangeRecord, ContentStore, StructuralDelta};

use crate::parser::structural_stats;

/// Whether `path` has the recognized structural-analysis suffix.
pub fn is_source_path(path: &str) -> bool {
    path.ends_with(".java")
}

/// Compute the signed structural delta for one change record.
///
/// Defined only for records whose representative path is a recognized
/// source file; everything else yields the zero delta. The "before" side is
/// the empty string for added files or absent content refs, the "after"
/// side is empty for deletions, so a wholly deleted file contributes the
/// negation of its last-known stats. Content that fails to load degrades
/// to empty rather than failing the pipeline.
pub fn analyze_delta<S: ContentStore>(record: &ChangeRecord, store: &S) -> StructuralDelta {
    let Some(path) = record.path() else {
        return StructuralDelta::default();
    };
    if !is_source_path(path) {
        return StructuralDelta::default();
    }

    let before = load_text(store, record.old_id.as_deref());
    let after = load_text(store, record.new_id.as_deref());

    let before_stats = structural_stats(&before);
    let after_stats = structural_stats(&after);
    after_stats.delta_from(&before_stats)
}

fn load_text<S: ContentStore>(store: &S, id: Option<&str>) -> String {
    match id {
        Some(id) => match store.read_content(id) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        },
        None => String::new(),
    }
}
