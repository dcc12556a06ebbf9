//! Change-type and scope inference, plus commit-message drafting.

use std::fmt;

use semgit_core::AggregatedSummary;

/// Conventional-commit style change type.
///
/// # Examples
///
/// ```
/// use semgit_semantic::ChangeType;
///
/// assert_eq!(ChangeType::Refactor.to_string(), "refactor");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Fix,
    Docs,
    Test,
    Refactor,
    Feat,
    Chore,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Fix => write!(f, "fix"),
            ChangeType::Docs => write!(f, "docs"),
            ChangeType::Test => write!(f, "test"),
            ChangeType::Refactor => write!(f, "refactor"),
            ChangeType::Feat => write!(f, "feat"),
            ChangeType::Chore => write!(f, "chore"),
        }
    }
}

/// The outcome of classifying an [`AggregatedSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Inferred change type.
    pub change_type: ChangeType,
    /// Comma-joined scope set, `"core"` when no scopes were derived.
    pub scope: String,
    /// Human-readable one-line summary.
    pub headline: String,
}

/// Derive a scope label for one touched path.
///
/// Test sources map to `"test"`, documentation to `"docs"`, paths under the
/// production source root to their first package segment (dots replaced
/// with dashes, `"java"` when there is no further segment), and everything
/// else to its first path segment.
///
/// # Examples
///
/// ```
/// use semgit_semantic::classify::scope_from_path;
///
/// assert_eq!(scope_from_path("src/test/java/app/T.java"), "test");
/// assert_eq!(scope_from_path("docs/guide.md"), "docs");
/// assert_eq!(scope_from_path("README.md"), "docs");
/// assert_eq!(scope_from_path("src/main/java/billing/Invoice.java"), "billing");
/// assert_eq!(scope_from_path("src/main/java/App.java"), "java");
/// assert_eq!(scope_from_path("build/ci.yaml"), "build");
/// ```
pub fn scope_from_path(path: &str) -> String {
    if path.starts_with("src/test") {
        return "test".into();
    }
    if path.starts_with("docs/") || path.ends_with(".md") {
        return "docs".into();
    }
    if let Some(rest) = path.strip_prefix("src/main/java/") {
        return match rest.find('/') {
            Some(idx) if idx > 0 => rest[..idx].replace('.', "-"),
            _ => "java".into(),
        };
    }
    path.split('/').next().unwrap_or("").to_string()
}

/// Classify an aggregated summary into `(type, scope, headline)`.
///
/// Pure function: identical input always yields byte-identical output.
///
/// The type priority is fixed and total: all-docs, then all-test, then
/// deletion-only refactor, then any-addition feat, then chore. Ambiguous
/// mixes (e.g. docs + test) deliberately fall through to the later rules.
///
/// # Examples
///
/// ```
/// use semgit_core::AggregatedSummary;
/// use semgit_semantic::{classify, ChangeType};
///
/// let mut summary = AggregatedSummary::default();
/// summary.files_deleted = 2;
/// summary.push_scope("core");
/// let c = classify(&summary);
/// assert_eq!(c.change_type, ChangeType::Refactor);
/// assert_eq!(c.headline, "refactor core");
/// ```
pub fn classify(summary: &AggregatedSummary) -> Classification {
    let scopes = &summary.scopes;
    let change_type = if !scopes.is_empty() && scopes.iter().all(|s| s == "docs") {
        ChangeType::Docs
    } else if !scopes.is_empty() && scopes.iter().all(|s| s == "test") {
        ChangeType::Test
    } else if summary.files_deleted > 0 && summary.files_added == 0 {
        ChangeType::Refactor
    } else if summary.files_added > 0 {
        ChangeType::Feat
    } else {
        ChangeType::Chore
    };

    let scope = if scopes.is_empty() {
        "core".to_string()
    } else {
        scopes.join(",")
    };

    let headline = match change_type {
        ChangeType::Fix => format!("fix issue in {scope}"),
        ChangeType::Docs => "update docs".to_string(),
        ChangeType::Test => "update tests".to_string(),
        ChangeType::Refactor => format!("refactor {scope}"),
        ChangeType::Feat | ChangeType::Chore => format!("add/update {scope}"),
    };

    Classification {
        change_type,
        scope,
        headline,
    }
}

/// Render a commit-message draft: header, blank line, and a
/// machine-readable trailer with the five summary counters.
///
/// A configured `template` overrides the generated header verbatim.
pub fn draft_message(summary: &AggregatedSummary, template: Option<&str>) -> String {
    let classification = classify(summary);
    let header = match template {
        Some(t) => t.to_string(),
        None => format!(
            "{}({}): {}",
            classification.change_type, classification.scope, classification.headline
        ),
    };
    format!(
        "{header}\n\n[semgit] files: +{} ~{} -{}; structural delta: types={}, methods={}\n",
        summary.files_added,
        summary.files_modified,
        summary.files_deleted,
        summary.structural.types_total(),
        summary.structural.methods,
    )
}

/// Whether a commit message file already carries real content.
///
/// Blank lines and `#` comment lines (hook templates) do not count, so a
/// draft is only written into an effectively empty message.
///
/// # Examples
///
/// ```
/// use semgit_semantic::has_meaningful_content;
///
/// assert!(!has_meaningful_content(""));
/// assert!(!has_meaningful_content("# Please enter a commit message\n\n"));
/// assert!(has_meaningful_content("wip: half done\n"));
/// ```
pub fn has_meaningful_content(text: &str) -> bool {
    text.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use semgit_core::StructuralDelta;

    fn summary(added: u64, modified: u64, deleted: u64, scopes: &[&str]) -> AggregatedSummary {
        let mut s = AggregatedSummary {
            files_added: added,
            files_modified: modified,
            files_deleted: deleted,
            ..Default::default()
        };
        for scope in scopes {
            s.push_scope(scope);
        }
        s
    }

    #[test]
    fn all_docs_scopes_classify_as_docs() {
        let c = classify(&summary(3, 0, 0, &["docs"]));
        assert_eq!(c.change_type, ChangeType::Docs);
        assert_eq!(c.scope, "docs");
        assert_eq!(c.headline, "update docs");
    }

    #[test]
    fn all_test_scopes_classify_as_test() {
        let c = classify(&summary(0, 2, 0, &["test"]));
        assert_eq!(c.change_type, ChangeType::Test);
        assert_eq!(c.headline, "update tests");
    }

    #[test]
    fn deletions_without_additions_classify_as_refactor() {
        let c = classify(&summary(0, 0, 2, &["core"]));
        assert_eq!(c.change_type, ChangeType::Refactor);
        assert_eq!(c.scope, "core");
        assert_eq!(c.headline, "refactor core");
    }

    #[test]
    fn additions_classify_as_feat() {
        let c = classify(&summary(1, 1, 1, &["billing", "docs"]));
        assert_eq!(c.change_type, ChangeType::Feat);
        assert_eq!(c.scope, "billing,docs");
        assert_eq!(c.headline, "add/update billing,docs");
    }

    #[test]
    fn modifications_only_classify_as_chore() {
        let c = classify(&summary(0, 3, 0, &["conf"]));
        assert_eq!(c.change_type, ChangeType::Chore);
    }

    #[test]
    fn mixed_docs_and_test_fall_through_the_priority_order() {
        // Neither all-docs nor all-test, no deletes, no adds -> chore.
        let c = classify(&summary(0, 2, 0, &["docs", "test"]));
        assert_eq!(c.change_type, ChangeType::Chore);
    }

    #[test]
    fn empty_scope_set_uses_core_and_skips_docs_branch() {
        let c = classify(&summary(0, 0, 0, &[]));
        assert_eq!(c.change_type, ChangeType::Chore);
        assert_eq!(c.scope, "core");
    }

    #[test]
    fn classify_is_idempotent() {
        let s = summary(2, 1, 0, &["billing", "test"]);
        assert_eq!(classify(&s), classify(&s));
    }

    #[test]
    fn draft_message_has_header_blank_line_and_trailer() {
        let mut s = summary(1, 2, 0, &["billing"]);
        s.structural = StructuralDelta {
            types: 1,
            interfaces: 1,
            enums: 0,
            methods: 4,
            fields: 2,
        };
        let message = draft_message(&s, None);
        assert_eq!(
            message,
            "feat(billing): add/update billing\n\n\
             [semgit] files: +1 ~2 -0; structural delta: types=2, methods=4\n"
        );
    }

    #[test]
    fn draft_message_honors_template_override() {
        let s = summary(1, 0, 0, &["billing"]);
        let message = draft_message(&s, Some("chore: scheduled import"));
        assert!(message.starts_with("chore: scheduled import\n\n[semgit] files: +1"));
    }

    #[test]
    fn comment_only_message_is_not_meaningful() {
        let template = "\n# Please enter the commit message.\n# Lines starting with '#'\n\n";
        assert!(!has_meaningful_content(template));
        assert!(has_meaningful_content("fix: thing\n# comment"));
    }
}
