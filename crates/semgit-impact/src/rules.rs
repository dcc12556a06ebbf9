use std::path::Path;

use regex::Regex;

/// One regex-to-template impact rule.
///
/// Rules are loaded once per invocation and immutable afterwards; the rule
/// file holds one `pattern => replacement` per line, with `#` comments and
/// blank lines ignored.
#[derive(Debug, Clone)]
pub struct ImpactRule {
    pattern: Regex,
    replacement: String,
}

/// Result of applying one rule to a path.
///
/// A rule matched only when the substitution produced a different string;
/// the comparison is the explicit contract, not an implicit side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The substitution changed the path.
    Matched(String),
    /// The substitution left the path untouched.
    NoMatch,
}

impl ImpactRule {
    /// Compile a rule from its pattern and replacement template.
    ///
    /// Bare numeric capture references (`$1`) are accepted in the template.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the pattern does not compile.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: brace_group_refs(replacement),
        })
    }

    /// Two-step application: substitute, then compare against the original.
    ///
    /// # Examples
    ///
    /// ```
    /// use semgit_impact::{ImpactRule, RuleOutcome};
    ///
    /// let rule = ImpactRule::new(r"^src/main/(.*)\.x$", "test/$1_test.x").unwrap();
    /// assert_eq!(
    ///     rule.apply("src/main/foo.x"),
    ///     RuleOutcome::Matched("test/foo_test.x".into())
    /// );
    /// assert_eq!(rule.apply("docs/foo.md"), RuleOutcome::NoMatch);
    /// ```
    pub fn apply(&self, path: &str) -> RuleOutcome {
        let replaced = self.pattern.replace_all(path, self.replacement.as_str());
        if replaced != path {
            RuleOutcome::Matched(replaced.into_owned())
        } else {
            RuleOutcome::NoMatch
        }
    }
}

/// Load an ordered rule list from a file.
///
/// A missing or unreadable file, and every malformed or non-compiling
/// line, degrade to fewer rules rather than an error; an empty rule set
/// simply leaves the default convention in charge.
pub fn load_rules(path: &Path) -> Vec<ImpactRule> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };

    let mut rules = Vec::new();
    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((pattern, replacement)) = line.split_once("=>") else {
            continue;
        };
        if let Ok(rule) = ImpactRule::new(pattern.trim(), replacement.trim()) {
            rules.push(rule);
        }
    }
    rules
}

/// Rewrite bare `$N` capture references as `${N}` so templates written in
/// the common `$1_test` style substitute the capture rather than looking
/// up a group named `1_test`.
fn brace_group_refs(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 4);
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|d| d.is_ascii_digit()) {
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            out.push_str("${");
            out.push_str(&digits);
            out.push('}');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn first_capture_survives_adjacent_word_characters() {
        let rule = ImpactRule::new(r"^lib/(.*)\.java$", "tests/$1Spec.java").unwrap();
        assert_eq!(
            rule.apply("lib/app/Foo.java"),
            RuleOutcome::Matched("tests/app/FooSpec.java".into())
        );
    }

    #[test]
    fn identity_substitution_is_no_match() {
        // Pattern matches but replaces the path with itself.
        let rule = ImpactRule::new(r"^(src/.*)$", "$1").unwrap();
        assert_eq!(rule.apply("src/a.java"), RuleOutcome::NoMatch);
    }

    #[test]
    fn load_rules_skips_comments_and_malformed_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# impact rules").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "^src/main/(.*)\\.x$ => test/$1_test.x").unwrap();
        writeln!(file, "a line without an arrow").unwrap();
        writeln!(file, "([unclosed => broken.x").unwrap();
        writeln!(file, "^web/(.*)\\.ts$ => web/$1.spec.ts").unwrap();

        let rules = load_rules(file.path());
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules[0].apply("src/main/foo.x"),
            RuleOutcome::Matched("test/foo_test.x".into())
        );
    }

    #[test]
    fn missing_rule_file_loads_as_empty() {
        assert!(load_rules(Path::new("/nonexistent/tests.map")).is_empty());
    }

    #[test]
    fn group_refs_are_braced() {
        assert_eq!(brace_group_refs("test/$1_test.x"), "test/${1}_test.x");
        assert_eq!(brace_group_refs("$12abc"), "${12}abc");
        assert_eq!(brace_group_refs("no refs"), "no refs");
        assert_eq!(brace_group_refs("${1}kept"), "${1}kept");
    }
}
