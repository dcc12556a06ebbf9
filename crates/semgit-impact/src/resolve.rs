use crate::rules::{ImpactRule, RuleOutcome};

/// Resolve the likely test path for one changed source path.
///
/// Rules are evaluated in file order and the first match wins; when none
/// matches, the default convention applies. Paths outside the production
/// source root with no matching rule resolve to nothing.
///
/// # Examples
///
/// ```
/// use semgit_impact::{resolve, ImpactRule};
///
/// let rules = vec![ImpactRule::new(r"^src/main/(.*)\.x$", "test/$1_test.x").unwrap()];
/// assert_eq!(resolve("src/main/foo.x", &rules), Some("test/foo_test.x".into()));
/// assert_eq!(
///     resolve("src/main/java/pkg/Foo.java", &[]),
///     Some("src/test/java/pkg/FooTest.java".into())
/// );
/// assert_eq!(resolve("docs/guide.md", &[]), None);
/// ```
pub fn resolve(path: &str, rules: &[ImpactRule]) -> Option<String> {
    for rule in rules {
        if let RuleOutcome::Matched(mapped) = rule.apply(path) {
            return Some(mapped);
        }
    }
    default_convention(path)
}

/// The convention-based fallback: mirror `src/main/java` sources into
/// `src/test/java` with a `Test` suffix before the extension.
pub fn default_convention(path: &str) -> Option<String> {
    let rest = path
        .strip_prefix("src/main/java/")?
        .strip_suffix(".java")?;
    Some(format!("src/test/java/{rest}Test.java"))
}

/// Resolve many changed paths, suppressing duplicate results while keeping
/// first-seen order.
pub fn resolve_all<'a, I>(paths: I, rules: &[ImpactRule]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tests = Vec::new();
    for path in paths {
        if let Some(mapped) = resolve(path, rules) {
            if !tests.contains(&mapped) {
                tests.push(mapped);
            }
        }
    }
    tests
}
