use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SemgitError;

/// Top-level configuration loaded from `.semgit/config.json`.
///
/// Loaded once per invocation and threaded into the pipeline stages as a
/// value; there is no process-wide configuration state. Absent fields
/// resolve to the documented defaults.
///
/// # Examples
///
/// ```
/// use semgit_core::SemgitConfig;
///
/// let config = SemgitConfig::default();
/// assert_eq!(config.impacted_rules, ".semgit/tests.map");
/// assert!(config.languages.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemgitConfig {
    /// Optional single-line commit header override.
    #[serde(default)]
    pub commit_template: Option<String>,
    /// Path to the test-impact rule file, relative to the repo root.
    #[serde(default = "default_impacted_rules")]
    pub impacted_rules: String,
    /// Languages enabled for structural analysis. Empty means all.
    #[serde(default)]
    pub languages: Vec<String>,
}

fn default_impacted_rules() -> String {
    ".semgit/tests.map".into()
}

impl Default for SemgitConfig {
    fn default() -> Self {
        Self {
            commit_template: None,
            impacted_rules: default_impacted_rules(),
            languages: Vec::new(),
        }
    }
}

impl SemgitConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Io`] if the file cannot be read, or
    /// [`SemgitError::Serialization`] if the content is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self, SemgitError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SemgitError::Serialization`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use semgit_core::SemgitConfig;
    ///
    /// let config = SemgitConfig::from_json(r#"{"languages": ["java"]}"#).unwrap();
    /// assert_eq!(config.languages, vec!["java"]);
    /// assert_eq!(config.impacted_rules, ".semgit/tests.map");
    /// ```
    pub fn from_json(content: &str) -> Result<Self, SemgitError> {
        let config: Self = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Load `.semgit/config.json` under `root`, falling back to defaults
    /// when the file is missing or malformed.
    ///
    /// Hook-invoked stages rely on this never failing.
    pub fn load_or_default(root: &Path) -> Self {
        let path = root.join(".semgit/config.json");
        if !path.exists() {
            return Self::default();
        }
        Self::from_file(&path).unwrap_or_default()
    }

    /// Whether structural analysis is enabled for `language`.
    ///
    /// An empty filter enables every language.
    ///
    /// # Examples
    ///
    /// ```
    /// use semgit_core::SemgitConfig;
    ///
    /// let mut config = SemgitConfig::default();
    /// assert!(config.language_enabled("java"));
    /// config.languages = vec!["kotlin".into()];
    /// assert!(!config.language_enabled("java"));
    /// ```
    pub fn language_enabled(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }
}
