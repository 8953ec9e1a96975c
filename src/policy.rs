//! Project Policy - Enforceable Conventions
//!
//! One JSON document configures the structural conventions (entry paths,
//! resolution order, directories, file types) and the advisory lint table.
//! Every field has a default, so `{}` is a complete policy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::path;
use crate::validation::{FindingCode, Severity};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to read policy: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse policy: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid policy: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPolicy {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_version")]
    pub policy_version: String,
    #[serde(default = "default_version")]
    pub engine_min_version: String,
    #[serde(default = "default_entry_candidates")]
    pub entry_candidates: Vec<String>,
    #[serde(default = "default_resolution_extensions")]
    pub resolution_extensions: Vec<String>,
    #[serde(default = "default_conventional_dirs")]
    pub conventional_dirs: Vec<String>,
    #[serde(default = "default_disallowed_extensions")]
    pub disallowed_extensions: Vec<String>,
    #[serde(default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub lint: LintPolicy,
}

fn default_id() -> String { "default".to_string() }
fn default_version() -> String { "1.0.0".to_string() }

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_entry_candidates() -> Vec<String> { strings(crate::DEFAULT_ENTRY_CANDIDATES) }
fn default_resolution_extensions() -> Vec<String> { strings(crate::DEFAULT_RESOLUTION_EXTENSIONS) }
fn default_conventional_dirs() -> Vec<String> { strings(crate::DEFAULT_CONVENTIONAL_DIRS) }
fn default_disallowed_extensions() -> Vec<String> { strings(&["html", "htm"]) }

fn default_asset_extensions() -> Vec<String> {
    strings(&["css", "json", "md", "svg", "png", "jpg", "jpeg", "gif", "webp", "txt"])
}

/// Which severities block a `Passed` outcome.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Only errors block
    #[default]
    Standard,
    /// Errors and warnings block
    Strict,
}

impl Strictness {
    pub fn blocks(&self, severity: Severity) -> bool {
        match self {
            Strictness::Standard => severity == Severity::Error,
            Strictness::Strict => matches!(severity, Severity::Error | Severity::Warning),
        }
    }
}

impl Default for ProjectPolicy {
    fn default() -> Self {
        Self {
            id: default_id(),
            policy_version: default_version(),
            engine_min_version: default_version(),
            entry_candidates: default_entry_candidates(),
            resolution_extensions: default_resolution_extensions(),
            conventional_dirs: default_conventional_dirs(),
            disallowed_extensions: default_disallowed_extensions(),
            asset_extensions: default_asset_extensions(),
            strictness: Strictness::default(),
            lint: LintPolicy::default(),
        }
    }
}

impl ProjectPolicy {
    pub fn load(file: &Path) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(file)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PolicyError> {
        let policy: ProjectPolicy = serde_json::from_str(content)?;
        policy.check()?;
        Ok(policy)
    }

    /// Reject policies the validator cannot apply.
    pub fn check(&self) -> Result<(), PolicyError> {
        if self.entry_candidates.is_empty() {
            return Err(PolicyError::Invalid("entryCandidates must not be empty".into()));
        }
        for candidate in &self.entry_candidates {
            path::normalize(candidate).map_err(|e| {
                PolicyError::Invalid(format!("entry candidate {:?}: {}", candidate, e))
            })?;
        }
        for dir in &self.conventional_dirs {
            let normalized = path::normalize(dir)
                .map_err(|e| PolicyError::Invalid(format!("conventional dir {:?}: {}", dir, e)))?;
            if normalized[1..].contains('/') {
                return Err(PolicyError::Invalid(format!(
                    "conventional dir {:?} must be top-level",
                    dir
                )));
            }
        }
        if self.resolution_extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            return Err(PolicyError::Invalid("empty resolution extension".into()));
        }
        Ok(())
    }

    pub fn normalized_entry_candidates(&self) -> Vec<String> {
        self.entry_candidates
            .iter()
            .filter_map(|c| path::normalize(c).ok())
            .collect()
    }

    pub fn normalized_conventional_dirs(&self) -> Vec<String> {
        self.conventional_dirs
            .iter()
            .filter_map(|d| path::normalize(d).ok())
            .collect()
    }

    pub fn is_disallowed(&self, file: &str) -> bool {
        Self::has_listed_extension(file, &self.disallowed_extensions)
    }

    pub fn is_asset(&self, file: &str) -> bool {
        Self::has_listed_extension(file, &self.asset_extensions)
    }

    fn has_listed_extension(file: &str, list: &[String]) -> bool {
        match path::extension(file) {
            Some(ext) => list
                .iter()
                .any(|l| l.trim_start_matches('.').eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }
}

/// Per-rule switch for the content linter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides the rule's built-in severity. The linter never reports errors.
    #[serde(default)]
    pub severity: Option<Severity>,
}

fn default_true() -> bool { true }

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
        }
    }
}

/// Advisory style table. Design taste lives here, never in structural checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintPolicy {
    #[serde(default)]
    pub inline_style: RuleConfig,
    #[serde(default)]
    pub stylesheet_import: RuleConfig,
    #[serde(default)]
    pub missing_interaction_state: RuleConfig,
    #[serde(default)]
    pub class_component: RuleConfig,
    #[serde(default)]
    pub inline_svg: RuleConfig,
    #[serde(default)]
    pub placeholder_text: RuleConfig,
    #[serde(default)]
    pub dated_color: RuleConfig,
    #[serde(default)]
    pub gray_neutral: RuleConfig,
    #[serde(default)]
    pub unlabeled_control: RuleConfig,

    #[serde(default = "default_stylesheet_extensions")]
    pub stylesheet_extensions: Vec<String>,
    #[serde(default = "default_interaction_markers")]
    pub interaction_markers: Vec<String>,
    #[serde(default = "default_placeholder_phrases")]
    pub placeholder_phrases: Vec<String>,
    #[serde(default = "default_dated_color_families")]
    pub dated_color_families: Vec<String>,
}

fn default_stylesheet_extensions() -> Vec<String> { strings(&["css", "scss", "sass", "less"]) }

fn default_interaction_markers() -> Vec<String> {
    strings(&["hover:", "focus:", "focus-visible:", "focus-within:", "active:"])
}

fn default_placeholder_phrases() -> Vec<String> { strings(&["lorem ipsum"]) }
fn default_dated_color_families() -> Vec<String> { strings(&["blue", "red", "green"]) }

impl Default for LintPolicy {
    fn default() -> Self {
        Self {
            inline_style: RuleConfig::default(),
            stylesheet_import: RuleConfig::default(),
            missing_interaction_state: RuleConfig::default(),
            class_component: RuleConfig::default(),
            inline_svg: RuleConfig::default(),
            placeholder_text: RuleConfig::default(),
            dated_color: RuleConfig::default(),
            gray_neutral: RuleConfig::default(),
            unlabeled_control: RuleConfig::default(),
            stylesheet_extensions: default_stylesheet_extensions(),
            interaction_markers: default_interaction_markers(),
            placeholder_phrases: default_placeholder_phrases(),
            dated_color_families: default_dated_color_families(),
        }
    }
}

impl LintPolicy {
    pub fn rule(&self, code: FindingCode) -> Option<&RuleConfig> {
        match code {
            FindingCode::InlineStyle => Some(&self.inline_style),
            FindingCode::StylesheetImport => Some(&self.stylesheet_import),
            FindingCode::MissingInteractionState => Some(&self.missing_interaction_state),
            FindingCode::ClassComponent => Some(&self.class_component),
            FindingCode::InlineSvg => Some(&self.inline_svg),
            FindingCode::PlaceholderText => Some(&self.placeholder_text),
            FindingCode::DatedColor => Some(&self.dated_color),
            FindingCode::GrayNeutral => Some(&self.gray_neutral),
            FindingCode::UnlabeledControl => Some(&self.unlabeled_control),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default_policy() {
        let policy = ProjectPolicy::from_json("{}").unwrap();
        assert_eq!(policy.id, "default");
        assert_eq!(policy.entry_candidates, vec!["/App.jsx", "/App.tsx"]);
        assert_eq!(policy.resolution_extensions, vec!["tsx", "jsx", "js", "ts"]);
        assert_eq!(policy.strictness, Strictness::Standard);
        assert!(policy.lint.inline_style.enabled);
    }

    #[test]
    fn test_partial_lint_override() {
        let policy = ProjectPolicy::from_json(
            r#"{"id": "advisory", "lint": {"inlineStyle": {"severity": "info"}, "grayNeutral": {}}}"#,
        )
        .unwrap();
        assert_eq!(policy.lint.inline_style.severity, Some(Severity::Info));
        assert!(policy.lint.inline_style.enabled);
        assert!(policy.lint.gray_neutral.enabled);
    }

    #[test]
    fn test_disable_rule() {
        let policy =
            ProjectPolicy::from_json(r#"{"lint": {"datedColor": {"enabled": false}}}"#).unwrap();
        assert!(!policy.lint.rule(FindingCode::DatedColor).unwrap().enabled);
        assert!(policy.lint.rule(FindingCode::MissingEntry).is_none());
    }

    #[test]
    fn test_invalid_policies_rejected() {
        assert!(matches!(
            ProjectPolicy::from_json(r#"{"entryCandidates": []}"#),
            Err(PolicyError::Invalid(_))
        ));
        assert!(matches!(
            ProjectPolicy::from_json(r#"{"conventionalDirs": ["/components/ui"]}"#),
            Err(PolicyError::Invalid(_))
        ));
        assert!(matches!(
            ProjectPolicy::from_json(r#"{"entryCandidates": ["/.."]}"#),
            Err(PolicyError::Invalid(_))
        ));
        assert!(matches!(
            ProjectPolicy::from_json("not json"),
            Err(PolicyError::Parse(_))
        ));
    }

    #[test]
    fn test_extension_lists() {
        let policy = ProjectPolicy::default();
        assert!(policy.is_disallowed("/index.HTML"));
        assert!(!policy.is_disallowed("/App.jsx"));
        assert!(policy.is_asset("/lib/data.json"));
        assert!(!policy.is_asset("/README"));
    }

    #[test]
    fn test_strictness() {
        assert!(Strictness::Standard.blocks(Severity::Error));
        assert!(!Strictness::Standard.blocks(Severity::Warning));
        assert!(Strictness::Strict.blocks(Severity::Warning));
        assert!(!Strictness::Strict.blocks(Severity::Info));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("policy.json");
        fs::write(&file, r#"{"id": "strict-team", "strictness": "strict"}"#).unwrap();

        let policy = ProjectPolicy::load(&file).unwrap();
        assert_eq!(policy.id, "strict-team");
        assert_eq!(policy.strictness, Strictness::Strict);
        assert!(matches!(
            ProjectPolicy::load(&dir.path().join("missing.json")),
            Err(PolicyError::Io(_))
        ));
    }
}
