//! Structural Validation - Tree-Level Invariants
//!
//! Rules produce findings. Every rule runs on every pass so the caller sees
//! the whole defect set at once; nothing short-circuits except the empty
//! tree, which only reports its missing entry.

use regex::Regex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::path;
use crate::policy::ProjectPolicy;
use crate::resolver::{self, Resolver};
use crate::tree::{VirtualFile, VirtualFileTree};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static STRUCTURE_PASS_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_structure_pass_count() -> u32 {
    STRUCTURE_PASS_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_structure_pass_count() {
    STRUCTURE_PASS_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    MissingEntry,
    AmbiguousEntry,
    EntryMissingDefaultExport,
    DisallowedFile,
    UnresolvedImport,
    UnsupportedExtension,
    UnconventionalLocation,
    InlineStyle,
    StylesheetImport,
    MissingInteractionState,
    ClassComponent,
    InlineSvg,
    PlaceholderText,
    DatedColor,
    GrayNeutral,
    UnlabeledControl,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

impl Finding {
    pub fn new(severity: Severity, code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            path: None,
            specifier: None,
            line: None,
            message: message.into(),
            remediation: vec![],
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_specifier(mut self, specifier: impl Into<String>) -> Self {
        self.specifier = Some(specifier.into());
        self
    }

    pub fn on_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn remediate(mut self, hint: impl Into<String>) -> Self {
        self.remediation.push(hint.into());
        self
    }
}

/// Ordered findings of one validation pass. Never mutated after construction;
/// a new pass produces a new report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    /// Concatenate reports, keeping each one's order.
    pub fn concat(reports: impl IntoIterator<Item = ValidationReport>) -> Self {
        Self {
            findings: reports.into_iter().flat_map(|r| r.findings).collect(),
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn with_code(&self, code: FindingCode) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.code == code).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }
}

/// Structural rule trait - inspects the whole tree, produces findings
pub trait StructuralRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding>;
}

// --- Concrete Rules ---

static DEFAULT_FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\s+(?:async\s+)?function\b").unwrap());

static DEFAULT_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\s+class\s+(?:[\w$]+\s+)?extends\b").unwrap());

static DEFAULT_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+default\s+(?:async\s+)?(?:\([^)]*\)|[\w$]+)\s*=>").unwrap()
});

static DEFAULT_WRAPPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+default\s+(?:React\.)?(?:memo|forwardRef)\s*\(").unwrap()
});

static DEFAULT_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\bexport\s+default\s+[A-Z][\w$]*\s*;?\s*$").unwrap());

static DEFAULT_AS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s*\{[^}]*\b[A-Z][\w$]*\s+as\s+default\b[^}]*\}").unwrap()
});

/// Whether `content` default-exports something shaped like a component:
/// a function, arrow, class, `memo`/`forwardRef` wrapper, or a capitalized
/// identifier. This is a syntactic check only.
pub fn has_default_component_export(content: &str) -> bool {
    let code = resolver::strip_comments(content);
    [
        &*DEFAULT_FUNCTION_RE,
        &*DEFAULT_CLASS_RE,
        &*DEFAULT_ARROW_RE,
        &*DEFAULT_WRAPPED_RE,
        &*DEFAULT_IDENT_RE,
        &*DEFAULT_AS_RE,
    ]
    .iter()
    .any(|re| re.is_match(&code))
}

pub struct EntryRule;

impl StructuralRule for EntryRule {
    fn name(&self) -> &'static str { "entry" }

    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding> {
        let candidates = policy.normalized_entry_candidates();
        let present: Vec<&VirtualFile> = candidates
            .iter()
            .filter_map(|c| tree.get(c).ok())
            .collect();

        match present.as_slice() {
            [] => {
                let expected = candidates.first().cloned().unwrap_or_else(|| "/App.jsx".to_string());
                vec![Finding::new(
                    Severity::Error,
                    FindingCode::MissingEntry,
                    format!("Missing entry file {}", expected),
                )
                .at(expected)
                .remediate("Create the entry file with a default-exported React component")]
            }
            [entry] => {
                if has_default_component_export(&entry.content) {
                    vec![]
                } else {
                    vec![Finding::new(
                        Severity::Error,
                        FindingCode::EntryMissingDefaultExport,
                        "Entry file has no default-exported component",
                    )
                    .at(entry.path.clone())
                    .remediate("Add `export default function App() { ... }`")]
                }
            }
            many => {
                let paths: Vec<_> = many.iter().map(|f| f.path.as_str()).collect();
                vec![Finding::new(
                    Severity::Error,
                    FindingCode::AmbiguousEntry,
                    format!("Multiple entry files present: {}", paths.join(", ")),
                )
                .at(many[0].path.clone())
                .remediate("Keep exactly one entry file")]
            }
        }
    }
}

pub struct DisallowedFileRule;

impl StructuralRule for DisallowedFileRule {
    fn name(&self) -> &'static str { "disallowed_file" }

    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding> {
        tree.list_all()
            .into_iter()
            .filter(|f| policy.is_disallowed(&f.path))
            .map(|f| {
                Finding::new(
                    Severity::Error,
                    FindingCode::DisallowedFile,
                    format!("File type .{} is not used by the project", f.kind.extension()),
                )
                .at(f.path.clone())
                .remediate("Remove the file; markup belongs in the entry component")
            })
            .collect()
    }
}

pub struct ImportResolutionRule;

impl StructuralRule for ImportResolutionRule {
    fn name(&self) -> &'static str { "import_resolution" }

    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding> {
        let resolver = Resolver::with_extensions(tree, &policy.resolution_extensions);
        resolver
            .import_graph()
            .into_iter()
            .filter(|edge| edge.resolved_path.is_none())
            .map(|edge| {
                Finding::new(
                    Severity::Error,
                    FindingCode::UnresolvedImport,
                    format!("Import '{}' does not resolve to a file", edge.specifier),
                )
                .at(edge.from_path)
                .with_specifier(edge.specifier)
                .remediate("Create the imported file or fix the specifier")
            })
            .collect()
    }
}

pub struct DirectoryConventionRule;

impl StructuralRule for DirectoryConventionRule {
    fn name(&self) -> &'static str { "directory_convention" }

    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding> {
        let dirs = policy.normalized_conventional_dirs();
        tree.list_all()
            .into_iter()
            .filter(|f| match path::top_level_dir(&f.path) {
                None => false,
                Some(top) => !dirs.iter().any(|d| d == top),
            })
            .map(|f| {
                Finding::new(
                    Severity::Warning,
                    FindingCode::UnconventionalLocation,
                    format!("File lives outside the root and {}", dirs.join(", ")),
                )
                .at(f.path.clone())
            })
            .collect()
    }
}

pub struct ExtensionRule;

impl StructuralRule for ExtensionRule {
    fn name(&self) -> &'static str { "extension" }

    fn check(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> Vec<Finding> {
        tree.list_all()
            .into_iter()
            .filter(|f| !f.kind.is_script() && !policy.is_disallowed(&f.path))
            .filter(|f| !policy.is_asset(&f.path))
            .map(|f| {
                let ext = f.kind.extension();
                let message = if ext.is_empty() {
                    "File has no extension".to_string()
                } else {
                    format!("Unsupported file extension .{}", ext)
                };
                Finding::new(Severity::Warning, FindingCode::UnsupportedExtension, message)
                    .at(f.path.clone())
            })
            .collect()
    }
}

/// Validator orchestrates structural rules
pub struct StructuralValidator {
    rules: Vec<Box<dyn StructuralRule>>,
}

impl StructuralValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(EntryRule),
                Box::new(DisallowedFileRule),
                Box::new(ImportResolutionRule),
                Box::new(DirectoryConventionRule),
                Box::new(ExtensionRule),
            ],
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, tree: &VirtualFileTree, policy: &ProjectPolicy) -> ValidationReport {
        #[cfg(feature = "test-hooks")]
        STRUCTURE_PASS_COUNT.fetch_add(1, Ordering::SeqCst);

        if tree.is_empty() {
            return ValidationReport::from_findings(EntryRule.check(tree, policy));
        }

        // Rules are independent; collect keeps rule order.
        let per_rule: Vec<Vec<Finding>> = self
            .rules
            .par_iter()
            .map(|rule| rule.check(tree, policy))
            .collect();

        ValidationReport::from_findings(per_rule.into_iter().flatten().collect())
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural pass with the given policy.
pub fn validate_structure(tree: &VirtualFileTree, policy: &ProjectPolicy) -> ValidationReport {
    StructuralValidator::new().validate(tree, policy)
}
