//! Content Linter - Advisory Per-File Checks
//!
//! Pure function of one file. Never consults the tree and never reports an
//! error: style policy informs, it does not block.

use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::path;
use crate::policy::{LintPolicy, RuleConfig};
use crate::resolver;
use crate::tree::{VirtualFile, VirtualFileTree};
use crate::validation::{Finding, FindingCode, Severity};

static INLINE_STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bstyle\s*=\s*\{").unwrap());

static INTERACTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:button|a|input|select|textarea)\b|\bon(?:Click|Submit|Change)\s*=").unwrap()
});

static CLASS_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclass\s+[A-Z][\w$]*\s+extends\s+(?:React\.)?(?:Pure)?Component\b").unwrap()
});

static INLINE_SVG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b").unwrap());

static GRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:bg|text|border|ring|divide|outline|from|via|to|fill|stroke)-gray-\d{2,3}\b")
        .unwrap()
});

static FORM_CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:input|select|textarea)\b").unwrap());

/// 1-based line of a byte offset.
fn line_at(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Lint rule trait - inspects one file, produces findings
pub trait LintRule: Send + Sync {
    fn code(&self) -> FindingCode;
    fn lint(&self, file: &VirtualFile) -> Vec<Finding>;
}

pub struct InlineStyleRule {
    severity: Severity,
}

impl LintRule for InlineStyleRule {
    fn code(&self) -> FindingCode { FindingCode::InlineStyle }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        INLINE_STYLE_RE
            .find_iter(&file.content)
            .map(|m| {
                Finding::new(self.severity, self.code(), "Inline style attribute")
                    .at(file.path.clone())
                    .on_line(line_at(&file.content, m.start()))
                    .remediate("Use utility classes instead of inline styles")
            })
            .collect()
    }
}

pub struct StylesheetImportRule {
    severity: Severity,
    extensions: Vec<String>,
}

impl LintRule for StylesheetImportRule {
    fn code(&self) -> FindingCode { FindingCode::StylesheetImport }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        resolver::extract_imports(&file.content)
            .into_iter()
            .filter(|spec| {
                path::extension(spec)
                    .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
                    .unwrap_or(false)
            })
            .map(|spec| {
                let kind = if spec.contains(".module.") { "CSS module" } else { "Stylesheet" };
                Finding::new(self.severity, self.code(), format!("{} import '{}'", kind, spec))
                    .at(file.path.clone())
                    .with_specifier(spec)
                    .remediate("Style with utility classes instead of stylesheet imports")
            })
            .collect()
    }
}

pub struct InteractionStateRule {
    severity: Severity,
    markers: Vec<String>,
}

impl LintRule for InteractionStateRule {
    fn code(&self) -> FindingCode { FindingCode::MissingInteractionState }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        let Some(m) = INTERACTIVE_RE.find(&file.content) else {
            return vec![];
        };
        if self.markers.iter().any(|marker| file.content.contains(marker.as_str())) {
            return vec![];
        }
        vec![Finding::new(
            self.severity,
            self.code(),
            "Interactive markup without hover or focus states",
        )
        .at(file.path.clone())
        .on_line(line_at(&file.content, m.start()))
        .remediate("Add hover:, focus-visible: and active: variants to interactive elements")]
    }
}

pub struct ClassComponentRule {
    severity: Severity,
}

impl LintRule for ClassComponentRule {
    fn code(&self) -> FindingCode { FindingCode::ClassComponent }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        CLASS_COMPONENT_RE
            .find_iter(&file.content)
            .map(|m| {
                Finding::new(self.severity, self.code(), "Class component")
                    .at(file.path.clone())
                    .on_line(line_at(&file.content, m.start()))
                    .remediate("Rewrite as a function component with hooks")
            })
            .collect()
    }
}

pub struct InlineSvgRule {
    severity: Severity,
}

impl LintRule for InlineSvgRule {
    fn code(&self) -> FindingCode { FindingCode::InlineSvg }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        match INLINE_SVG_RE.find(&file.content) {
            Some(m) => vec![Finding::new(self.severity, self.code(), "Inline SVG markup")
                .at(file.path.clone())
                .on_line(line_at(&file.content, m.start()))
                .remediate("Prefer icons from lucide-react")],
            None => vec![],
        }
    }
}

pub struct PlaceholderTextRule {
    severity: Severity,
    phrases: Vec<String>,
}

impl LintRule for PlaceholderTextRule {
    fn code(&self) -> FindingCode { FindingCode::PlaceholderText }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        let lowered = file.content.to_lowercase();
        self.phrases
            .iter()
            .filter_map(|phrase| {
                let idx = lowered.find(phrase.as_str())?;
                Some(
                    Finding::new(self.severity, self.code(), format!("Placeholder text \"{}\"", phrase))
                        .at(file.path.clone())
                        .on_line(lowered[..idx].matches('\n').count() + 1)
                        .remediate("Use realistic sample content"),
                )
            })
            .collect()
    }
}

pub struct DatedColorRule {
    severity: Severity,
    pattern: Option<Regex>,
}

impl DatedColorRule {
    fn new(severity: Severity, families: &[String]) -> Self {
        let alternatives: Vec<String> = families
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| regex::escape(f))
            .collect();
        let pattern = if alternatives.is_empty() {
            None
        } else {
            let source = format!(
                r"\b(?:bg|text|border|ring|divide|outline|from|via|to|fill|stroke)-(?:{})-\d{{2,3}}\b",
                alternatives.join("|")
            );
            match Regex::new(&source) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(error = %e, "dated color pattern rejected, rule disabled");
                    None
                }
            }
        };
        Self { severity, pattern }
    }
}

impl LintRule for DatedColorRule {
    fn code(&self) -> FindingCode { FindingCode::DatedColor }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        let Some(re) = &self.pattern else {
            return vec![];
        };
        match re.find(&file.content) {
            Some(m) => vec![Finding::new(
                self.severity,
                self.code(),
                format!("Dated color utility {}", m.as_str()),
            )
            .at(file.path.clone())
            .on_line(line_at(&file.content, m.start()))
            .remediate("Use one accent family such as indigo, violet, emerald, sky or rose")],
            None => vec![],
        }
    }
}

pub struct GrayNeutralRule {
    severity: Severity,
}

impl LintRule for GrayNeutralRule {
    fn code(&self) -> FindingCode { FindingCode::GrayNeutral }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        match GRAY_RE.find(&file.content) {
            Some(m) => vec![Finding::new(
                self.severity,
                self.code(),
                format!("Gray neutral {}", m.as_str()),
            )
            .at(file.path.clone())
            .on_line(line_at(&file.content, m.start()))
            .remediate("Use slate for neutrals")],
            None => vec![],
        }
    }
}

pub struct UnlabeledControlRule {
    severity: Severity,
}

impl LintRule for UnlabeledControlRule {
    fn code(&self) -> FindingCode { FindingCode::UnlabeledControl }

    fn lint(&self, file: &VirtualFile) -> Vec<Finding> {
        let Some(m) = FORM_CONTROL_RE.find(&file.content) else {
            return vec![];
        };
        let labelled = ["aria-label", "<label", "htmlFor"]
            .iter()
            .any(|marker| file.content.contains(marker));
        if labelled {
            return vec![];
        }
        vec![Finding::new(self.severity, self.code(), "Form control without a label")
            .at(file.path.clone())
            .on_line(line_at(&file.content, m.start()))
            .remediate("Add a <label> or aria-label to form controls")]
    }
}

/// Effective severity for a rule. Overrides may soften a rule but never
/// escalate it to an error.
fn effective_severity(config: &RuleConfig, code: FindingCode, default: Severity) -> Severity {
    match config.severity {
        Some(Severity::Error) => {
            warn!(?code, "lint severity cannot be error, using warning");
            Severity::Warning
        }
        Some(severity) => severity,
        None => default,
    }
}

/// Linter orchestrates the enabled lint rules
pub struct ContentLinter {
    rules: Vec<Box<dyn LintRule>>,
}

impl ContentLinter {
    pub fn new(policy: &LintPolicy) -> Self {
        let mut rules: Vec<Box<dyn LintRule>> = vec![];

        if policy.inline_style.enabled {
            rules.push(Box::new(InlineStyleRule {
                severity: effective_severity(&policy.inline_style, FindingCode::InlineStyle, Severity::Warning),
            }));
        }
        if policy.stylesheet_import.enabled {
            rules.push(Box::new(StylesheetImportRule {
                severity: effective_severity(
                    &policy.stylesheet_import,
                    FindingCode::StylesheetImport,
                    Severity::Warning,
                ),
                extensions: policy
                    .stylesheet_extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .collect(),
            }));
        }
        if policy.missing_interaction_state.enabled {
            rules.push(Box::new(InteractionStateRule {
                severity: effective_severity(
                    &policy.missing_interaction_state,
                    FindingCode::MissingInteractionState,
                    Severity::Info,
                ),
                markers: policy.interaction_markers.clone(),
            }));
        }
        if policy.class_component.enabled {
            rules.push(Box::new(ClassComponentRule {
                severity: effective_severity(&policy.class_component, FindingCode::ClassComponent, Severity::Warning),
            }));
        }
        if policy.inline_svg.enabled {
            rules.push(Box::new(InlineSvgRule {
                severity: effective_severity(&policy.inline_svg, FindingCode::InlineSvg, Severity::Info),
            }));
        }
        if policy.placeholder_text.enabled {
            rules.push(Box::new(PlaceholderTextRule {
                severity: effective_severity(&policy.placeholder_text, FindingCode::PlaceholderText, Severity::Info),
                phrases: policy
                    .placeholder_phrases
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| p.to_lowercase())
                    .collect(),
            }));
        }
        if policy.dated_color.enabled {
            let severity = effective_severity(&policy.dated_color, FindingCode::DatedColor, Severity::Info);
            rules.push(Box::new(DatedColorRule::new(severity, &policy.dated_color_families)));
        }
        if policy.gray_neutral.enabled {
            rules.push(Box::new(GrayNeutralRule {
                severity: effective_severity(&policy.gray_neutral, FindingCode::GrayNeutral, Severity::Info),
            }));
        }
        if policy.unlabeled_control.enabled {
            rules.push(Box::new(UnlabeledControlRule {
                severity: effective_severity(&policy.unlabeled_control, FindingCode::UnlabeledControl, Severity::Info),
            }));
        }

        Self { rules }
    }

    pub fn rule_codes(&self) -> Vec<FindingCode> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    /// Findings for one file. Non-script files are never linted.
    pub fn lint_file(&self, file: &VirtualFile) -> Vec<Finding> {
        if !file.kind.is_script() {
            return vec![];
        }
        self.rules.iter().flat_map(|rule| rule.lint(file)).collect()
    }

    /// Lint every file, in path order.
    pub fn lint_tree(&self, tree: &VirtualFileTree) -> Vec<Finding> {
        let per_file: Vec<Vec<Finding>> = tree
            .list_all()
            .par_iter()
            .map(|file| self.lint_file(file))
            .collect();
        per_file.into_iter().flatten().collect()
    }
}

impl Default for ContentLinter {
    fn default() -> Self {
        Self::new(&LintPolicy::default())
    }
}

/// Lint one file with the default policy table.
pub fn lint_file(file: &VirtualFile) -> Vec<Finding> {
    ContentLinter::default().lint_file(file)
}
