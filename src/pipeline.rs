//! Validation Pipeline - Single Entry Point
//!
//! Ingested -> StructurallyChecked -> ContentChecked -> Passed | Failed.
//! Both phases always run. A terminal session only moves again through a
//! fresh ingestion: content is frozen once a report has been issued for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::hashing::{compute_report_hash, compute_snapshot_hash};
use crate::lint::ContentLinter;
use crate::policy::{PolicyError, ProjectPolicy};
use crate::tree::{GenerationPass, TreeError, VirtualFile, VirtualFileTree};
use crate::validation::{Finding, StructuralValidator, ValidationReport};
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Policy {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Cannot validate from state {0:?}; ingest generated output first")]
    InvalidState(Option<PipelineState>),

    #[error("Tree snapshot corrupted: {0}")]
    SnapshotCorrupted(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Ingested,
    StructurallyChecked,
    ContentChecked,
    Passed,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Passed | PipelineState::Failed)
    }
}

/// Output boundary: what a preview/build collaborator receives with the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedProject {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub policy_id: String,
    pub policy_version: String,
    pub snapshot_hash: String,
    pub report_hash: String,
    pub state: PipelineState,
    pub report: ValidationReport,
}

impl ValidatedProject {
    pub fn passed(&self) -> bool {
        self.state == PipelineState::Passed
    }
}

/// Runs both check phases under one policy.
pub struct ProjectValidator {
    policy: ProjectPolicy,
    structure: StructuralValidator,
    linter: ContentLinter,
}

impl ProjectValidator {
    pub fn new(policy: ProjectPolicy) -> Result<Self, PipelineError> {
        policy.check()?;
        check_engine_version(&policy)?;
        let linter = ContentLinter::new(&policy.lint);
        Ok(Self {
            policy,
            structure: StructuralValidator::new(),
            linter,
        })
    }

    pub fn policy(&self) -> &ProjectPolicy {
        &self.policy
    }

    /// Empty tree using this policy's entry candidates.
    pub fn new_tree(&self) -> VirtualFileTree {
        VirtualFileTree::with_entry_candidates(&self.policy.entry_candidates)
    }

    /// Re-derive the tree's entry flags from this policy's candidates.
    pub fn adopt(&self, tree: &mut VirtualFileTree) {
        tree.set_entry_candidates(&self.policy.entry_candidates);
    }

    pub fn validate_structure(&self, tree: &VirtualFileTree) -> ValidationReport {
        self.structure.validate(tree, &self.policy)
    }

    pub fn lint_file(&self, file: &VirtualFile) -> Vec<Finding> {
        self.linter.lint_file(file)
    }

    pub fn lint_tree(&self, tree: &VirtualFileTree) -> ValidationReport {
        ValidationReport::from_findings(self.linter.lint_tree(tree))
    }

    /// Validate a tree snapshot. The two phases run in parallel; the report
    /// lists structural findings first, then content findings.
    ///
    /// This is the ONLY validation entry point that issues a `ValidatedProject`.
    /// Findings always follow the policy; the tree's `is_entry` flags only do
    /// when it came from `new_tree` or went through `adopt`.
    pub fn validate(&self, tree: &VirtualFileTree) -> Result<ValidatedProject, PipelineError> {
        verify_snapshot(tree)?;
        if tree.entry_candidates() != self.policy.normalized_entry_candidates().as_slice() {
            warn!(
                policy = %self.policy.id,
                "tree entry flags were derived from other candidates; call adopt first"
            );
        }

        let (structural, content) = rayon::join(
            || self.validate_structure(tree),
            || self.lint_tree(tree),
        );

        self.finish(tree, structural, content)
    }

    fn finish(
        &self,
        tree: &VirtualFileTree,
        structural: ValidationReport,
        content: ValidationReport,
    ) -> Result<ValidatedProject, PipelineError> {
        let report = ValidationReport::concat([structural, content]);
        let blocked = report
            .findings()
            .iter()
            .any(|f| self.policy.strictness.blocks(f.severity));
        let state = if blocked { PipelineState::Failed } else { PipelineState::Passed };

        let snapshot_hash = compute_snapshot_hash(tree)?;
        let report_hash = compute_report_hash(&snapshot_hash, &self.policy.id, &report)?;

        info!(
            state = ?state,
            findings = report.len(),
            files = tree.len(),
            snapshot = %snapshot_hash,
            "validation finished"
        );

        Ok(ValidatedProject {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            policy_id: self.policy.id.clone(),
            policy_version: self.policy.policy_version.clone(),
            snapshot_hash,
            report_hash,
            state,
            report,
        })
    }
}

impl Default for ProjectValidator {
    fn default() -> Self {
        Self {
            linter: ContentLinter::default(),
            structure: StructuralValidator::new(),
            policy: ProjectPolicy::default(),
        }
    }
}

fn verify_snapshot(tree: &VirtualFileTree) -> Result<(), PipelineError> {
    tree.verify_integrity().map_err(|e| {
        error!(error = %e, "aborting validation run");
        PipelineError::SnapshotCorrupted(e.to_string())
    })
}

fn check_engine_version(policy: &ProjectPolicy) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION).map_err(|_| {
        PipelineError::Policy(PolicyError::Invalid("Invalid engine version".into()))
    })?;
    let min_ver = semver::Version::parse(&policy.engine_min_version).map_err(|_| {
        PipelineError::Policy(PolicyError::Invalid(format!(
            "Invalid engineMinVersion {:?}",
            policy.engine_min_version
        )))
    })?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            policy.id.clone(),
            policy.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }

    Ok(())
}

/// One project's tree plus where it stands in the validation state machine.
///
/// Mutation goes through `&mut self`, so a session has a single writer.
pub struct ProjectSession {
    validator: ProjectValidator,
    tree: VirtualFileTree,
    state: Option<PipelineState>,
    history: Vec<PipelineState>,
    last: Option<ValidatedProject>,
}

impl ProjectSession {
    pub fn new(validator: ProjectValidator) -> Self {
        let tree = validator.new_tree();
        Self {
            validator,
            tree,
            state: None,
            history: vec![],
            last: None,
        }
    }

    /// Session over an existing tree, re-flagged for this policy and ready
    /// to validate.
    pub fn with_tree(validator: ProjectValidator, mut tree: VirtualFileTree) -> Self {
        validator.adopt(&mut tree);
        let mut session = Self {
            validator,
            tree,
            state: None,
            history: vec![],
            last: None,
        };
        session.transition(PipelineState::Ingested);
        session
    }

    pub fn state(&self) -> Option<PipelineState> {
        self.state
    }

    /// States visited since the last ingestion, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn tree(&self) -> &VirtualFileTree {
        &self.tree
    }

    pub fn last_report(&self) -> Option<&ValidatedProject> {
        self.last.as_ref()
    }

    pub fn validator(&self) -> &ProjectValidator {
        &self.validator
    }

    /// Apply a generation pass. All-or-nothing: a bad path leaves the tree
    /// and state untouched.
    pub fn ingest(&mut self, pass: &GenerationPass) -> Result<Vec<String>, PipelineError> {
        let mut next = self.tree.clone();
        let written = next.ingest(pass).map_err(|e| {
            error!(error = %e, "ingestion rejected");
            e
        })?;

        self.tree = next;
        self.last = None;
        self.history.clear();
        self.transition(PipelineState::Ingested);
        info!(
            written = written.len(),
            removed = pass.removed.len(),
            files = self.tree.len(),
            "ingested generation pass"
        );
        Ok(written)
    }

    /// Run both phases against the ingested tree.
    pub fn validate(&mut self) -> Result<&ValidatedProject, PipelineError> {
        if self.state != Some(PipelineState::Ingested) {
            return Err(PipelineError::InvalidState(self.state));
        }
        verify_snapshot(&self.tree)?;

        let structural = self.validator.validate_structure(&self.tree);
        self.transition(PipelineState::StructurallyChecked);

        let content = self.validator.lint_tree(&self.tree);
        self.transition(PipelineState::ContentChecked);

        let project = self.validator.finish(&self.tree, structural, content)?;
        self.transition(project.state);
        Ok(&*self.last.insert(project))
    }

    /// Hand the tree and its latest report to the build collaborator.
    pub fn into_parts(self) -> (VirtualFileTree, Option<ValidatedProject>) {
        (self.tree, self.last)
    }

    fn transition(&mut self, to: PipelineState) {
        debug!(from = ?self.state, to = ?to, "pipeline transition");
        self.state = Some(to);
        self.history.push(to);
    }
}
