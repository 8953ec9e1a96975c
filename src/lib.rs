//! GenFS Core - Virtual Project File System and Validator
//!
//! # The Ground Rules
//! 1. Paths Are Virtual (rooted at `/`, no OS semantics)
//! 2. One Entry File Per Project
//! 3. `@/` Always Means The Root
//! 4. Findings Accumulate, They Never Throw
//! 5. Style Policy Advises, Structure Blocks
//! 6. Generators Propose, The Engine Decides

pub mod path;
pub mod tree;
pub mod resolver;
pub mod validation;
pub mod lint;
pub mod policy;
pub mod hashing;
pub mod pipeline;

pub use tree::{VirtualFile, VirtualFileTree, FileKind, GeneratedFile, GenerationPass, TreeError};
pub use resolver::{Resolver, Resolution, ImportEdge, resolve};
pub use validation::{Finding, FindingCode, Severity, ValidationReport, validate_structure};
pub use lint::{ContentLinter, lint_file};
pub use policy::{ProjectPolicy, LintPolicy, Strictness};
pub use hashing::{compute_snapshot_hash, compute_report_hash, canonical_json};
pub use pipeline::{ProjectValidator, ProjectSession, ValidatedProject, PipelineState, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ENTRY_CANDIDATES: &[&str] = &["/App.jsx", "/App.tsx"];
pub const DEFAULT_RESOLUTION_EXTENSIONS: &[&str] = &["tsx", "jsx", "js", "ts"];
pub const DEFAULT_CONVENTIONAL_DIRS: &[&str] = &["/components", "/hooks", "/lib"];
