//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use genfs_core::{
    FindingCode, GenerationPass, PipelineState, ProjectPolicy, ProjectSession, ProjectValidator,
    Resolution, Severity, VirtualFileTree,
    resolver::resolve,
    validation::validate_structure,
    hashing::canonical_json,
};

fn tree_of(files: &[(&str, &str)]) -> VirtualFileTree {
    let mut tree = VirtualFileTree::new();
    tree.ingest(&GenerationPass::from_files(files.iter().copied())).unwrap();
    tree
}

fn validate(files: &[(&str, &str)]) -> genfs_core::ValidatedProject {
    ProjectValidator::default().validate(&tree_of(files)).unwrap()
}

#[test]
fn invariant_minimal_entry_passes() {
    let project = validate(&[("/App.jsx", "export default function App(){ return <main /> }")]);

    assert_eq!(project.state, PipelineState::Passed);
    assert_eq!(project.report.count(Severity::Error), 0);
}

#[test]
fn invariant_missing_entry_and_unresolved_import() {
    let project = validate(&[("/components/Card.jsx", "import x from '@/lib/util'")]);

    let errors: Vec<_> = project
        .report
        .findings()
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].code, FindingCode::MissingEntry);
    assert_eq!(errors[1].code, FindingCode::UnresolvedImport);
    assert_eq!(errors[1].path.as_deref(), Some("/components/Card.jsx"));
    assert_eq!(errors[1].specifier.as_deref(), Some("@/lib/util"));
    assert_eq!(project.state, PipelineState::Failed);
}

#[test]
fn invariant_html_fails_even_with_valid_entry() {
    let project = validate(&[
        ("/App.jsx", "export default function App(){ return null }"),
        ("/index.html", "<!doctype html><div id=\"root\"></div>"),
    ]);

    let errors: Vec<_> = project
        .report
        .findings()
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, FindingCode::DisallowedFile);
    assert_eq!(errors[0].path.as_deref(), Some("/index.html"));
    assert_eq!(project.state, PipelineState::Failed);
}

#[test]
fn invariant_trees_without_entry_report_exactly_one_missing_entry() {
    let trees: Vec<Vec<(&str, &str)>> = vec![
        vec![],
        vec![("/components/Card.jsx", "export default function Card() {}")],
        vec![("/app.jsx", "export default function App() {}")],
        vec![("/src/App.jsx", "export default function App() {}"), ("/lib/x.js", "")],
        vec![("/App.js", "export default function App() {}")],
    ];

    for files in trees {
        let tree = tree_of(&files);
        let report = validate_structure(&tree, &ProjectPolicy::default());
        let missing = report.with_code(FindingCode::MissingEntry);
        assert_eq!(missing.len(), 1, "tree {:?}", files);
        assert_eq!(missing[0].severity, Severity::Error);

        let project = ProjectValidator::default().validate(&tree).unwrap();
        assert_eq!(project.state, PipelineState::Failed);
    }
}

#[test]
fn invariant_empty_tree_single_finding() {
    let project = validate(&[]);
    assert_eq!(project.report.len(), 1);
    assert_eq!(project.report.findings()[0].code, FindingCode::MissingEntry);
}

#[test]
fn invariant_structure_validation_idempotent() {
    let tree = tree_of(&[
        ("/App.jsx", "import A from '@/components/A';\nimport B from './missing';"),
        ("/components/A.jsx", "export default function A() {}"),
        ("/misc/notes.txt", ""),
        ("/index.html", ""),
    ]);
    let policy = ProjectPolicy::default();

    let first = validate_structure(&tree, &policy);
    let second = validate_structure(&tree, &policy);
    assert_eq!(first, second);
    assert_eq!(
        canonical_json(&first).unwrap(),
        canonical_json(&second).unwrap()
    );
}

#[test]
fn invariant_report_hash_stable_for_same_snapshot() {
    let tree = tree_of(&[
        ("/App.jsx", "export default function App() { return <button>Go</button> }"),
    ]);
    let validator = ProjectValidator::default();

    let a = validator.validate(&tree).unwrap();
    let b = validator.validate(&tree).unwrap();

    // Fresh run identity, identical content identity
    assert_ne!(a.id, b.id);
    assert_eq!(a.snapshot_hash, b.snapshot_hash);
    assert_eq!(a.report_hash, b.report_hash);
    assert_eq!(a.report, b.report);
}

#[test]
fn invariant_resolution_deterministic() {
    let tree = tree_of(&[
        ("/App.jsx", ""),
        ("/lib/util.js", ""),
        ("/lib/util.ts", ""),
        ("/lib/util/index.tsx", ""),
    ]);

    let first = resolve(&tree, "/App.jsx", "@/lib/util");
    assert_eq!(first, Resolution::Resolved("/lib/util.js".to_string()));
    for _ in 0..5 {
        assert_eq!(resolve(&tree, "/App.jsx", "@/lib/util"), first);
    }
}

#[test]
fn invariant_root_directory_imports_resolve_to_root_index() {
    let project = validate(&[
        ("/index.js", "export const version = 1;"),
        ("/App.jsx", "import { version } from '.';\nexport default function App() { return null }"),
        ("/components/Card.jsx", "import { version } from '..';\nexport default function Card() { return null }"),
    ]);

    assert!(project.report.with_code(FindingCode::UnresolvedImport).is_empty());
    assert_eq!(project.state, PipelineState::Passed);
}

#[test]
fn invariant_put_get_round_trip() {
    let samples = [
        "",
        "export default function App() {}\n",
        "line1\r\nline2\ttabbed\u{0}null",
        "emoji 🚀 and accents café",
    ];
    for (i, content) in samples.iter().enumerate() {
        let mut tree = VirtualFileTree::new();
        let path = format!("/components/File{}.jsx", i);
        tree.put(&path, *content).unwrap();
        assert_eq!(tree.get(&path).unwrap().content.as_bytes(), content.as_bytes());
    }
}

#[test]
fn invariant_advisory_findings_never_block() {
    let project = validate(&[
        (
            "/App.jsx",
            r#"import styles from './App.module.css';
export default function App() {
  return <div style={{ padding: 4 }} className="bg-gray-100 text-blue-500"><button>Lorem ipsum</button></div>;
}"#,
        ),
        ("/App.module.css", ".root { padding: 4px; }"),
    ]);

    assert_eq!(project.state, PipelineState::Passed);
    assert_eq!(project.report.count(Severity::Error), 0);
    assert_eq!(project.report.count(Severity::Warning), 2);
    assert_eq!(project.report.count(Severity::Info), 4);
}

#[test]
fn invariant_session_requires_ingestion_between_reports() {
    let mut session = ProjectSession::new(ProjectValidator::default());
    session
        .ingest(&GenerationPass::from_files([("/App.jsx", "export default () => null")]))
        .unwrap();
    assert!(session.validate().unwrap().passed());
    assert!(session.validate().is_err());

    let mut removal = GenerationPass::default();
    removal.removed.push("/App.jsx".to_string());
    session.ingest(&removal).unwrap();

    let project = session.validate().unwrap();
    assert_eq!(project.state, PipelineState::Failed);
    assert_eq!(project.report.findings()[0].code, FindingCode::MissingEntry);
}

#[test]
fn invariant_generation_pass_json_boundary() {
    let pass: GenerationPass = serde_json::from_str(
        r#"{"files": [{"path": "App.jsx", "content": "export default function App() {}"}]}"#,
    )
    .unwrap();
    let mut session = ProjectSession::new(ProjectValidator::default());
    let written = session.ingest(&pass).unwrap();
    assert_eq!(written, vec!["/App.jsx"]);

    let project = session.validate().unwrap();
    let json = serde_json::to_value(project).unwrap();
    assert_eq!(json["state"], "passed");
    assert_eq!(json["engine_version"], genfs_core::ENGINE_VERSION);
    assert!(json["report"]["findings"].as_array().unwrap().is_empty());
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_session_always_runs_structure_phase() {
    use genfs_core::validation::{get_structure_pass_count, reset_structure_pass_count};

    reset_structure_pass_count();
    let mut session = ProjectSession::new(ProjectValidator::default());
    session
        .ingest(&GenerationPass::from_files([("/App.jsx", "export default () => null")]))
        .unwrap();
    session.validate().unwrap();
    assert!(get_structure_pass_count() >= 1);
}
