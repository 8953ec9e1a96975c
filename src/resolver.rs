//! Path Resolver - Import Specifiers to Virtual Paths
//!
//! `@/` is the project root alias. `./` and `../` resolve against the
//! importing file's directory. Bare specifiers are package imports and
//! never resolve inside the tree.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::path::{self, PathError};
use crate::tree::{VirtualFile, VirtualFileTree};

pub const ALIAS_PREFIX: &str = "@/";

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());

static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*//.*$").unwrap());

/// `//` after the `;` or `)` that closes a statement.
static TRAILING_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)([;)])[ \t]*//.*$").unwrap());

/// `import x from '..'`, `import { a, b } from '..'`, `import '..'`
static STATIC_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+(?:type\s+)?(?:[\w*${}\s,]+?\s+from\s+)?["']([^"'\n]+)["']"#).unwrap()
});

/// `export * from '..'`, `export { a } from '..'`
static REEXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s+["']([^"'\n]+)["']"#)
        .unwrap()
});

/// `import('..')` and `require('..')`
static CALL_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:import|require)\s*\(\s*["']([^"'\n]+)["']\s*\)"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "path")]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

impl Resolution {
    pub fn path(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(p) => Some(p),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// A local import from one file to another. Recomputed from the tree on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub from_path: String,
    pub specifier: String,
    pub resolved_path: Option<String>,
}

/// Whether a specifier points into the project tree rather than a package.
pub fn is_local_specifier(specifier: &str) -> bool {
    specifier.starts_with(ALIAS_PREFIX)
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || specifier == "."
        || specifier == ".."
}

/// Drop block comments, whole-line `//` comments and `//` comments that
/// follow a closed statement. Any other `//` is kept since it also appears
/// inside URL strings.
pub(crate) fn strip_comments(content: &str) -> String {
    let stripped = BLOCK_COMMENT_RE.replace_all(content, "");
    let stripped = LINE_COMMENT_RE.replace_all(&stripped, "");
    TRAILING_COMMENT_RE.replace_all(&stripped, "${1}").into_owned()
}

/// Every import specifier in `content`, in source order, each listed once.
pub fn extract_imports(content: &str) -> Vec<String> {
    let stripped = strip_comments(content);

    let mut found: Vec<(usize, String)> = Vec::new();
    for re in [&*STATIC_IMPORT_RE, &*REEXPORT_RE, &*CALL_IMPORT_RE] {
        for caps in re.captures_iter(&stripped) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, spec)| seen.insert(spec.clone()).then_some(spec))
        .collect()
}

/// Resolves specifiers against one tree snapshot. Never mutates the tree.
pub struct Resolver<'a> {
    tree: &'a VirtualFileTree,
    extensions: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a VirtualFileTree) -> Self {
        Self::with_extensions(tree, crate::DEFAULT_RESOLUTION_EXTENSIONS.iter().copied())
    }

    /// Resolver with a custom extension priority order.
    pub fn with_extensions<S: AsRef<str>>(
        tree: &'a VirtualFileTree,
        extensions: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            tree,
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    /// Resolve `specifier` as imported from `from_path`.
    pub fn resolve(&self, from_path: &str, specifier: &str) -> Resolution {
        let Some(base) = self.target_base(from_path, specifier) else {
            return Resolution::Unresolved;
        };

        self.candidates(&base)
            .into_iter()
            .find(|c| self.tree.contains(c))
            .map(Resolution::Resolved)
            .unwrap_or(Resolution::Unresolved)
    }

    /// Local import edges of one file, in source order.
    pub fn edges_for(&self, file: &VirtualFile) -> Vec<ImportEdge> {
        if !file.kind.is_script() {
            return vec![];
        }
        extract_imports(&file.content)
            .into_iter()
            .filter(|spec| is_local_specifier(spec))
            .map(|spec| ImportEdge {
                resolved_path: self.resolve(&file.path, &spec).path().map(str::to_string),
                from_path: file.path.clone(),
                specifier: spec,
            })
            .collect()
    }

    /// Every local import edge in the tree, ordered by importing path.
    pub fn import_graph(&self) -> Vec<ImportEdge> {
        self.tree
            .list_all()
            .into_iter()
            .flat_map(|file| self.edges_for(file))
            .collect()
    }

    /// Normalized target of a local specifier. `/` when it names the root.
    fn target_base(&self, from_path: &str, specifier: &str) -> Option<String> {
        let target = if let Some(rest) = specifier.strip_prefix(ALIAS_PREFIX) {
            if rest.is_empty() {
                return Some(path::ROOT.to_string());
            }
            path::normalize(rest)
        } else if specifier.starts_with('/') {
            path::normalize(specifier)
        } else if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
        {
            let from = path::normalize(from_path).ok()?;
            path::join(path::parent_dir(&from), specifier)
        } else {
            return None;
        };

        match target {
            Ok(base) => Some(base),
            Err(PathError::RootOnly(_)) => Some(path::ROOT.to_string()),
            Err(_) => None,
        }
    }

    /// Candidate paths in priority order: literal, `base.ext`, `base/index.ext`.
    /// The root is a directory, so only `/index.ext` applies to it.
    fn candidates(&self, base: &str) -> Vec<String> {
        if base == path::ROOT {
            return self
                .extensions
                .iter()
                .map(|ext| format!("/index.{}", ext))
                .collect();
        }

        let mut out = Vec::with_capacity(1 + self.extensions.len() * 2);
        out.push(base.to_string());
        out.extend(self.extensions.iter().map(|ext| format!("{}.{}", base, ext)));
        out.extend(self.extensions.iter().map(|ext| format!("{}/index.{}", base, ext)));
        out
    }
}

/// Resolve with the default extension order.
pub fn resolve(tree: &VirtualFileTree, from_path: &str, specifier: &str) -> Resolution {
    Resolver::new(tree).resolve(from_path, specifier)
}
