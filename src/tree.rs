//! Virtual File Tree - In-Memory Project Store
//!
//! Path -> file map rooted at `/`. Writes replace whole content, never merge.
//! Creation order is kept for diagnostics; lookups are by normalized path.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::path::{self, PathError};

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Tree snapshot corrupted: {0}")]
    Corrupted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Jsx,
    Tsx,
    Js,
    Ts,
    Other(String),
}

impl FileKind {
    pub fn from_path(path: &str) -> Self {
        match path::extension(path).as_deref() {
            Some("jsx") => FileKind::Jsx,
            Some("tsx") => FileKind::Tsx,
            Some("js") => FileKind::Js,
            Some("ts") => FileKind::Ts,
            Some(other) => FileKind::Other(other.to_string()),
            None => FileKind::Other(String::new()),
        }
    }

    /// Source kinds that carry imports and component markup.
    pub fn is_script(&self) -> bool {
        !matches!(self, FileKind::Other(_))
    }

    pub fn extension(&self) -> &str {
        match self {
            FileKind::Jsx => "jsx",
            FileKind::Tsx => "tsx",
            FileKind::Js => "js",
            FileKind::Ts => "ts",
            FileKind::Other(ext) => ext,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
    pub is_entry: bool,
    /// Position at which this path was first created. Survives overwrites.
    pub created_seq: u64,
    /// Starts at 1, bumped on every overwrite.
    pub revision: u32,
}

/// One file as proposed by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// The output of one generation run: files to write and paths it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPass {
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl GenerationPass {
    pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(p, c)| GeneratedFile::new(p, c))
                .collect(),
            removed: vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub struct VirtualFileTree {
    files: BTreeMap<String, VirtualFile>,
    entry_candidates: Vec<String>,
    next_seq: u64,
}

impl VirtualFileTree {
    pub fn new() -> Self {
        Self::with_entry_candidates(crate::DEFAULT_ENTRY_CANDIDATES.iter().copied())
    }

    /// Tree whose entry flag is derived from the given candidate paths.
    pub fn with_entry_candidates<S: AsRef<str>>(candidates: impl IntoIterator<Item = S>) -> Self {
        let entry_candidates = candidates
            .into_iter()
            .filter_map(|c| path::normalize(c.as_ref()).ok())
            .collect();
        Self {
            files: BTreeMap::new(),
            entry_candidates,
            next_seq: 0,
        }
    }

    pub fn entry_candidates(&self) -> &[String] {
        &self.entry_candidates
    }

    /// Swap the candidate list and re-derive every file's entry flag.
    pub fn set_entry_candidates<S: AsRef<str>>(&mut self, candidates: impl IntoIterator<Item = S>) {
        self.entry_candidates = candidates
            .into_iter()
            .filter_map(|c| path::normalize(c.as_ref()).ok())
            .collect();
        for file in self.files.values_mut() {
            file.is_entry = self.entry_candidates.contains(&file.path);
        }
    }

    /// Store `content` at `raw_path`, replacing any existing file entirely.
    /// Returns the normalized path.
    pub fn put(&mut self, raw_path: &str, content: impl Into<String>) -> Result<String, TreeError> {
        let path = path::normalize(raw_path)?;
        let content = content.into();

        if let Some(existing) = self.files.get_mut(&path) {
            existing.content = content;
            existing.revision += 1;
            debug!(path = %path, revision = existing.revision, "overwrote file");
            return Ok(path);
        }

        let file = VirtualFile {
            kind: FileKind::from_path(&path),
            is_entry: self.entry_candidates.iter().any(|c| *c == path),
            path: path.clone(),
            content,
            created_seq: self.next_seq,
            revision: 1,
        };
        self.next_seq += 1;
        debug!(path = %path, "created file");
        self.files.insert(path.clone(), file);
        Ok(path)
    }

    pub fn get(&self, raw_path: &str) -> Result<&VirtualFile, TreeError> {
        let path = path::normalize(raw_path)?;
        self.files.get(&path).ok_or(TreeError::NotFound(path))
    }

    /// Lookup by an already-normalized path.
    pub fn contains(&self, normalized: &str) -> bool {
        self.files.contains_key(normalized)
    }

    pub fn remove(&mut self, raw_path: &str) -> Result<VirtualFile, TreeError> {
        let path = path::normalize(raw_path)?;
        let removed = self.files.remove(&path).ok_or(TreeError::NotFound(path))?;
        debug!(path = %removed.path, "removed file");
        Ok(removed)
    }

    /// All files ordered by path.
    pub fn list_all(&self) -> Vec<&VirtualFile> {
        self.files.values().collect()
    }

    /// All files in the order their paths were first created.
    pub fn list_by_creation(&self) -> Vec<&VirtualFile> {
        let mut files: Vec<_> = self.files.values().collect();
        files.sort_by_key(|f| f.created_seq);
        files
    }

    /// Files whose path starts with the given directory.
    pub fn list_dir(&self, raw_dir: &str) -> Vec<&VirtualFile> {
        let prefix = match path::normalize(raw_dir) {
            Ok(dir) => format!("{}/", dir),
            Err(_) => "/".to_string(),
        };
        self.files
            .values()
            .filter(|f| f.path.starts_with(&prefix))
            .collect()
    }

    /// Entry files present in the tree, in candidate order.
    pub fn entries(&self) -> Vec<&VirtualFile> {
        self.entry_candidates
            .iter()
            .filter_map(|c| self.files.get(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Apply a generation pass: removals first, then writes in order.
    /// Duplicate paths within one pass resolve last-write-wins.
    pub fn ingest(&mut self, pass: &GenerationPass) -> Result<Vec<String>, TreeError> {
        for raw in &pass.removed {
            match self.remove(raw) {
                Ok(_) | Err(TreeError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let mut written = Vec::with_capacity(pass.files.len());
        for file in &pass.files {
            written.push(self.put(&file.path, file.content.as_str())?);
        }
        Ok(written)
    }

    /// Check internal consistency before a validation run reads the tree.
    pub fn verify_integrity(&self) -> Result<(), TreeError> {
        let mut seqs = HashSet::with_capacity(self.files.len());
        for (key, file) in &self.files {
            if *key != file.path {
                return Err(TreeError::Corrupted(format!(
                    "key {} holds file recorded as {}",
                    key, file.path
                )));
            }
            if path::normalize(key).as_deref() != Ok(key.as_str()) {
                return Err(TreeError::Corrupted(format!("non-normalized key {}", key)));
            }
            if file.created_seq >= self.next_seq || !seqs.insert(file.created_seq) {
                return Err(TreeError::Corrupted(format!(
                    "invalid creation sequence {} for {}",
                    file.created_seq, key
                )));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn corrupt_for_test(&mut self, key: &str, recorded_path: &str) {
        if let Some(mut file) = self.files.remove(key) {
            file.path = recorded_path.to_string();
            self.files.insert(key.to_string(), file);
        }
    }
}

impl Default for VirtualFileTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get_round_trip() {
        let mut tree = VirtualFileTree::new();
        let content = "export default function App() {\n  return <div>é</div>;\n}\n";
        tree.put("/App.jsx", content).unwrap();
        assert_eq!(tree.get("/App.jsx").unwrap().content, content);
    }

    #[test]
    fn test_put_overwrites_entirely() {
        let mut tree = VirtualFileTree::new();
        tree.put("/lib/util.js", "export const a = 1;").unwrap();
        tree.put("lib/./util.js", "export const b = 2;").unwrap();

        let file = tree.get("/lib/util.js").unwrap();
        assert_eq!(file.content, "export const b = 2;");
        assert_eq!(file.revision, 2);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_equivalent_paths_collide() {
        let mut tree = VirtualFileTree::new();
        tree.put("components/Card.jsx", "a").unwrap();
        tree.put("/hooks/../components/Card.jsx", "b").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("/components/Card.jsx").unwrap().content, "b");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let tree = VirtualFileTree::new();
        assert!(matches!(tree.get("/App.jsx"), Err(TreeError::NotFound(_))));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let mut tree = VirtualFileTree::new();
        assert!(matches!(
            tree.put("../outside.js", ""),
            Err(TreeError::InvalidPath(PathError::EscapesRoot(_)))
        ));
    }

    #[test]
    fn test_list_all_ordered_by_path() {
        let mut tree = VirtualFileTree::new();
        tree.put("/lib/b.js", "").unwrap();
        tree.put("/App.jsx", "").unwrap();
        tree.put("/components/A.jsx", "").unwrap();

        let paths: Vec<_> = tree.list_all().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/App.jsx", "/components/A.jsx", "/lib/b.js"]);

        let created: Vec<_> = tree.list_by_creation().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(created, vec!["/lib/b.js", "/App.jsx", "/components/A.jsx"]);
    }

    #[test]
    fn test_entry_flag_and_kind() {
        let mut tree = VirtualFileTree::new();
        tree.put("/App.tsx", "").unwrap();
        tree.put("/components/App.jsx", "").unwrap();

        let entry = tree.get("/App.tsx").unwrap();
        assert!(entry.is_entry);
        assert_eq!(entry.kind, FileKind::Tsx);
        assert!(!tree.get("/components/App.jsx").unwrap().is_entry);
        assert_eq!(tree.entries().len(), 1);
    }

    #[test]
    fn test_set_entry_candidates_reflags_files() {
        let mut tree = VirtualFileTree::new();
        tree.put("/App.jsx", "").unwrap();
        tree.put("/main.tsx", "").unwrap();

        tree.set_entry_candidates(["main.tsx"]);
        assert_eq!(tree.entry_candidates(), ["/main.tsx".to_string()]);
        assert!(tree.get("/main.tsx").unwrap().is_entry);
        assert!(!tree.get("/App.jsx").unwrap().is_entry);

        tree.put("/App.tsx", "").unwrap();
        assert!(!tree.get("/App.tsx").unwrap().is_entry);
    }

    #[test]
    fn test_ingest_removes_then_writes_last_wins() {
        let mut tree = VirtualFileTree::new();
        tree.put("/old.jsx", "").unwrap();

        let pass = GenerationPass {
            files: vec![
                GeneratedFile::new("/App.jsx", "first"),
                GeneratedFile::new("App.jsx", "second"),
            ],
            removed: vec!["/old.jsx".to_string(), "/never-existed.jsx".to_string()],
        };
        let written = tree.ingest(&pass).unwrap();

        assert_eq!(written, vec!["/App.jsx", "/App.jsx"]);
        assert!(!tree.contains("/old.jsx"));
        assert_eq!(tree.get("/App.jsx").unwrap().content, "second");
    }

    #[test]
    fn test_list_dir() {
        let mut tree = VirtualFileTree::new();
        tree.put("/components/A.jsx", "").unwrap();
        tree.put("/components/ui/B.jsx", "").unwrap();
        tree.put("/componentsX.jsx", "").unwrap();
        assert_eq!(tree.list_dir("/components").len(), 2);
    }

    #[test]
    fn test_integrity_detects_mismatched_key() {
        let mut tree = VirtualFileTree::new();
        tree.put("/App.jsx", "").unwrap();
        assert!(tree.verify_integrity().is_ok());

        tree.corrupt_for_test("/App.jsx", "/Other.jsx");
        assert!(matches!(tree.verify_integrity(), Err(TreeError::Corrupted(_))));
    }
}
