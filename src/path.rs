//! Virtual Paths - Normalization Without OS Semantics
//!
//! Every path stored in the tree is absolute, `/`-separated and free of
//! `.`/`..` segments. Two spellings of the same location always normalize
//! to the same string.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty path")]
    Empty,

    #[error("Path names the root directory, not a file: {0}")]
    RootOnly(String),

    #[error("Parent directory traversal escapes the project root: {0}")]
    EscapesRoot(String),
}

pub const ROOT: &str = "/";

/// Normalize a raw path into its canonical absolute form.
///
/// A missing leading `/` is added, empty and `.` segments are dropped and
/// `..` pops the previous segment. Backslashes are not separators here.
pub fn normalize(raw: &str) -> Result<String, PathError> {
    if raw.trim().is_empty() {
        return Err(PathError::Empty);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::EscapesRoot(raw.to_string()));
                }
            }
            part => segments.push(part),
        }
    }

    if segments.is_empty() {
        return Err(PathError::RootOnly(raw.to_string()));
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Directory containing a normalized path. The root's files return `/`.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT,
        Some(idx) => &path[..idx],
    }
}

/// Join a relative specifier onto a directory and normalize the result.
pub fn join(dir: &str, relative: &str) -> Result<String, PathError> {
    if dir == ROOT {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", dir, relative))
    }
}

/// Final segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lowercased extension of the final segment, if any.
///
/// Dotfiles such as `/.env` have no extension.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 < name.len() => Some(name[idx + 1..].to_ascii_lowercase()),
        Some(_) => None,
    }
}

/// Top-level directory of a normalized path, e.g. `/components` for
/// `/components/ui/Button.jsx`. Files directly under the root return `None`.
pub fn top_level_dir(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let idx = rest.find('/')?;
    Some(&path[..idx + 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_leading_slash() {
        assert_eq!(normalize("App.jsx").unwrap(), "/App.jsx");
        assert_eq!(normalize("/App.jsx").unwrap(), "/App.jsx");
    }

    #[test]
    fn test_normalize_collapses_dot_segments() {
        assert_eq!(
            normalize("/components/./ui/../Card.jsx").unwrap(),
            "/components/Card.jsx"
        );
        assert_eq!(normalize("//lib///util.js").unwrap(), "/lib/util.js");
    }

    #[test]
    fn test_equivalent_spellings_collide() {
        let a = normalize("components/Card.jsx").unwrap();
        let b = normalize("/hooks/../components/./Card.jsx").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reject_escape_above_root() {
        let err = normalize("/../etc/passwd").unwrap_err();
        assert_eq!(err, PathError::EscapesRoot("/../etc/passwd".to_string()));
    }

    #[test]
    fn test_reject_empty_and_root() {
        assert_eq!(normalize("").unwrap_err(), PathError::Empty);
        assert_eq!(normalize("   ").unwrap_err(), PathError::Empty);
        assert!(matches!(normalize("/./"), Err(PathError::RootOnly(_))));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/App.jsx"), "/");
        assert_eq!(parent_dir("/components/ui/Button.jsx"), "/components/ui");
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join("/components", "./Card").unwrap(), "/components/Card");
        assert_eq!(join("/components/ui", "../../lib/util").unwrap(), "/lib/util");
        assert_eq!(join("/", "./App").unwrap(), "/App");
        assert!(join("/components", "../../x").is_err());
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/App.JSX").as_deref(), Some("jsx"));
        assert_eq!(extension("/styles/main.module.css").as_deref(), Some("css"));
        assert_eq!(extension("/.env"), None);
        assert_eq!(extension("/README"), None);
        assert_eq!(extension("/weird."), None);
    }

    #[test]
    fn test_top_level_dir() {
        assert_eq!(top_level_dir("/components/ui/Button.jsx"), Some("/components"));
        assert_eq!(top_level_dir("/App.jsx"), None);
    }
}
