//! Resolution of `workspace.members` entries to member directories.

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cargo::MANIFEST_FILE;
use crate::error::{Result, VersionError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expands workspace member declarations below a workspace root.
#[derive(Debug)]
pub struct WorkspaceScanner {
    root: PathBuf,
}

impl WorkspaceScanner {
    /// Create a new workspace scanner.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve member entries to directories.
    ///
    /// Literal entries are kept in declaration order even when the directory
    /// has no manifest, so that loading reports it as missing. Glob entries
    /// expand to every directory holding a Cargo.toml whose path relative to
    /// the root matches, sorted. Anything under an `exclude` path is dropped.
    pub fn member_dirs(&self, members: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
        let exclude: Vec<PathBuf> = exclude.iter().map(|e| normalize(e)).collect();
        let mut candidates: Option<Vec<PathBuf>> = None;
        let mut dirs: Vec<PathBuf> = Vec::new();

        for entry in members {
            let matched = if is_glob(entry) {
                let pattern = Pattern::new(entry).map_err(|e| VersionError::MemberPattern {
                    pattern: entry.clone(),
                    message: e.to_string(),
                })?;

                if candidates.is_none() {
                    candidates = Some(self.find_manifest_dirs()?);
                }
                let matched: Vec<PathBuf> = candidates
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter(|rel| pattern.matches_path_with(rel, MATCH_OPTIONS))
                    .cloned()
                    .collect();

                if matched.is_empty() {
                    warn!(pattern = %entry, "workspace member pattern matched nothing");
                }
                matched
            } else {
                vec![normalize(entry)]
            };

            for rel in matched {
                if exclude.iter().any(|ex| rel.starts_with(ex)) {
                    debug!(member = %rel.display(), "excluded from workspace");
                    continue;
                }
                if !dirs.contains(&rel) {
                    dirs.push(rel);
                }
            }
        }

        Ok(dirs.into_iter().map(|rel| self.root.join(rel)).collect())
    }

    /// Relative paths of every directory below the root that holds a
    /// Cargo.toml, excluding target/ and .git/ directories. Sorted.
    fn find_manifest_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !matches!(name.as_ref(), "target" | ".git" | "node_modules" | ".cargo")
            })
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                VersionError::io(path, e.into())
            })?;

            if entry.file_type().is_dir() && entry.path().join(MANIFEST_FILE).is_file() {
                if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                    dirs.push(rel.to_path_buf());
                }
            }
        }

        Ok(dirs)
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Drop `.` components and trailing separators from a relative member path.
fn normalize(entry: &str) -> PathBuf {
    Path::new(entry)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch_crate(root: &Path, rel: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), "[package]\n").unwrap();
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literal_members_keep_order() {
        let temp = TempDir::new().unwrap();
        let scanner = WorkspaceScanner::new(temp.path());

        let dirs = scanner
            .member_dirs(&strings(&["plugin", "./core/"]), &[])
            .unwrap();

        assert_eq!(
            dirs,
            vec![temp.path().join("plugin"), temp.path().join("core")]
        );
    }

    #[test]
    fn test_glob_members_sorted_and_excluded() {
        let temp = TempDir::new().unwrap();
        touch_crate(temp.path(), "crates/zeta");
        touch_crate(temp.path(), "crates/alpha");
        touch_crate(temp.path(), "crates/scratch");
        touch_crate(temp.path(), "crates/alpha/nested");
        touch_crate(temp.path(), "target/crates/ghost");
        fs::create_dir_all(temp.path().join("crates/empty")).unwrap();

        let scanner = WorkspaceScanner::new(temp.path());
        let dirs = scanner
            .member_dirs(&strings(&["crates/*"]), &strings(&["crates/scratch"]))
            .unwrap();

        assert_eq!(
            dirs,
            vec![
                temp.path().join("crates/alpha"),
                temp.path().join("crates/zeta"),
            ]
        );
    }

    #[test]
    fn test_literal_and_glob_deduplicated() {
        let temp = TempDir::new().unwrap();
        touch_crate(temp.path(), "crates/a");
        touch_crate(temp.path(), "crates/b");

        let scanner = WorkspaceScanner::new(temp.path());
        let dirs = scanner
            .member_dirs(&strings(&["crates/b", "crates/*"]), &[])
            .unwrap();

        assert_eq!(
            dirs,
            vec![temp.path().join("crates/b"), temp.path().join("crates/a")]
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        let scanner = WorkspaceScanner::new(temp.path());

        let err = scanner
            .member_dirs(&strings(&["crates/["]), &[])
            .unwrap_err();
        assert!(matches!(err, VersionError::MemberPattern { .. }));
    }
}
