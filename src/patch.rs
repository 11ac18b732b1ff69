//! Line-based patching of Cargo.toml files.
//!
//! Manifests are rewritten as text: only the version literals on matching
//! lines change, and every other byte (comments, blank lines, key order,
//! line endings) is copied through. A structured TOML writer is not used
//! because it does not round-trip hand-maintained formatting.
//!
//! When the expected old literal is not on a candidate line, the line is left
//! as is without any error.

use serde::Serialize;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, VersionError};

/// Prefix of the line holding a manifest's own version.
pub const VERSION_MARKER: &str = "version";

/// Swap one version literal for another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub old: String,
    pub new: String,
}

impl Replacement {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    fn apply(&self, line: &str) -> String {
        line.replace(&self.old, &self.new)
    }
}

/// Replacements to apply to a single manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestPatch {
    /// Applied to lines starting with [`VERSION_MARKER`].
    pub version: Option<Replacement>,
    /// Applied to lines starting with the dependency name.
    pub dependencies: Vec<(String, Replacement)>,
}

impl ManifestPatch {
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.dependencies.is_empty()
    }

    /// Patch manifest text line by line.
    pub fn apply(&self, content: &str) -> String {
        render(content, std::slice::from_ref(self))
    }
}

/// Apply every patch in `patches` to `content` in a single pass.
///
/// Each line is matched against its loaded text and receives at most one
/// replacement, so a literal written by one patch is never rewritten again by
/// another patch targeting the same file. Version candidates with the longest
/// old literal are tried first (`1.0.0-rc.1` before `1.0.0`), dependency
/// candidates with the longest name first (`core-utils` before `core`).
fn render(content: &str, patches: &[ManifestPatch]) -> String {
    let mut versions: Vec<&Replacement> =
        patches.iter().filter_map(|p| p.version.as_ref()).collect();
    versions.sort_by_key(|r| Reverse(r.old.len()));

    let mut dependencies: Vec<(&str, &Replacement)> = patches
        .iter()
        .flat_map(|p| p.dependencies.iter().map(|(name, r)| (name.as_str(), r)))
        .collect();
    dependencies.sort_by_key(|(name, _)| Reverse(name.len()));

    let mut output = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let replacement = if line.starts_with(VERSION_MARKER) {
            versions.iter().copied().find(|r| line.contains(r.old.as_str()))
        } else {
            dependencies
                .iter()
                .filter(|(name, _)| line.starts_with(*name))
                .map(|(_, r)| *r)
                .find(|r| line.contains(r.old.as_str()))
        };

        match replacement {
            Some(replacement) => output.push_str(&replacement.apply(line)),
            None => output.push_str(line),
        }
    }

    output
}

#[derive(Debug)]
struct StagedManifest {
    path: PathBuf,
    content: String,
    patches: Vec<ManifestPatch>,
}

/// Patches staged against manifest files.
///
/// Several patches may target the same file (a root package that is also the
/// workspace root). They are merged and rendered together against the text
/// read from disk, never against each other's output.
#[derive(Debug, Default)]
pub struct PatchSet {
    staged: Vec<StagedManifest>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` unless already staged and queue `patch` for it.
    pub fn stage(&mut self, path: &Path, patch: &ManifestPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        match self.staged.iter_mut().find(|s| s.path == path) {
            Some(staged) => staged.patches.push(patch.clone()),
            None => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| VersionError::io(path, e))?;
                self.staged.push(StagedManifest {
                    path: path.to_path_buf(),
                    content,
                    patches: vec![patch.clone()],
                });
            }
        }
        Ok(())
    }

    /// Write every staged file whose text changed. Returns the written paths.
    ///
    /// All files are rendered before the first write. Files are then
    /// overwritten in place one after another; a failure leaves the files
    /// written so far on disk.
    pub fn write(self) -> Result<Vec<PathBuf>> {
        let mut rendered = Vec::new();
        for staged in self.staged {
            let patched = render(&staged.content, &staged.patches);
            if patched == staged.content {
                debug!(path = %staged.path.display(), "patch left manifest unchanged");
                continue;
            }
            rendered.push((staged.path, patched));
        }

        let mut written = Vec::new();
        for (path, content) in rendered {
            std::fs::write(&path, content).map_err(|e| VersionError::io(&path, e))?;
            info!(path = %path.display(), "updated manifest");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
