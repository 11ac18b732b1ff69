//! Workspace model: loading, version transformation and propagation.
//!
//! A [`Workspace`] is an immutable snapshot of the members found on disk.
//! Every operation returns a new snapshot; the loaded one is kept around as the
//! "previous" state so [`Workspace::save`] knows which literals to replace.

use semver::Version;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cargo::{dependency_map, CargoManifest, Package, PackageVersion, MANIFEST_FILE};
use crate::error::{Result, VersionError};
use crate::patch::{ManifestPatch, PatchSet, Replacement};
use crate::scanner::WorkspaceScanner;
use crate::version::{self, BumpLevel};

/// A single versioned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Directory holding the member's Cargo.toml.
    pub path: PathBuf,
    pub name: String,
    pub version: Version,
    /// Dependency name -> version text as recorded in the manifest.
    pub dependencies: BTreeMap<String, String>,
    /// `version.workspace = true`; the version lives in the workspace root.
    pub inherits_version: bool,
}

impl Member {
    fn from_package(dir: &Path, package: &Package, shared: Option<&Version>) -> Result<Self> {
        let (version, inherits_version) = match &package.version {
            PackageVersion::Explicit(v) => (v.clone(), false),
            PackageVersion::Inherited => {
                let v = shared.ok_or_else(|| VersionError::MissingField {
                    path: dir.join(MANIFEST_FILE),
                    field: "workspace.package.version",
                })?;
                (v.clone(), true)
            }
        };

        Ok(Self {
            path: dir.to_path_buf(),
            name: package.name.clone(),
            version,
            dependencies: dependency_map(&package.dependencies),
            inherits_version,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }
}

/// Versions declared in a workspace root manifest: `[workspace.package]`
/// and `[workspace.dependencies]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceRoot {
    pub path: PathBuf,
    pub version: Option<Version>,
    pub dependencies: BTreeMap<String, String>,
}

impl WorkspaceRoot {
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }
}

/// A set of members with unique names.
///
/// A project without a `[workspace]` table is a workspace of one member.
/// Tracked dependencies are restricted to names of members, so every entry
/// is an internal reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    members: Vec<Member>,
    roots: Vec<WorkspaceRoot>,
}

impl Workspace {
    /// Build a workspace, dropping dependencies that do not name a member.
    pub fn new(members: Vec<Member>, roots: Vec<WorkspaceRoot>) -> Result<Self> {
        let mut seen: BTreeMap<&str, &Path> = BTreeMap::new();
        for member in &members {
            if let Some(first) = seen.insert(&member.name, &member.path) {
                return Err(VersionError::DuplicateMember {
                    name: member.name.clone(),
                    first: first.to_path_buf(),
                    second: member.path.clone(),
                });
            }
        }

        let names: BTreeSet<String> = members.iter().map(|m| m.name.clone()).collect();
        let internal = |deps: BTreeMap<String, String>| -> BTreeMap<String, String> {
            deps.into_iter()
                .filter(|(name, _)| names.contains(name))
                .collect()
        };

        let members = members
            .into_iter()
            .map(|m| Member {
                dependencies: internal(m.dependencies),
                ..m
            })
            .collect();
        let roots = roots
            .into_iter()
            .map(|r| WorkspaceRoot {
                dependencies: internal(r.dependencies),
                ..r
            })
            .collect();

        Ok(Self { members, roots })
    }

    /// Load the project or workspace rooted at `root`.
    ///
    /// Workspace members are loaded recursively; a member that declares a
    /// workspace of its own contributes its members to the same flat set.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Loader::default();
        loader.load(root.as_ref(), None)?;
        Self::new(loader.members, loader.roots)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn roots(&self) -> &[WorkspaceRoot] {
        &self.roots
    }

    /// The shared workspace version if there is one, otherwise the version
    /// of the first member.
    pub fn show_version(&self) -> String {
        self.roots
            .iter()
            .find_map(|r| r.version.as_ref())
            .or_else(|| self.members.first().map(|m| &m.version))
            .map(Version::to_string)
            .unwrap_or_else(|| "0.0.0".to_string())
    }

    /// Bump every member and the shared version by `level`.
    pub fn bump(&self, level: BumpLevel) -> Result<Self> {
        self.map_versions(|v| version::bump(v, level))
    }

    /// Advance every member and the shared version to the next prerelease.
    pub fn next_prerelease(&self) -> Result<Self> {
        self.map_versions(version::next_prerelease)
    }

    /// Set every member and the shared version to `new_version`.
    pub fn set_version(&self, new_version: &Version) -> Self {
        let table = self
            .members
            .iter()
            .map(|m| (m.name.clone(), new_version.clone()))
            .collect();

        let mut next = self.propagate(&table);
        for root in &mut next.roots {
            if root.version.is_some() {
                root.version = Some(new_version.clone());
            }
        }
        next
    }

    fn map_versions<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&Version) -> Result<Version>,
    {
        let mut table = BTreeMap::new();
        for member in &self.members {
            let new_version = f(&member.version)?;
            debug!(member = %member.name, old = %member.version, new = %new_version, "computed version");
            table.insert(member.name.clone(), new_version);
        }

        let mut next = self.propagate(&table);
        for root in &mut next.roots {
            root.version = root.version.as_ref().map(&f).transpose()?;
        }
        Ok(next)
    }

    /// Apply a table of new member versions.
    ///
    /// Each member takes its entry from `new_versions` and every tracked
    /// dependency naming a member is rewritten to that member's new version.
    /// Only the table is read, so the order members are visited in does not
    /// affect the result.
    pub fn propagate(&self, new_versions: &BTreeMap<String, Version>) -> Self {
        let members = self
            .members
            .iter()
            .map(|m| Member {
                path: m.path.clone(),
                name: m.name.clone(),
                version: new_versions
                    .get(&m.name)
                    .cloned()
                    .unwrap_or_else(|| m.version.clone()),
                dependencies: propagate_dependencies(&m.dependencies, new_versions),
                inherits_version: m.inherits_version,
            })
            .collect();

        let roots = self
            .roots
            .iter()
            .map(|r| WorkspaceRoot {
                path: r.path.clone(),
                version: r.version.clone(),
                dependencies: propagate_dependencies(&r.dependencies, new_versions),
            })
            .collect();

        Self { members, roots }
    }

    /// Line patches turning the manifests of `previous` into this snapshot.
    /// Manifests with nothing to change are omitted.
    pub fn patches(&self, previous: &Workspace) -> Vec<(PathBuf, ManifestPatch)> {
        let mut patches = Vec::new();

        for root in &self.roots {
            let Some(old) = previous.roots.iter().find(|r| r.path == root.path) else {
                continue;
            };
            let patch = ManifestPatch {
                version: match (&old.version, &root.version) {
                    (Some(o), Some(n)) if o != n => {
                        Some(Replacement::new(o.to_string(), n.to_string()))
                    }
                    _ => None,
                },
                dependencies: changed_dependencies(&old.dependencies, &root.dependencies),
            };
            if !patch.is_empty() {
                patches.push((root.manifest_path(), patch));
            }
        }

        for member in &self.members {
            let Some(old) = previous.member(&member.name) else {
                continue;
            };
            let patch = ManifestPatch {
                version: (!member.inherits_version && old.version != member.version).then(|| {
                    Replacement::new(old.version.to_string(), member.version.to_string())
                }),
                dependencies: changed_dependencies(&old.dependencies, &member.dependencies),
            };
            if !patch.is_empty() {
                patches.push((member.manifest_path(), patch));
            }
        }

        patches
    }

    /// Write this snapshot to disk, replacing the literals of `previous`.
    /// Returns the manifests that were rewritten.
    pub fn save(&self, previous: &Workspace) -> Result<Vec<PathBuf>> {
        let mut set = PatchSet::new();
        for (path, patch) in self.patches(previous) {
            set.stage(&path, &patch)?;
        }
        set.write()
    }
}

fn propagate_dependencies(
    deps: &BTreeMap<String, String>,
    new_versions: &BTreeMap<String, Version>,
) -> BTreeMap<String, String> {
    deps.iter()
        .map(|(name, current)| {
            let version = new_versions
                .get(name)
                .map(Version::to_string)
                .unwrap_or_else(|| current.clone());
            (name.clone(), version)
        })
        .collect()
}

fn changed_dependencies(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> Vec<(String, Replacement)> {
    new.iter()
        .filter_map(|(name, version)| {
            let previous = old.get(name)?;
            (previous != version).then(|| (name.clone(), Replacement::new(previous, version)))
        })
        .collect()
}

#[derive(Default)]
struct Loader {
    members: Vec<Member>,
    roots: Vec<WorkspaceRoot>,
    visited: HashSet<PathBuf>,
}

impl Loader {
    fn load(&mut self, dir: &Path, shared: Option<&Version>) -> Result<()> {
        let key = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !self.visited.insert(key) {
            debug!(path = %dir.display(), "manifest already loaded");
            return Ok(());
        }

        let manifest = CargoManifest::load_dir(dir)?;
        let Some(workspace) = &manifest.workspace else {
            if let Some(package) = &manifest.package {
                self.members.push(Member::from_package(dir, package, shared)?);
            }
            return Ok(());
        };

        let shared = workspace.version.as_ref().or(shared);
        if workspace.version.is_some() || !workspace.dependencies.is_empty() {
            self.roots.push(WorkspaceRoot {
                path: dir.to_path_buf(),
                version: workspace.version.clone(),
                dependencies: dependency_map(&workspace.dependencies),
            });
        }

        // A root package is an implicit member of its own workspace.
        if let Some(package) = &manifest.package {
            self.members.push(Member::from_package(dir, package, shared)?);
        }

        let member_dirs =
            WorkspaceScanner::new(dir).member_dirs(&workspace.members, &workspace.exclude)?;
        debug!(root = %dir.display(), members = member_dirs.len(), "loading workspace members");
        for member_dir in member_dirs {
            self.load(&member_dir, shared)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
