//! Cargo.toml file parsing.
//!
//! Manifests are only ever read through this module. Writing goes through
//! [`crate::patch`], which edits lines of text instead of re-serializing the
//! document.

use semver::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item};

use crate::error::{Result, VersionError};
use crate::version::parse_version;

pub const MANIFEST_FILE: &str = "Cargo.toml";

/// A parsed Cargo.toml manifest.
#[derive(Debug, Clone)]
pub struct CargoManifest {
    pub path: PathBuf,
    pub package: Option<Package>,
    pub workspace: Option<WorkspaceSection>,
}

/// The `[package]` table of a manifest.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub version: PackageVersion,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageVersion {
    Explicit(Version),
    /// `version.workspace = true`
    Inherited,
}

/// The `[workspace]` table of a manifest.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSection {
    pub members: Vec<String>,
    pub exclude: Vec<String>,
    /// `[workspace.package] version`
    pub version: Option<Version>,
    /// `[workspace.dependencies]` entries carrying a version.
    pub dependencies: Vec<Dependency>,
}

/// A dependency declaring an explicit version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// The version text exactly as written; may be a requirement such as `^1.2`.
    pub version: String,
    pub dep_type: DependencyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyType {
    Normal,
    Dev,
    Build,
    Workspace,
}

const DEPENDENCY_SECTIONS: [(&str, DependencyType); 3] = [
    ("dependencies", DependencyType::Normal),
    ("dev-dependencies", DependencyType::Dev),
    ("build-dependencies", DependencyType::Build),
];

impl CargoManifest {
    /// Load the manifest in `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(dir.as_ref().join(MANIFEST_FILE))
    }

    /// Load a Cargo.toml file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VersionError::ManifestNotFound {
                path: path.to_path_buf(),
            },
            _ => VersionError::io(path, e),
        })?;
        Self::parse(path, &content)
    }

    /// Parse manifest text. `path` is only used for error reporting.
    pub fn parse(path: impl AsRef<Path>, content: &str) -> Result<Self> {
        let path = path.as_ref();
        let document: DocumentMut =
            content
                .parse()
                .map_err(|e: toml_edit::TomlError| VersionError::ManifestParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;

        let workspace = document
            .get("workspace")
            .map(|ws| Self::parse_workspace(path, ws))
            .transpose()?;

        let package = document
            .get("package")
            .map(|pkg| Self::parse_package(path, pkg, &document))
            .transpose()?;

        if package.is_none() && workspace.is_none() {
            return Err(VersionError::MissingField {
                path: path.to_path_buf(),
                field: "package",
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            package,
            workspace,
        })
    }

    /// Directory containing the manifest.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn parse_package(path: &Path, package: &Item, document: &DocumentMut) -> Result<Package> {
        let name = package
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| VersionError::MissingField {
                path: path.to_path_buf(),
                field: "package.name",
            })?
            .to_string();

        let version_item = package.get("version").ok_or_else(|| VersionError::MissingField {
            path: path.to_path_buf(),
            field: "package.version",
        })?;

        let version = if let Some(text) = version_item.as_str() {
            PackageVersion::Explicit(parse_version(text)?)
        } else if version_item
            .get("workspace")
            .and_then(|w| w.as_bool())
            .unwrap_or(false)
        {
            PackageVersion::Inherited
        } else {
            return Err(VersionError::MissingField {
                path: path.to_path_buf(),
                field: "package.version",
            });
        };

        let mut dependencies = Vec::new();
        for (section, dep_type) in DEPENDENCY_SECTIONS {
            if let Some(deps) = document.get(section) {
                dependencies.extend(Self::parse_dependencies(deps, dep_type));
            }
        }

        Ok(Package {
            name,
            version,
            dependencies,
        })
    }

    fn parse_workspace(path: &Path, workspace: &Item) -> Result<WorkspaceSection> {
        let version = workspace
            .get("package")
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str())
            .map(parse_version)
            .transpose()?;

        let dependencies = workspace
            .get("dependencies")
            .map(|deps| Self::parse_dependencies(deps, DependencyType::Workspace))
            .unwrap_or_default();

        Ok(WorkspaceSection {
            members: Self::string_array(path, workspace, "members")?,
            exclude: Self::string_array(path, workspace, "exclude")?,
            version,
            dependencies,
        })
    }

    fn string_array(path: &Path, table: &Item, key: &'static str) -> Result<Vec<String>> {
        let Some(item) = table.get(key) else {
            return Ok(Vec::new());
        };
        let malformed = || VersionError::ManifestParse {
            path: path.to_path_buf(),
            message: format!("`workspace.{}` must be an array of strings", key),
        };

        item.as_array()
            .ok_or_else(malformed)?
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(malformed))
            .collect()
    }

    fn parse_dependencies(deps: &Item, dep_type: DependencyType) -> Vec<Dependency> {
        let Some(table) = deps.as_table_like() else {
            return Vec::new();
        };

        table
            .iter()
            .filter_map(|(name, item)| {
                // Either `name = "1.0"` or `name = { version = "1.0", ... }`
                let version = item
                    .as_str()
                    .or_else(|| item.get("version").and_then(|v| v.as_str()))?;
                Some(Dependency {
                    name: name.to_string(),
                    version: version.to_string(),
                    dep_type,
                })
            })
            .collect()
    }
}

/// Collapse dependencies to a name -> version map. The first declaration of
/// a name wins.
pub fn dependency_map<'a>(deps: impl IntoIterator<Item = &'a Dependency>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for dep in deps {
        map.entry(dep.name.clone())
            .or_insert_with(|| dep.version.clone());
    }
    map
}

#[cfg(test)]
#[path = "cargo_tests.rs"]
mod tests;
