//! Reports for planned version changes and consistency checks.

use colored::Colorize;
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::patch::ManifestPatch;
use crate::workspace::Workspace;

/// Represents a version change for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionChange {
    pub package: String,
    pub path: PathBuf,
    pub old_version: Version,
    pub new_version: Version,
}

/// Line patches planned for one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEdit {
    pub path: PathBuf,
    pub patch: ManifestPatch,
}

/// Everything an update operation changes, or would change on a dry run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeReport {
    pub dry_run: bool,
    pub changes: Vec<VersionChange>,
    pub edits: Vec<ManifestEdit>,
    /// Manifests actually rewritten; empty on a dry run.
    pub written: Vec<PathBuf>,
}

impl ChangeReport {
    /// Compare two snapshots of the same workspace.
    pub fn between(previous: &Workspace, next: &Workspace) -> Self {
        let mut changes = Vec::new();

        for root in next.roots() {
            let old = previous
                .roots()
                .iter()
                .find(|r| r.path == root.path)
                .and_then(|r| r.version.as_ref());
            if let (Some(old), Some(new)) = (old, root.version.as_ref()) {
                if old != new {
                    changes.push(VersionChange {
                        package: "[workspace.package]".to_string(),
                        path: root.manifest_path(),
                        old_version: old.clone(),
                        new_version: new.clone(),
                    });
                }
            }
        }

        for member in next.members() {
            let Some(old) = previous.member(&member.name) else {
                continue;
            };
            if old.version != member.version {
                changes.push(VersionChange {
                    package: member.name.clone(),
                    path: member.manifest_path(),
                    old_version: old.version.clone(),
                    new_version: member.version.clone(),
                });
            }
        }

        let edits = next
            .patches(previous)
            .into_iter()
            .map(|(path, patch)| ManifestEdit { path, patch })
            .collect();

        Self {
            dry_run: false,
            changes,
            edits,
            written: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.edits.is_empty()
    }

    /// Print a colorized summary of the planned changes.
    pub fn print(&self) {
        if self.dry_run {
            println!("{}", "Dry run mode: no files will be modified".yellow().bold());
        }

        if self.is_empty() {
            println!("{} Nothing to change", "Info:".blue().bold());
            return;
        }

        println!("\n{}", "Version changes:".bright_white().bold());
        for change in &self.changes {
            println!(
                "  {} {} {} {}",
                change.package.bright_white(),
                change.old_version.to_string().dimmed(),
                "->".dimmed(),
                change.new_version.to_string().green()
            );
        }

        println!("\n{}", "Manifest edits:".bright_white().bold());
        for edit in &self.edits {
            println!("  {}", edit.path.display().to_string().cyan());
            if let Some(version) = &edit.patch.version {
                println!("    version: {} -> {}", version.old, version.new);
            }
            for (name, replacement) in &edit.patch.dependencies {
                println!("    {}: {} -> {}", name, replacement.old, replacement.new);
            }
        }
    }
}

/// A tracked dependency that does not match the version of the member it
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInconsistency {
    pub package: String,
    pub path: PathBuf,
    pub dependency: String,
    pub expected: Version,
    pub found: String,
}

/// Report of version consistency check.
#[derive(Debug, Default, Serialize)]
pub struct ConsistencyReport {
    pub total_packages: usize,
    pub inconsistencies: Vec<VersionInconsistency>,
}

impl ConsistencyReport {
    /// Check every tracked dependency against the member it refers to.
    pub fn check(workspace: &Workspace) -> Self {
        let mut report = Self {
            total_packages: workspace.members().len(),
            ..Self::default()
        };

        let mut sources: Vec<(&str, PathBuf, &BTreeMap<String, String>)> = Vec::new();
        for root in workspace.roots() {
            sources.push(("[workspace.dependencies]", root.manifest_path(), &root.dependencies));
        }
        for member in workspace.members() {
            sources.push((member.name.as_str(), member.manifest_path(), &member.dependencies));
        }

        for (package, path, dependencies) in sources {
            for (dependency, found) in dependencies {
                let Some(target) = workspace.member(dependency) else {
                    continue;
                };
                if *found != target.version.to_string() {
                    report.inconsistencies.push(VersionInconsistency {
                        package: package.to_string(),
                        path: path.clone(),
                        dependency: dependency.clone(),
                        expected: target.version.clone(),
                        found: found.clone(),
                    });
                }
            }
        }

        report
    }

    pub fn has_issues(&self) -> bool {
        !self.inconsistencies.is_empty()
    }

    pub fn print(&self) {
        if !self.has_issues() {
            println!(
                "{} All versions are consistent ({} packages)",
                "✓".green().bold(),
                self.total_packages
            );
            return;
        }

        println!("{}", "Dependency Inconsistencies:".red().bold());
        for inc in &self.inconsistencies {
            println!(
                "  {} {} depends on {} {} (expected: {})",
                "✗".red(),
                inc.package.bright_white(),
                inc.dependency,
                inc.found.yellow(),
                inc.expected.to_string().green()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::BumpLevel;
    use std::fs;
    use tempfile::TempDir;

    fn create_workspace(core_dep: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join("Cargo.toml"),
            "[workspace]\nmembers = [\"core\", \"cli\"]\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("core")).unwrap();
        fs::write(
            root.join("core/Cargo.toml"),
            "[package]\nname = \"core\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("cli")).unwrap();
        fs::write(
            root.join("cli/Cargo.toml"),
            format!(
                "[package]\nname = \"cli\"\nversion = \"1.0.0\"\n\n[dependencies]\ncore = {{ path = \"../core\", version = \"{}\" }}\n",
                core_dep
            ),
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_check_consistent() {
        let temp = create_workspace("1.0.0");
        let ws = Workspace::load(temp.path()).unwrap();

        let report = ConsistencyReport::check(&ws);
        assert_eq!(report.total_packages, 2);
        assert!(!report.has_issues());
    }

    #[test]
    fn test_check_stale_dependency() {
        let temp = create_workspace("0.9.0");
        let ws = Workspace::load(temp.path()).unwrap();

        let report = ConsistencyReport::check(&ws);
        assert!(report.has_issues());
        assert_eq!(
            report.inconsistencies,
            vec![VersionInconsistency {
                package: "cli".to_string(),
                path: temp.path().join("cli").join("Cargo.toml"),
                dependency: "core".to_string(),
                expected: Version::parse("1.0.0").unwrap(),
                found: "0.9.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_change_report_between() {
        let temp = create_workspace("1.0.0");
        let old = Workspace::load(temp.path()).unwrap();
        let new = old.bump(BumpLevel::Patch).unwrap();

        let report = ChangeReport::between(&old, &new);
        let changed: Vec<(&str, String)> = report
            .changes
            .iter()
            .map(|c| (c.package.as_str(), c.new_version.to_string()))
            .collect();
        assert_eq!(
            changed,
            vec![("core", "1.0.1".to_string()), ("cli", "1.0.1".to_string())]
        );

        let cli_edit = report
            .edits
            .iter()
            .find(|e| e.path.ends_with("cli/Cargo.toml"))
            .unwrap();
        assert_eq!(cli_edit.patch.dependencies.len(), 1);
        assert_eq!(cli_edit.patch.dependencies[0].1.new, "1.0.1");
    }

    #[test]
    fn test_change_report_unchanged() {
        let temp = create_workspace("1.0.0");
        let old = Workspace::load(temp.path()).unwrap();
        let same = old.set_version(&Version::parse("1.0.0").unwrap());

        assert!(ChangeReport::between(&old, &same).is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let temp = create_workspace("0.9.0");
        let ws = Workspace::load(temp.path()).unwrap();

        let json = serde_json::to_value(ConsistencyReport::check(&ws)).unwrap();
        assert_eq!(json["inconsistencies"][0]["found"], "0.9.0");
        assert_eq!(json["inconsistencies"][0]["expected"], "1.0.0");
    }
}
