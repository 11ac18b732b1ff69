//! Operation dispatch shared by the binary and library users.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::report::{ChangeReport, ConsistencyReport};
use crate::version::{parse_version, BumpLevel};
use crate::workspace::Workspace;

/// What to do with the workspace versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Show,
    Bump(BumpLevel),
    Next,
    Set(String),
    Check,
}

/// Result of running an [`Operation`].
#[derive(Debug)]
pub enum Outcome {
    Version(String),
    Changes(ChangeReport),
    Consistency(ConsistencyReport),
}

/// Run `operation` against the project rooted at `root`.
///
/// Update operations load the workspace, derive the new snapshot and, unless
/// `dry_run` is set, rewrite the affected manifests using the loaded snapshot
/// to locate the old literals.
pub fn execute(root: &Path, operation: &Operation, dry_run: bool) -> Result<Outcome> {
    // Validate before touching anything on disk.
    if let Operation::Set(version) = operation {
        parse_version(version)?;
    }

    let previous = Workspace::load(root)
        .with_context(|| format!("Failed to load workspace at {}", root.display()))?;
    debug!(members = previous.members().len(), "workspace loaded");

    let next = match operation {
        Operation::Show => return Ok(Outcome::Version(previous.show_version())),
        Operation::Check => return Ok(Outcome::Consistency(ConsistencyReport::check(&previous))),
        Operation::Bump(level) => previous.bump(*level)?,
        Operation::Next => previous.next_prerelease()?,
        Operation::Set(version) => previous.set_version(&parse_version(version)?),
    };

    let mut report = ChangeReport::between(&previous, &next);
    report.dry_run = dry_run;

    if dry_run {
        info!(edits = report.edits.len(), "dry run, no manifests written");
    } else {
        report.written = next
            .save(&previous)
            .with_context(|| format!("Failed to save workspace at {}", root.display()))?;
    }

    Ok(Outcome::Changes(report))
}
