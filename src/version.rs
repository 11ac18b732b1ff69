//! Version algebra: bumping, prerelease advancement and validation.
//!
//! Everything here is a pure function of its inputs and never touches the
//! filesystem.

use semver::{BuildMetadata, Prerelease, Version};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, VersionError};

/// Channel name used for prerelease labels (`1.2.3-nightly.1`).
pub const PRERELEASE_CHANNEL: &str = "nightly";

/// Level of a version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl BumpLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Prerelease => "prerelease",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse and validate a version string.
pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version).map_err(|e| VersionError::invalid_version(version, e))
}

/// Bump `current` by `level`.
///
/// Incrementing a field resets every less significant field to zero and
/// clears prerelease and build metadata. `Prerelease` keeps the numeric
/// fields and advances the prerelease label instead.
pub fn bump(current: &Version, level: BumpLevel) -> Result<Version> {
    let mut new_version = current.clone();
    new_version.build = BuildMetadata::EMPTY;

    match level {
        BumpLevel::Major => {
            new_version.major = increment(current, current.major)?;
            new_version.minor = 0;
            new_version.patch = 0;
            new_version.pre = Prerelease::EMPTY;
        }
        BumpLevel::Minor => {
            new_version.minor = increment(current, current.minor)?;
            new_version.patch = 0;
            new_version.pre = Prerelease::EMPTY;
        }
        BumpLevel::Patch => {
            new_version.patch = increment(current, current.patch)?;
            new_version.pre = Prerelease::EMPTY;
        }
        BumpLevel::Prerelease => {
            new_version.pre = next_label(current)?;
        }
    }

    Ok(new_version)
}

/// Advance to the next prerelease on the nightly channel.
///
/// A release version first moves to the next patch, so the result always
/// sorts after `current`: `1.2.3` becomes `1.2.4-nightly.1`, and
/// `1.2.4-nightly.1` becomes `1.2.4-nightly.2`.
pub fn next_prerelease(current: &Version) -> Result<Version> {
    let base = if current.pre.is_empty() {
        bump(current, BumpLevel::Patch)?
    } else {
        current.clone()
    };
    bump(&base, BumpLevel::Prerelease)
}

fn increment(version: &Version, field: u64) -> Result<u64> {
    field
        .checked_add(1)
        .ok_or_else(|| VersionError::invalid_version(&version.to_string(), "field overflow"))
}

/// Compute the prerelease label following the one on `version`.
///
/// `nightly.1` is used when there is no label; otherwise the last run of
/// digits is incremented (`beta.3` -> `beta.4`, `rc1` -> `rc2`), or `.1` is
/// appended when the label has no digits (`alpha` -> `alpha.1`).
fn next_label(version: &Version) -> Result<Prerelease> {
    let current = version.pre.as_str();

    let label = if current.is_empty() {
        format!("{}.1", PRERELEASE_CHANNEL)
    } else if let Some(last) = current.rfind(|c: char| c.is_ascii_digit()) {
        let end = last + 1;
        let start = current[..end]
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |idx| idx + 1);
        let number: u64 = current[start..end]
            .parse()
            .map_err(|e| VersionError::invalid_version(current, e))?;
        format!(
            "{}{}{}",
            &current[..start],
            increment(version, number)?,
            &current[end..]
        )
    } else {
        format!("{}.1", current)
    };

    Prerelease::new(&label).map_err(|e| VersionError::invalid_version(&label, e))
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
