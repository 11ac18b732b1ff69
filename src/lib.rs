//! Version management for cargo projects and workspaces.
//!
//! This crate loads the members of a workspace, bumps or sets their
//! versions, propagates the new versions into internal dependency
//! declarations and writes the result back by patching only the affected
//! lines of each Cargo.toml.

pub mod cargo;
pub mod command;
pub mod error;
pub mod patch;
pub mod report;
pub mod scanner;
pub mod version;
pub mod workspace;

pub use cargo::CargoManifest;
pub use command::{execute, Operation, Outcome};
pub use error::{Result, VersionError};
pub use patch::{ManifestPatch, PatchSet, Replacement};
pub use report::{ChangeReport, ConsistencyReport, VersionChange};
pub use scanner::WorkspaceScanner;
pub use version::{BumpLevel, PRERELEASE_CHANNEL};
pub use workspace::{Member, Workspace, WorkspaceRoot};
