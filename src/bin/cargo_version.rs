//! cargo-version - view and change versions of cargo projects.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use cargo_version::{execute, BumpLevel, Operation, Outcome};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

/// Change versions of cargo projects.
///
/// For workspaces, every member is bumped and internal dependency
/// declarations are updated to the new versions.
#[derive(Parser, Debug)]
#[command(name = "cargo-version")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .args(["bump", "next", "set", "show", "check"])
))]
struct Cli {
    /// Project folder
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    project: PathBuf,

    /// Bump every member by LEVEL
    #[arg(short, long, value_enum, value_name = "LEVEL")]
    bump: Option<BumpLevel>,

    /// Advance every member to the next nightly prerelease
    #[arg(short, long)]
    next: bool,

    /// Set every member to VERSION
    #[arg(short, long, value_name = "VERSION")]
    set: Option<String>,

    /// Print the current version
    #[arg(short = 'o', long)]
    show: bool,

    /// Report dependencies that do not match the member version
    #[arg(short, long)]
    check: bool,

    /// Print the planned changes without writing any file
    #[arg(long, conflicts_with_all = ["show", "check"])]
    dry_run: bool,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn operation(&self) -> Operation {
        if let Some(level) = self.bump {
            Operation::Bump(level)
        } else if self.next {
            Operation::Next
        } else if let Some(version) = &self.set {
            Operation::Set(version.clone())
        } else if self.check {
            Operation::Check
        } else {
            Operation::Show
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cargo_version=debug")
        } else {
            EnvFilter::new("cargo_version=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let outcome = execute(&cli.project, &cli.operation(), cli.dry_run)?;

    match outcome {
        Outcome::Version(version) => {
            if cli.json {
                println!("{}", serde_json::json!({ "version": version }));
            } else {
                println!("{}", version);
            }
        }
        Outcome::Changes(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.dry_run {
                report.print();
            }
        }
        Outcome::Consistency(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
            if report.has_issues() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
