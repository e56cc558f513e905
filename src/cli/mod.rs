//! CLI module for docshift.
//!
//! Subcommands:
//! - `migrate`: Migrate one kind (single, many, all) or every kind in order
//! - `clean`: Remove migrated documents and reset mappings
//! - `init`: Apply pending schema steps to both databases
//! - `check`: Verify connectivity to both databases
//!
//! Reports are printed to stdout as JSON. `null` marks a batch that failed
//! before any record was processed.

mod check;
mod clean;
mod init;
mod migrate;

use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::models::EntityKind;

/// docshift - legacy content migration
#[derive(Parser)]
#[command(name = "docshift")]
#[command(about = "Migrates a legacy relational content platform into a document store")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate legacy records of one kind, or `everything` in dependency order
    Migrate {
        /// Entity kind, or `everything`
        target: MigrateTarget,

        #[command(subcommand)]
        scope: Option<MigrateScope>,
    },

    /// Remove migrated documents and their media, and reset mappings
    Clean {
        /// Entity kind
        kind: EntityKind,

        #[command(subcommand)]
        scope: CleanScope,
    },

    /// Apply pending schema steps to the target and legacy databases
    Init,

    /// Check connectivity to both databases
    Check,
}

/// What `migrate` operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateTarget {
    Everything,
    Kind(EntityKind),
}

impl FromStr for MigrateTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "everything" => Ok(MigrateTarget::Everything),
            other => other.parse().map(MigrateTarget::Kind),
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateScope {
    /// Migrate one legacy record
    Single {
        /// Legacy ID
        id: i64,
    },

    /// Migrate every record with a legacy ID in [start, end]
    Many {
        #[arg(long)]
        start: Option<i64>,

        #[arg(long)]
        end: Option<i64>,
    },

    /// Clean every past migration of the kind, then migrate all records
    All,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanScope {
    /// Clean one legacy record
    Single {
        /// Legacy ID
        id: i64,
    },

    /// Clean every migrated record of the kind
    All,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Migrate { target, scope } => self.run_migrate(target, scope).await,
            Command::Clean { kind, scope } => self.run_clean(kind, scope).await,
            Command::Init => self.run_init().await,
            Command::Check => self.run_check().await,
        }
    }
}

/// Prints a report as pretty JSON on stdout.
fn print_report<T: Serialize>(report: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
