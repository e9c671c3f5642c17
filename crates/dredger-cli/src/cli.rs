//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dredger - Keep node configuration files in line with their records
#[derive(Parser, Debug)]
#[command(name = "dredger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "DREDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of managed configuration files
    #[arg(long, global = true, env = "DREDGER_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory of the record store
    #[arg(long, global = true, env = "DREDGER_RECORDS")]
    pub records: Option<PathBuf>,

    /// Node whose labels carry content hashes
    #[arg(long, global = true, env = "DREDGER_NODE")]
    pub node: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create or update a record from a document
    ///
    /// Examples:
    ///   dredger apply app.yaml
    ///   dredger apply app.json
    Apply {
        /// Record document; the format follows the extension
        file: PathBuf,
    },

    /// Request deletion of a record
    Delete {
        /// Record name
        name: String,

        /// Record namespace
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Run one reconciliation pass over every record
    Reconcile,

    /// Show the observed state of a managed file as JSON
    Status {
        /// File name within the configuration root
        target: String,
    },

    /// Remove managed files
    ///
    /// Without names, everything under the root is removed.
    Reset {
        /// File names within the configuration root
        names: Vec<String>,
    },
}
