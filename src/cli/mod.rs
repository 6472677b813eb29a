// trustsync — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: init, source, sync, list, export, clear.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// trustsync — keep a local catalog of CA certificates in sync with its
/// upstream bundle sources.
#[derive(Parser, Debug)]
#[command(name = "trustsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the catalog database (defaults to the platform data directory).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize trustsync: create the data directory and catalog database.
    Init,

    /// Manage declared bundle sources.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },

    /// Run one reconciliation pass against declared sources or an ad-hoc origin.
    Sync {
        /// Reconcile only this declared source (default: all of them).
        source_id: Option<String>,

        /// Ad-hoc origin: an http(s) URL, a file path, or `-` for stdin.
        #[arg(long, conflicts_with_all = ["source_id", "dir"])]
        from: Option<String>,

        /// Reconcile every .pem/.crt file in this directory, one origin each.
        #[arg(long, conflicts_with = "source_id")]
        dir: Option<PathBuf>,

        /// Delete obsolete records even past the 20% safety threshold.
        #[arg(long)]
        force: bool,
    },

    /// List the stored certificates.
    List,

    /// Re-materialize the catalog for downstream consumers.
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },

    /// Remove every stored certificate (declared sources are kept).
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SourceAction {
    /// Declare a source, or update the locator of an existing one.
    Add {
        /// Unique source id (e.g. "mozilla").
        id: String,

        /// Where the bundle lives: an http(s) URL, a file path, or `-`.
        locator: String,
    },

    /// List declared sources.
    List,

    /// Remove a source declaration. Stored certificates are not touched.
    Remove {
        /// The source id to remove.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportTarget {
    /// Write the whole catalog as a single PEM bundle file.
    Bundle {
        /// Output file path.
        output: PathBuf,
    },

    /// Write one file per certificate into a directory.
    Dir {
        /// Output directory (pruned of existing files first).
        output: PathBuf,

        /// Filename mode: "dn" (raw distinguished name) or "uuid"
        /// (UUIDv5 derived from the distinguished name).
        #[arg(long, default_value = "uuid")]
        format: String,

        /// Caller-owned manifest file whose managed block lists the
        /// exported filenames.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Prefix prepended to each filename reference in the manifest.
        #[arg(long, default_value = "")]
        prefix: String,
    },
}
