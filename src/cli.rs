//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arix Tree - gesture-driven particle Christmas tree
#[derive(Parser, Debug)]
#[command(name = "arix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Scene config file (JSON). Defaults apply when absent.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the memory collection
    Memories {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Run the scene headless, replaying a gesture script
    Simulate {
        /// Number of 60 Hz frames to run
        #[arg(short, long, default_value = "600")]
        frames: u32,

        /// JSON gesture script (`{"frames": [{"t_ms": 0, "label": "Closed_Fist"}]}`)
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Open the interactive viewer
    #[cfg(feature = "viewer")]
    View {
        /// Photo files to add as memories while the viewer runs
        #[arg(long = "add-photo")]
        photos: Vec<PathBuf>,
    },

    /// Write or show the scene configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// List stored memories
    List,

    /// Add a memory from local files
    Add {
        #[arg(short, long)]
        name: String,

        /// Photo file (embedded as a data URI)
        #[arg(short, long)]
        photo: PathBuf,

        /// Optional music file
        #[arg(short, long)]
        music: Option<PathBuf>,
    },

    /// Delete a memory by id
    Delete { id: String },

    /// Replace the collection with the contents of a JSON file
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Write the collection to a JSON file
    Export {
        /// Output path. Defaults to `arix-memories-YYYY-MM-DD.json`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the default configuration to a file
    Init {
        #[arg(default_value = "arix.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
