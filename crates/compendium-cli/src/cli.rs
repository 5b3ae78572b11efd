use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "compendium",
    about = "Compendium: assemble a sectioned document from anchored content blocks",
    version
)]
pub struct Cli {
    /// Path to the config file (missing file means built-in defaults)
    #[arg(long, global = true, default_value = ".compendium/config.toml")]
    pub config: String,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a .compendium directory (config, block store, versions)
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply an operation batch to the latest version and commit the next one
    Apply {
        /// Operation batch (JSON array or JSONL)
        #[arg(long)]
        batch: String,

        /// Block source JSONL (defaults to config `blocks_path`)
        #[arg(long)]
        blocks: Option<String>,

        /// Version directory (defaults to config `versions_dir`)
        #[arg(long)]
        versions: Option<String>,

        /// Apply and report without committing a version
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the section and anchor index of a document
    Index {
        /// Document file to index (defaults to the latest version)
        #[arg(long, conflicts_with = "versions")]
        document: Option<String>,

        /// Version directory whose latest version is indexed
        #[arg(long)]
        versions: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render entries with citation markers and footnotes
    Render {
        /// Entry JSONL
        #[arg(long)]
        entries: String,

        /// Write rendered entries as JSONL to this path
        #[arg(long)]
        out: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List committed versions
    Versions {
        /// Version directory (defaults to config `versions_dir`)
        #[arg(long)]
        versions: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
