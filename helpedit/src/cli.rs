//! Command-line interface definitions for helpedit

use crate::config::CONFIG_FILE_NAME;
use crate::document::DocumentKind;
use crate::navigation::Link;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the helpedit application
#[derive(Parser)]
#[command(name = "helpedit")]
#[command(version)]
#[command(about = "Help page editing and maintenance tool", long_about = None)]
pub struct Cli {
    /// Editor configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for helpedit
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new help page from a built-in template
    New {
        /// Kind of help to create
        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,

        /// Menu or program title
        #[arg(short, long, default_value = "")]
        title: String,

        /// One-line description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Category (repeat for several)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Parameter label (repeat for several, program help only)
        #[arg(long = "parameter")]
        parameters: Vec<String>,

        /// Use this template instead of the built-in one
        #[arg(long)]
        template: Option<PathBuf>,

        /// Output file (defaults to standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upgrade legacy help pages to the current format
    Upgrade {
        /// Help file, or directory searched recursively for .html files
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Kind of help (defaults to the configured kind)
        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,

        /// Overwrite the input files (one of --in-place or --output is required)
        #[arg(long, conflicts_with = "output")]
        in_place: bool,

        /// Output file, or output directory when PATH is a directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Regenerate the navigation index of a help page
    Index {
        /// Help file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the content of a help page and store it as the editor would
    Edit {
        /// Help file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// HTML fragment holding the new content
        #[arg(long, value_name = "FRAGMENT")]
        content: Option<PathBuf>,

        /// Kind of help (defaults to the configured kind)
        #[arg(short, long, value_enum)]
        kind: Option<DocumentKind>,

        /// Entry of the links block as TITLE=HREF (repeat for several)
        #[arg(long = "link", value_parser = clap::value_parser!(Link))]
        links: Vec<Link>,

        /// Output file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective editor configuration
    ShowConfig,
}
