// ABOUTME: CLI argument definitions for the hookpad application
// ABOUTME: Defines the command-line interface structure using clap derive macros

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hookpad")]
#[command(about = "Send prompts to webhooks and render their responses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output for debugging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a chat message and print the updated editor content
    Send {
        /// Message text (if not provided, will read from stdin)
        message: Option<String>,
    },
    /// Send the editor content to the image webhook
    Generate {
        /// Read the content from a file instead of the saved editor
        #[arg(long, short = 'f', value_name = "FILE")]
        file: Option<PathBuf>,

        /// Directory generated images are written to
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Compute the display size of an image inside a container
    Fit {
        /// Image file to fit
        image: PathBuf,

        /// Container width in pixels (defaults to the terminal size)
        #[arg(long, requires = "height", value_parser = clap::value_parser!(u32).range(1..))]
        width: Option<u32>,

        /// Container height in pixels (defaults to the terminal size)
        #[arg(long, requires = "width", value_parser = clap::value_parser!(u32).range(1..))]
        height: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Re-fit whenever the terminal is resized, until interrupted
        #[arg(long, conflicts_with_all = ["width", "height"])]
        watch: bool,
    },
    /// List your most recently saved sessions
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Pretty print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,
    },
    /// Load a saved session into the editor
    Open {
        /// Session identifier (from `hookpad history`)
        session_id: String,
    },
    /// Start a new session with an empty prompt template
    New,
    /// Show the signed-in user and remaining free messages
    Whoami,
    /// Verify a session secret and store it in the system keychain
    Login {
        /// Session secret (if not provided, will read from stdin)
        secret: Option<String>,
    },
    /// Sign out and clear the stored session secret
    Logout,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: crate::completions::Shell,
    },
}
