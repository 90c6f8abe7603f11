// Command-line interface definitions for typeclack
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "typeclack")]
#[command(author, version, about = "Mechanical typewriter sounds for every keystroke")]
#[command(long_about = "
typeclack plays mechanical typewriter sounds in response to keyboard
activity anywhere on the system, complete with margin bell, carriage
returns and paper feeds, and keeps rolling key-press statistics.

SETUP:
  1. Add yourself to the input group: sudo usermod -aG input $USER
  2. Log out and back in
  3. Run: typeclack (to start the daemon with the builtin soundset)
  4. Optional: drop recorded soundsets under ~/.local/share/typeclack/soundsets

USAGE:
  Just type. SIGUSR1 cycles through installed soundsets, SIGUSR2 toggles
  the paper simulation. Key-press statistics land in the stats file for
  Waybar/polybar integration.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the typewriter model (soundset name, e.g. builtin)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the master volume (0.0 to 1.0)
    #[arg(long, value_name = "LEVEL")]
    pub volume: Option<f32>,

    /// Override the margin width in columns
    #[arg(long, value_name = "COLUMNS")]
    pub margin: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Show current configuration
    Config,

    /// List installed soundset models
    Models,

    /// Play one sound category and exit (soundset testing)
    Play {
        /// Category name, e.g. KeyDown, Bell, SingleLineReturn
        category: Option<String>,

        /// List all category names instead of playing
        #[arg(long)]
        list: bool,
    },
}
