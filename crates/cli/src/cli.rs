use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Default CDP HTTP endpoint of a locally started Chromium.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9222";

#[derive(Parser, Debug)]
#[command(name = "pw-state")]
#[command(about = "Save and restore browser session state (cookies, localStorage)")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// CDP HTTP endpoint of the browser to attach to
	#[arg(long, global = true, value_name = "URL", env = "PW_STATE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
	pub endpoint: String,

	/// Timeout in milliseconds for each browser call and navigation
	#[arg(long, global = true, value_name = "MS", env = "PW_STATE_TIMEOUT_MS", default_value_t = 30_000)]
	pub timeout: u64,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Capture cookies and localStorage from the current tab into a file
	Save {
		/// Snapshot file to write (parent directories are created)
		path: PathBuf,
	},

	/// Apply a saved snapshot to the current tab
	Restore {
		/// Snapshot file to read
		path: PathBuf,
	},

	/// Summarize a snapshot file without touching a browser
	Show {
		/// Snapshot file to read
		path: PathBuf,
	},
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Save { .. } => "save",
			Commands::Restore { .. } => "restore",
			Commands::Show { .. } => "show",
		}
	}

	pub fn path(&self) -> &PathBuf {
		match self {
			Commands::Save { path } | Commands::Restore { path } | Commands::Show { path } => path,
		}
	}
}
