//! Command implementations and dispatch.

pub mod restore;
pub mod save;
pub mod show;

use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::connect::ConnectConfig;
use crate::error::Result;
use crate::output::{self, ResultBuilder};

/// Runs the parsed command and prints its result.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let config = ConnectConfig::from_cli(&cli);
	let path = absolute_path(cli.command.path())?;

	match cli.command {
		Commands::Save { .. } => {
			let data = save::execute(&config, &path).await?;
			output::print_result(&ResultBuilder::new("save").data(data).build(), format);
		}
		Commands::Restore { .. } => {
			let data = restore::execute(&config, &path).await?;
			output::print_result(&ResultBuilder::new("restore").data(data).build(), format);
		}
		Commands::Show { .. } => {
			let data = show::execute(&path).await?;
			output::print_result(&ResultBuilder::new("show").data(data).build(), format);
		}
	}
	Ok(())
}

/// Resolves `path` against the working directory.
pub fn absolute_path(path: &std::path::Path) -> Result<PathBuf> {
	Ok(std::path::absolute(path)?)
}
