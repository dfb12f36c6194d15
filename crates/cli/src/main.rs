use clap::Parser;
use pw_state_cli::{
	cli::Cli,
	commands,
	logging,
	output::{self, OutputFormat, ResultBuilder},
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		let cmd_error = err.to_command_error();

		// Humans read stderr, agents read the envelope on stdout
		output::print_error_stderr(&cmd_error);
		if format == OutputFormat::Json {
			let result: output::CommandResult<()> = ResultBuilder::new(command).failure(cmd_error).build();
			output::print_json(&result);
		}
		std::process::exit(1);
	}
}
