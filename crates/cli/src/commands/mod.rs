//! Subcommand bodies and the dispatch that wraps each in a session.

mod call;
mod info;
mod ping;

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};
use crate::runtime::{RuntimeConfig, build_lifecycle};

pub use call::{CallData, parse_params};
pub use info::InfoData;
pub use ping::PingData;

/// Runs the selected subcommand inside a session and prints its envelope.
///
/// Setup, command and teardown failures all surface as the returned error;
/// nothing is printed for them here.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let runtime = RuntimeConfig::from(&cli);
	let lifecycle = build_lifecycle(&runtime);
	let connection = runtime.connection();
	let started = Instant::now();
	let name = cli.command.name();

	debug!(target = "admctl.cli", command = name, server = %runtime.server, "dispatching");

	match cli.command {
		Commands::Ping => {
			let data = lifecycle.run(connection, async |session| ping::execute(session).await).await?;
			emit_success(name, data, started, format);
		}
		Commands::Info => {
			let data = lifecycle.run(connection, async |session| info::execute(session).await).await?;
			emit_success(name, data, started, format);
		}
		Commands::Call(args) => {
			let data = lifecycle
				.run(connection, async |session| call::execute(session, &args).await)
				.await?;
			emit_success(name, data, started, format);
		}
	}

	Ok(())
}

fn emit_success<T: Serialize>(command: &str, data: T, started: Instant, format: OutputFormat) {
	let result = ResultBuilder::new(command).started_at(started).data(data).build();
	print_result(&result, format);
}
