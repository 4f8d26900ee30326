
use std::path::PathBuf;
use std::time::Duration;

use admctl::parse_duration;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Root CLI for admctl.
///
/// Connection flags are global so they may appear before or after the
/// subcommand.
#[derive(Parser, Debug)]
#[command(name = "admctl")]
#[command(about = "Administration client for the admin service")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Admin server to connect to (host:port or URL)
	#[arg(long, global = true, value_name = "HOST:PORT", env = "ADMCTL_SERVER", default_value = "")]
	pub server: String,

	/// Timeout for the total command (e.g. 30s, 5m, 1h)
	#[arg(
		long = "action_timeout",
		visible_alias = "action-timeout",
		global = true,
		value_name = "DURATION",
		value_parser = parse_duration,
		default_value = "1h"
	)]
	pub action_timeout: Duration,

	#[command(flatten)]
	pub tracing: TracingArgs,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct TracingArgs {
	/// Tracing backend for the invocation
	#[arg(long, global = true, value_enum, default_value = "noop")]
	pub tracer: TracerKind,

	/// File receiving span records when --tracer=file
	#[arg(long, global = true, value_name = "FILE", required_if_eq("tracer", "file"))]
	pub tracing_output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TracerKind {
	/// Tracing disabled
	#[default]
	Noop,
	/// Emit the invocation span through the log output
	Log,
	/// Append span records to --tracing-output
	File,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
	/// Check that the admin server answers.
	Ping,
	/// Show the admin server's name, version and uptime.
	Info,
	/// Invoke an arbitrary admin RPC method.
	Call(CallArgs),
}

impl Commands {
	/// Name used in output envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Ping => "ping",
			Commands::Info => "info",
			Commands::Call(_) => "call",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
	/// Method name; unqualified names get the `admin_` prefix.
	#[arg(value_name = "METHOD")]
	pub method: String,

	/// JSON array or object of params.
	#[arg(long, value_name = "JSON")]
	pub params: Option<String>,
}
