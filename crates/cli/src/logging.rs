use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directive for a `-v` count; `RUST_LOG` overrides it.
pub fn default_filter(verbosity: u8) -> &'static str {
	// 0 = warnings and errors only (config errors, tracer close failures)
	// 1 (-v) = info for admctl, warn for the RPC client
	// 2+ (-vv) = debug everywhere
	match verbosity {
		0 => "warn",
		1 => "info,jsonrpsee=warn,hyper=warn",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
