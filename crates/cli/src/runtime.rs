//! Builds the per-process lifecycle and connection config from parsed flags.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use admctl::{CancelHook, ConnectionConfig, FileTracer, Lifecycle, LogTracer, NoopTracer, Tracer};
use tracing::debug;

use crate::cli::{Cli, TracerKind};

/// Service name reported to the tracer.
pub const SERVICE_NAME: &str = "admctl";

/// Everything needed to run one invocation, detached from clap types.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
	pub server: String,
	pub action_timeout: Duration,
	pub tracer: TracerKind,
	pub tracing_output: Option<PathBuf>,
}

impl From<&Cli> for RuntimeConfig {
	fn from(cli: &Cli) -> Self {
		Self {
			server: cli.server.clone(),
			action_timeout: cli.action_timeout,
			tracer: cli.tracing.tracer,
			tracing_output: cli.tracing.tracing_output.clone(),
		}
	}
}

impl RuntimeConfig {
	pub fn connection(&self) -> ConnectionConfig {
		ConnectionConfig::new(self.server.clone()).with_action_timeout(self.action_timeout)
	}

	fn tracer(&self) -> Arc<dyn Tracer> {
		match (self.tracer, &self.tracing_output) {
			(TracerKind::Noop, _) => Arc::new(NoopTracer),
			(TracerKind::Log, _) => Arc::new(LogTracer),
			(TracerKind::File, Some(path)) => Arc::new(FileTracer::new(path)),
			// clap requires --tracing-output for the file tracer; fall back to the log.
			(TracerKind::File, None) => Arc::new(LogTracer),
		}
	}
}

/// Builds the lifecycle shared by the invocation.
pub fn build_lifecycle(config: &RuntimeConfig) -> Lifecycle {
	let on_cancel: CancelHook = Arc::new(|| debug!(target = "admctl.session", "command context cancelled"));
	Lifecycle::new(SERVICE_NAME).with_tracer(config.tracer()).with_cancel_hook(on_cancel)
}

#[cfg(test)]
mod tests {
	use clap::Parser;

	use super::*;

	#[test]
	fn connection_config_carries_flags() {
		let cli = Cli::try_parse_from(["admctl", "--server", "localhost:15999", "--action_timeout", "2s", "ping"]).unwrap();
		let config = RuntimeConfig::from(&cli);
		let connection = config.connection();
		assert_eq!(connection.server, "localhost:15999");
		assert_eq!(connection.action_timeout, Duration::from_secs(2));
	}

	#[test]
	fn lifecycle_uses_service_name_and_default_transport() {
		let cli = Cli::try_parse_from(["admctl", "--tracer", "log", "ping"]).unwrap();
		let lifecycle = build_lifecycle(&RuntimeConfig::from(&cli));
		assert_eq!(lifecycle.service_name(), SERVICE_NAME);
		assert_eq!(lifecycle.transport(), admctl::DEFAULT_TRANSPORT);
	}
}
