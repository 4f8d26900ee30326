use admctl::{ContextError, RunError, SessionError};
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Failure from the session lifecycle or the remote client.
	#[error(transparent)]
	Session(#[from] SessionError),

	#[error("{command} (teardown also failed: {teardown})")]
	Combined {
		command: Box<CliError>,
		teardown: SessionError,
	},

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl From<RunError<CliError>> for CliError {
	fn from(err: RunError<CliError>) -> Self {
		match err {
			RunError::Setup(err) | RunError::Teardown(err) => CliError::Session(err),
			RunError::Command(err) => err,
			RunError::Combined { command, teardown } => CliError::Combined {
				command: Box::new(command),
				teardown,
			},
		}
	}
}

fn session_code(err: &SessionError) -> ErrorCode {
	match err {
		SessionError::Configuration(_) => ErrorCode::ConfigurationError,
		SessionError::UnknownTransport(_) | SessionError::Connection { .. } => ErrorCode::ConnectionError,
		SessionError::ClientClosed => ErrorCode::InternalError,
		SessionError::InvalidParams(_) => ErrorCode::InvalidInput,
		SessionError::Context(ContextError::DeadlineExceeded { .. }) => ErrorCode::Timeout,
		SessionError::Context(ContextError::Canceled) => ErrorCode::Canceled,
		SessionError::Rpc(_) => ErrorCode::RpcError,
		SessionError::Teardown(_) => ErrorCode::TeardownError,
	}
}

/// Full `source()` chain, so collaborator detail reaches the user unmodified.
fn chain_message(err: &(dyn std::error::Error + 'static)) -> String {
	let mut message = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		let cause_msg = cause.to_string();
		if !message.contains(&cause_msg) {
			message.push_str(": ");
			message.push_str(&cause_msg);
		}
		source = cause.source();
	}
	message
}

impl CliError {
	pub fn is_configuration(&self) -> bool {
		matches!(self, CliError::Session(err) if err.is_configuration())
	}

	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Session(err) => (session_code(err), None),
			CliError::Combined { command, teardown } => {
				let primary = command.to_command_error();
				let details = serde_json::json!({
					"teardown": { "code": ErrorCode::TeardownError, "message": chain_message(teardown) },
				});
				(primary.code, Some(details))
			}
			CliError::InvalidInput(_) => (ErrorCode::InvalidInput, None),
			CliError::Json(_) => (ErrorCode::InvalidInput, None),
		};

		CommandError {
			code,
			message: chain_message(self),
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn configuration_error_maps_to_its_code() {
		let err = CliError::from(SessionError::Configuration("please specify -server".into()));
		assert!(err.is_configuration());
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::ConfigurationError);
		assert_eq!(cmd.message, "please specify -server");
	}

	#[test]
	fn deadline_maps_to_timeout() {
		let err = CliError::from(SessionError::Context(ContextError::DeadlineExceeded {
			timeout: Duration::from_secs(1),
		}));
		assert_eq!(err.to_command_error().code, ErrorCode::Timeout);
	}

	#[test]
	fn teardown_message_includes_cause() {
		let err = CliError::from(RunError::<CliError>::Teardown(SessionError::Teardown(Box::new(
			SessionError::ClientClosed,
		))));
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::TeardownError);
		assert_eq!(cmd.message, "failed to close admin client: admin client is closed");
	}

	#[test]
	fn combined_keeps_command_code_and_teardown_details() {
		let err = CliError::from(RunError::Combined {
			command: CliError::InvalidInput("params must be JSON".into()),
			teardown: SessionError::Teardown(Box::new(SessionError::ClientClosed)),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidInput);
		assert!(cmd.message.contains("params must be JSON"));
		assert!(cmd.message.contains("teardown also failed"));
		let details = cmd.details.unwrap();
		assert_eq!(details["teardown"]["code"], "TEARDOWN_ERROR");
	}

	#[test]
	fn connection_error_includes_source() {
		let err = CliError::from(SessionError::Connection {
			transport: "jsonrpc".into(),
			address: "bad host".into(),
			source: anyhow::anyhow!("invalid uri character"),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::ConnectionError);
		assert!(cmd.message.contains("invalid uri character"), "{}", cmd.message);
	}
}
