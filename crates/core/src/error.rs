use thiserror::Error;

use crate::context::ContextError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
	/// A required flag is missing or invalid. Fatal, the user has to re-invoke.
	#[error("{0}")]
	Configuration(String),

	#[error("unknown admin client transport: {0}")]
	UnknownTransport(String),

	#[error("failed to connect to {address} over {transport}")]
	Connection {
		transport: String,
		address: String,
		#[source]
		source: anyhow::Error,
	},

	/// The client was used, or closed again, after `close()`.
	#[error("admin client is closed")]
	ClientClosed,

	#[error("invalid RPC params: {0}")]
	InvalidParams(String),

	#[error(transparent)]
	Context(#[from] ContextError),

	#[error(transparent)]
	Rpc(#[from] jsonrpsee::core::ClientError),

	#[error("failed to close admin client")]
	Teardown(#[source] Box<SessionError>),
}

impl SessionError {
	/// Nothing the lifecycle produces is worth retrying on its own; retry
	/// policy belongs to the caller.
	pub fn is_retryable(&self) -> bool {
		false
	}

	pub fn is_configuration(&self) -> bool {
		matches!(self, SessionError::Configuration(_))
	}

	pub fn is_deadline_exceeded(&self) -> bool {
		match self {
			SessionError::Context(err) => matches!(err, ContextError::DeadlineExceeded { .. }),
			SessionError::Teardown(inner) => inner.is_deadline_exceeded(),
			_ => false,
		}
	}
}

/// Outcome of a failed [`Lifecycle::run`](crate::Lifecycle::run).
///
/// The command's own error and the client-close error are never merged into
/// one string: when both happen they travel together in `Combined`.
#[derive(Debug, Error)]
pub enum RunError<E> {
	/// Pre-run failed; the command body never executed.
	#[error(transparent)]
	Setup(SessionError),

	#[error(transparent)]
	Command(E),

	/// The command succeeded but closing the client failed.
	#[error(transparent)]
	Teardown(SessionError),

	#[error("{command} (teardown also failed: {teardown})")]
	Combined { command: E, teardown: SessionError },
}

impl<E> RunError<E> {
	/// The command's error, if the body ran and failed.
	pub fn command_error(&self) -> Option<&E> {
		match self {
			RunError::Command(err) | RunError::Combined { command: err, .. } => Some(err),
			_ => None,
		}
	}

	/// The lifecycle error, from either setup or teardown.
	pub fn session_error(&self) -> Option<&SessionError> {
		match self {
			RunError::Setup(err) | RunError::Teardown(err) | RunError::Combined { teardown: err, .. } => Some(err),
			RunError::Command(_) => None,
		}
	}
}
