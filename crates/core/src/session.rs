//! Pre-run / post-run lifecycle around a single command invocation.
//!
//! Acquisition order is strict: validate config, start the tracer, connect the
//! client, derive the execution context. Teardown cancels the context, closes
//! the client, then closes the tracer, and every step runs even if an earlier
//! one failed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::client::{AdminClient, ClientRegistry, DEFAULT_TRANSPORT};
use crate::config::ConnectionConfig;
use crate::context::{CancelHandle, CancelHook, ExecutionContext};
use crate::error::{Result, RunError, SessionError};
use crate::trace::{NoopTracer, TraceCloser, Tracer, log_errors_when_closing};

/// Resources lent to a command body: a live client and its execution context.
pub struct Session {
	ctx: ExecutionContext,
	client: Box<dyn AdminClient>,
}

impl Session {
	pub fn context(&self) -> &ExecutionContext {
		&self.ctx
	}

	pub fn client(&self) -> &dyn AdminClient {
		self.client.as_ref()
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("ctx", &self.ctx)
			.field("transport", &self.client.transport())
			.field("address", &self.client.address())
			.finish()
	}
}

/// Collaborators shared by every invocation of one process.
#[derive(Clone)]
pub struct Lifecycle {
	service_name: String,
	transport: String,
	tracer: Arc<dyn Tracer>,
	clients: Arc<ClientRegistry>,
	cancel_hook: Option<CancelHook>,
}

impl std::fmt::Debug for Lifecycle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Lifecycle")
			.field("service_name", &self.service_name)
			.field("transport", &self.transport)
			.field("clients", &self.clients)
			.finish_non_exhaustive()
	}
}

impl Lifecycle {
	/// Lifecycle with the default transport, built-in clients and no tracing.
	pub fn new(service_name: impl Into<String>) -> Self {
		Self {
			service_name: service_name.into(),
			transport: DEFAULT_TRANSPORT.to_string(),
			tracer: Arc::new(NoopTracer),
			clients: Arc::new(ClientRegistry::with_defaults()),
			cancel_hook: None,
		}
	}

	pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
		self.tracer = tracer;
		self
	}

	pub fn with_clients(mut self, clients: ClientRegistry) -> Self {
		self.clients = Arc::new(clients);
		self
	}

	pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
		self.transport = transport.into();
		self
	}

	/// Observes the single cancellation of each invocation's context.
	pub fn with_cancel_hook(mut self, hook: CancelHook) -> Self {
		self.cancel_hook = Some(hook);
		self
	}

	pub fn service_name(&self) -> &str {
		&self.service_name
	}

	pub fn transport(&self) -> &str {
		&self.transport
	}

	/// Opens an empty scope for one invocation.
	pub fn scope(&self, config: ConnectionConfig) -> SessionScope {
		SessionScope {
			lifecycle: self.clone(),
			config,
			trace_closer: None,
			session: None,
			cancel: None,
			torn_down: false,
		}
	}

	/// Runs `body` with an acquired [`Session`], releasing it on every path.
	///
	/// `body` does not run if pre-run fails. If `body` panics, teardown still
	/// runs before the panic resumes. An error from `body` and a client-close
	/// error are both kept (see [`RunError::Combined`]).
	pub async fn run<R, E, F>(&self, config: ConnectionConfig, body: F) -> std::result::Result<R, RunError<E>>
	where
		F: AsyncFnOnce(&Session) -> std::result::Result<R, E>,
	{
		let mut scope = self.scope(config);

		if let Err(err) = scope.pre_run().await {
			// A failed pre-run leaves no client behind; this cancels any context and closes the tracer.
			let _ = scope.post_run().await;
			return Err(RunError::Setup(err));
		}

		let outcome = match scope.session() {
			Some(session) => AssertUnwindSafe(body(session)).catch_unwind().await,
			None => {
				let _ = scope.post_run().await;
				return Err(RunError::Setup(SessionError::ClientClosed));
			}
		};

		let teardown = scope.post_run().await.err();

		let result = match outcome {
			Ok(result) => result,
			Err(panic) => std::panic::resume_unwind(panic),
		};

		match (result, teardown) {
			(Ok(value), None) => Ok(value),
			(Ok(_), Some(teardown)) => Err(RunError::Teardown(teardown)),
			(Err(command), None) => Err(RunError::Command(command)),
			(Err(command), Some(teardown)) => Err(RunError::Combined { command, teardown }),
		}
	}
}

/// Session-scoped state for one invocation.
///
/// Replaces process-wide globals: whatever pre-run acquired lives here until
/// post-run releases it.
pub struct SessionScope {
	lifecycle: Lifecycle,
	config: ConnectionConfig,
	trace_closer: Option<Box<dyn TraceCloser>>,
	session: Option<Session>,
	cancel: Option<CancelHandle>,
	torn_down: bool,
}

impl SessionScope {
	pub fn config(&self) -> &ConnectionConfig {
		&self.config
	}

	/// Acquires tracer, client and context, in that order.
	///
	/// Only a configuration error skips the context; a failed connect still
	/// leaves one behind for post-run to cancel.
	pub async fn pre_run(&mut self) -> Result<()> {
		if let Err(err) = self.config.validate() {
			error!(target = "admctl.session", "{err}");
			return Err(err);
		}

		match self.lifecycle.tracer.start(&self.lifecycle.service_name) {
			Ok(closer) => self.trace_closer = Some(closer),
			Err(err) => warn!(target = "admctl.trace", error = %err, "failed to start tracer; continuing untraced"),
		}

		let connected = self.lifecycle.clients.connect(&self.lifecycle.transport, &self.config.server).await;

		// Derived even when connecting failed; post-run cancels it either way.
		let (ctx, cancel) = ExecutionContext::with_timeout(self.config.action_timeout);
		self.cancel = Some(cancel.with_hook(self.lifecycle.cancel_hook.clone()));
		let client = connected?;

		debug!(
			target = "admctl.session",
			server = %self.config.server,
			timeout = ?self.config.action_timeout,
			"session ready"
		);
		self.session = Some(Session { ctx, client });
		Ok(())
	}

	/// The acquired session, once pre-run has succeeded.
	pub fn session(&self) -> Option<&Session> {
		self.session.as_ref()
	}

	/// Releases everything pre-run acquired.
	///
	/// Safe after a failed or skipped pre-run, and a second call is a no-op.
	/// Returns the client-close error; tracer-close errors are only logged.
	pub async fn post_run(&mut self) -> Result<()> {
		if self.torn_down {
			return Ok(());
		}
		self.torn_down = true;

		if let Some(cancel) = self.cancel.take() {
			cancel.cancel();
		}

		let closed = match self.session.take() {
			Some(Session { mut client, .. }) => client.close().await.map_err(|err| {
				warn!(target = "admctl.session", error = %err, "failed to close admin client");
				SessionError::Teardown(Box::new(err))
			}),
			None => Ok(()),
		};

		if let Some(closer) = self.trace_closer.take() {
			log_errors_when_closing(closer);
		}

		closed
	}
}

impl Drop for SessionScope {
	fn drop(&mut self) {
		if self.torn_down {
			return;
		}
		if self.session.is_some() || self.cancel.is_some() || self.trace_closer.is_some() {
			warn!(target = "admctl.session", "session scope dropped without post-run");
		}
		// The context is cancelled by its handle's own drop; the client is dropped unclosed.
		if let Some(closer) = self.trace_closer.take() {
			log_errors_when_closing(closer);
		}
	}
}
