//! Deadline-bound, cancellable execution context.
//!
//! One context is derived per invocation. The [`ExecutionContext`] half is a
//! cheap read-only view that remote calls race against; the [`CancelHandle`]
//! half stays with the lifecycle and fires exactly once.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Observer invoked when a context is cancelled.
pub type CancelHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
	#[error("context deadline exceeded after {timeout:?}")]
	DeadlineExceeded { timeout: Duration },

	#[error("context canceled")]
	Canceled,
}

#[derive(Clone)]
pub struct ExecutionContext {
	deadline: Instant,
	timeout: Duration,
	cancelled: watch::Receiver<bool>,
}

impl fmt::Debug for ExecutionContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExecutionContext")
			.field("timeout", &self.timeout)
			.field("remaining", &self.remaining())
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

impl ExecutionContext {
	/// Derives a context whose deadline is `now + timeout`.
	pub fn with_timeout(timeout: Duration) -> (Self, CancelHandle) {
		let (tx, rx) = watch::channel(false);
		let deadline = Instant::now().checked_add(timeout).unwrap_or_else(far_future);
		let ctx = Self {
			deadline,
			timeout,
			cancelled: rx,
		};
		(ctx, CancelHandle { tx: Some(tx), hook: None })
	}

	pub fn deadline(&self) -> Instant {
		self.deadline
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Time left before the deadline, zero once it has passed.
	pub fn remaining(&self) -> Duration {
		self.deadline.saturating_duration_since(Instant::now())
	}

	pub fn is_cancelled(&self) -> bool {
		*self.cancelled.borrow()
	}

	/// Why the context is done, or `None` while it is still live.
	pub fn err(&self) -> Option<ContextError> {
		if self.is_cancelled() {
			Some(ContextError::Canceled)
		} else if Instant::now() >= self.deadline {
			Some(self.deadline_exceeded())
		} else {
			None
		}
	}

	/// Resolves once the context is cancelled or its deadline passes.
	pub async fn done(&self) -> ContextError {
		let mut cancelled = self.cancelled.clone();
		tokio::select! {
			biased;
			// A dropped sender without a send still means nobody will run this context.
			_ = cancelled.wait_for(|c| *c) => ContextError::Canceled,
			_ = tokio::time::sleep_until(self.deadline) => self.deadline_exceeded(),
		}
	}

	/// Runs `fut` until it completes or the context is done, whichever is first.
	pub async fn run<F>(&self, fut: F) -> Result<F::Output, ContextError>
	where
		F: Future,
	{
		if let Some(err) = self.err() {
			return Err(err);
		}
		tokio::select! {
			biased;
			err = self.done() => Err(err),
			out = fut => Ok(out),
		}
	}

	fn deadline_exceeded(&self) -> ContextError {
		ContextError::DeadlineExceeded { timeout: self.timeout }
	}
}

// Roughly 30 years; what tokio itself uses for "never".
fn far_future() -> Instant {
	Instant::now() + Duration::from_secs(86400 * 365 * 30)
}

/// The cancel side of an [`ExecutionContext`].
///
/// Cancelling consumes the handle, and dropping an unfired handle cancels,
/// so the signal fires exactly once on every path.
pub struct CancelHandle {
	tx: Option<watch::Sender<bool>>,
	hook: Option<CancelHook>,
}

impl fmt::Debug for CancelHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CancelHandle")
			.field("fired", &self.tx.is_none())
			.field("hook", &self.hook.is_some())
			.finish()
	}
}

impl CancelHandle {
	pub fn with_hook(mut self, hook: Option<CancelHook>) -> Self {
		self.hook = hook;
		self
	}

	pub fn cancel(mut self) {
		self.fire();
	}

	fn fire(&mut self) {
		if let Some(tx) = self.tx.take() {
			tx.send_replace(true);
			if let Some(hook) = &self.hook {
				hook();
			}
		}
	}
}

impl Drop for CancelHandle {
	fn drop(&mut self) {
		self.fire();
	}
}
