//! Session lifecycle for the admctl administration client.
//!
//! Every subcommand runs inside a [`Lifecycle`]: the connection config is
//! validated, a [`Tracer`] is started, an [`AdminClient`] is connected and an
//! [`ExecutionContext`] with a deadline is derived. Afterwards all of it is torn
//! down in a fixed order, whatever the command returned.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod jsonrpc;
pub mod session;
pub mod trace;

pub use client::{AdminClient, ClientFactory, ClientRegistry, DEFAULT_TRANSPORT};
pub use config::{ConnectionConfig, DEFAULT_ACTION_TIMEOUT, parse_duration};
pub use context::{CancelHandle, CancelHook, ContextError, ExecutionContext};
pub use error::{Result, RunError, SessionError};
pub use session::{Lifecycle, Session, SessionScope};
pub use trace::{FileTracer, LogTracer, NoopTracer, TraceCloser, TraceError, Tracer, log_errors_when_closing};
