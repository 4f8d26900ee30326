//! Diagnostic tracing started once per invocation.
//!
//! A [`Tracer`] hands out a [`TraceCloser`] that must be closed when the
//! invocation ends. Close failures are diagnostics about diagnostics: use
//! [`log_errors_when_closing`] so they are logged and never become the
//! command's result.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;
use tracing::{Span, info, info_span, warn};

#[derive(Debug, Error)]
pub enum TraceError {
	#[error("failed to open trace output {path}: {source}")]
	Open {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write trace output {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

pub trait Tracer: Send + Sync {
	/// Starts tracing for `service_name`.
	fn start(&self, service_name: &str) -> Result<Box<dyn TraceCloser>, TraceError>;
}

pub trait TraceCloser: Send {
	/// Flushes and releases the trace. Consumes the handle so it closes once.
	fn close(self: Box<Self>) -> Result<(), TraceError>;
}

/// Closes `closer`, downgrading any failure to a warning.
pub fn log_errors_when_closing(closer: Box<dyn TraceCloser>) {
	if let Err(err) = closer.close() {
		warn!(target = "admctl.trace", error = %err, "error closing tracer");
	}
}

/// Tracing disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
	fn start(&self, _service_name: &str) -> Result<Box<dyn TraceCloser>, TraceError> {
		Ok(Box::new(NoopCloser))
	}
}

struct NoopCloser;

impl TraceCloser for NoopCloser {
	fn close(self: Box<Self>) -> Result<(), TraceError> {
		Ok(())
	}
}

/// Emits the invocation as a span through the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
	fn start(&self, service_name: &str) -> Result<Box<dyn TraceCloser>, TraceError> {
		let span = info_span!(target: "admctl.trace", "invocation", service = %service_name);
		span.in_scope(|| info!(target = "admctl.trace", "trace started"));
		Ok(Box::new(LogCloser {
			span,
			started: Instant::now(),
		}))
	}
}

struct LogCloser {
	span: Span,
	started: Instant,
}

impl TraceCloser for LogCloser {
	fn close(self: Box<Self>) -> Result<(), TraceError> {
		let elapsed_ms = self.started.elapsed().as_millis() as u64;
		self.span.in_scope(|| info!(target = "admctl.trace", elapsed_ms, "trace finished"));
		Ok(())
	}
}

/// Appends one JSON record per invocation to a file.
///
/// The file is opened at start so an unusable path shows up before the
/// command runs; the record itself is written and flushed at close.
#[derive(Debug, Clone)]
pub struct FileTracer {
	path: PathBuf,
}

impl FileTracer {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Tracer for FileTracer {
	fn start(&self, service_name: &str) -> Result<Box<dyn TraceCloser>, TraceError> {
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&self.path)
			.map_err(|source| TraceError::Open {
				path: self.path.clone(),
				source,
			})?;
		Ok(Box::new(FileCloser {
			file,
			path: self.path.clone(),
			service: service_name.to_string(),
			started_at_ms: unix_millis(),
			started: Instant::now(),
		}))
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpanRecord<'a> {
	service: &'a str,
	started_at_ms: u64,
	duration_ms: u64,
}

struct FileCloser {
	file: File,
	path: PathBuf,
	service: String,
	started_at_ms: u64,
	started: Instant,
}

impl TraceCloser for FileCloser {
	fn close(mut self: Box<Self>) -> Result<(), TraceError> {
		let record = SpanRecord {
			service: &self.service,
			started_at_ms: self.started_at_ms,
			duration_ms: self.started.elapsed().as_millis() as u64,
		};
		let mut line = serde_json::to_vec(&record)?;
		line.push(b'\n');
		let path = self.path.clone();
		self.file
			.write_all(&line)
			.and_then(|()| self.file.flush())
			.map_err(|source| TraceError::Write { path, source })
	}
}

fn unix_millis() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
