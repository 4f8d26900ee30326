#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admctl::{AdminClient, ClientFactory, ExecutionContext, Result, SessionError, TraceCloser, TraceError, Tracer};
use admctl_protocol::{AdminRpcServer, ServerInfo};
use async_trait::async_trait;
use jsonrpsee::core::RpcResult;
use jsonrpsee::server::{Server, ServerHandle};
use serde_json::Value;
use tracing::subscriber::DefaultGuard;

/// Shared ordered record of lifecycle events.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<&'static str>>>);

impl Events {
	pub fn push(&self, event: &'static str) {
		self.0.lock().unwrap().push(event);
	}

	pub fn snapshot(&self) -> Vec<&'static str> {
		self.0.lock().unwrap().clone()
	}

	pub fn count(&self, event: &str) -> usize {
		self.0.lock().unwrap().iter().filter(|e| **e == event).count()
	}
}

pub struct FakeClient {
	events: Events,
	address: String,
	close_error: bool,
	closed: bool,
}

#[async_trait]
impl AdminClient for FakeClient {
	fn transport(&self) -> &str {
		"fake"
	}

	fn address(&self) -> &str {
		&self.address
	}

	async fn ping(&self, ctx: &ExecutionContext) -> Result<bool> {
		if self.closed {
			return Err(SessionError::ClientClosed);
		}
		self.events.push("client.ping");
		Ok(ctx.run(async { true }).await?)
	}

	async fn server_info(&self, _ctx: &ExecutionContext) -> Result<ServerInfo> {
		Ok(ServerInfo {
			name: "fake".into(),
			version: "0.0.0".into(),
			uptime_secs: 0,
		})
	}

	async fn call(&self, _ctx: &ExecutionContext, _method: &str, params: Value) -> Result<Value> {
		Ok(params)
	}

	async fn close(&mut self) -> Result<()> {
		if self.closed {
			return Err(SessionError::ClientClosed);
		}
		self.closed = true;
		self.events.push("client.close");
		if self.close_error {
			return Err(SessionError::InvalidParams("connection reset during close".into()));
		}
		Ok(())
	}
}

#[derive(Clone)]
pub struct FakeFactory {
	pub events: Events,
	pub close_error: bool,
	pub refuse: bool,
}

impl FakeFactory {
	pub fn new(events: &Events) -> Self {
		Self {
			events: events.clone(),
			close_error: false,
			refuse: false,
		}
	}
}

#[async_trait]
impl ClientFactory for FakeFactory {
	async fn connect(&self, address: &str) -> Result<Box<dyn AdminClient>> {
		self.events.push("client.connect");
		if self.refuse {
			return Err(SessionError::InvalidParams(format!("refused {address}")));
		}
		Ok(Box::new(FakeClient {
			events: self.events.clone(),
			address: address.to_string(),
			close_error: self.close_error,
			closed: false,
		}))
	}
}

pub struct FakeTracer {
	pub events: Events,
	pub close_error: bool,
}

impl Tracer for FakeTracer {
	fn start(&self, _service_name: &str) -> std::result::Result<Box<dyn TraceCloser>, TraceError> {
		self.events.push("tracer.start");
		Ok(Box::new(FakeCloser {
			events: self.events.clone(),
			close_error: self.close_error,
		}))
	}
}

struct FakeCloser {
	events: Events,
	close_error: bool,
}

impl TraceCloser for FakeCloser {
	fn close(self: Box<Self>) -> std::result::Result<(), TraceError> {
		self.events.push("tracer.close");
		if self.close_error {
			return Err(TraceError::Write {
				path: "/var/trace/admctl.jsonl".into(),
				source: io::Error::other("collector unreachable"),
			});
		}
		Ok(())
	}
}

pub fn counting_hook(events: &Events) -> (admctl::CancelHook, Arc<AtomicUsize>) {
	let count = Arc::new(AtomicUsize::new(0));
	let counter = count.clone();
	let events = events.clone();
	let hook: admctl::CancelHook = Arc::new(move || {
		counter.fetch_add(1, Ordering::SeqCst);
		events.push("ctx.cancel");
	});
	(hook, count)
}

/// Log output captured from a thread-local subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
	pub fn contents(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
	}
}

impl io::Write for CapturedLogs {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

/// Installs a capturing subscriber for the current thread.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
	let logs = CapturedLogs::default();
	let writer = logs.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_writer(move || writer.clone())
		.with_ansi(false)
		.with_max_level(tracing::Level::DEBUG)
		.finish();
	let guard = tracing::subscriber::set_default(subscriber);
	(logs, guard)
}

struct StubService {
	ping_delay: Duration,
}

#[async_trait]
impl AdminRpcServer for StubService {
	async fn ping(&self) -> RpcResult<bool> {
		tokio::time::sleep(self.ping_delay).await;
		Ok(true)
	}

	async fn server_info(&self) -> RpcResult<ServerInfo> {
		Ok(ServerInfo {
			name: "stub-admind".into(),
			version: "9.9.9".into(),
			uptime_secs: 12,
		})
	}
}

/// Starts a stub admin service on an ephemeral port; returns `host:port`.
pub async fn start_stub(ping_delay: Duration) -> (String, ServerHandle) {
	let server = Server::builder().build("127.0.0.1:0").await.unwrap();
	let addr = server.local_addr().unwrap();
	let handle = server.start(StubService { ping_delay }.into_rpc());
	(addr.to_string(), handle)
}
