//! Remote admin client abstraction and the transport registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use admctl_protocol::ServerInfo;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{Result, SessionError};
use crate::jsonrpc::JsonRpcClientFactory;

/// Transport used when none is configured.
pub const DEFAULT_TRANSPORT: &str = "jsonrpc";

/// Connection to the remote admin service.
///
/// Every call is bounded by the [`ExecutionContext`] it is given.
#[async_trait]
pub trait AdminClient: Send + Sync {
	fn transport(&self) -> &str;

	fn address(&self) -> &str;

	async fn ping(&self, ctx: &ExecutionContext) -> Result<bool>;

	async fn server_info(&self, ctx: &ExecutionContext) -> Result<ServerInfo>;

	/// Invokes `method` with positional (array) or named (object) params.
	async fn call(&self, ctx: &ExecutionContext, method: &str, params: Value) -> Result<Value>;

	/// Releases the connection. Later calls fail with [`SessionError::ClientClosed`].
	async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait ClientFactory: Send + Sync {
	async fn connect(&self, address: &str) -> Result<Box<dyn AdminClient>>;
}

/// Client factories keyed by transport kind.
#[derive(Clone, Default)]
pub struct ClientRegistry {
	factories: BTreeMap<String, Arc<dyn ClientFactory>>,
}

impl std::fmt::Debug for ClientRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientRegistry").field("transports", &self.transports().collect::<Vec<_>>()).finish()
	}
}

impl ClientRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry with every built-in transport.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(DEFAULT_TRANSPORT, JsonRpcClientFactory::default());
		registry
	}

	/// Registers `factory` for `kind`, replacing any earlier registration.
	pub fn register(&mut self, kind: impl Into<String>, factory: impl ClientFactory + 'static) {
		self.factories.insert(kind.into(), Arc::new(factory));
	}

	pub fn transports(&self) -> impl Iterator<Item = &str> {
		self.factories.keys().map(String::as_str)
	}

	pub async fn connect(&self, kind: &str, address: &str) -> Result<Box<dyn AdminClient>> {
		let factory = self.factories.get(kind).ok_or_else(|| SessionError::UnknownTransport(kind.to_string()))?;
		debug!(target = "admctl.client", transport = kind, %address, "connecting admin client");
		factory.connect(address).await.map_err(|err| match err {
			SessionError::Connection { .. } => err,
			other => SessionError::Connection {
				transport: kind.to_string(),
				address: address.to_string(),
				source: other.into(),
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Refusing;

	#[async_trait]
	impl ClientFactory for Refusing {
		async fn connect(&self, _address: &str) -> Result<Box<dyn AdminClient>> {
			Err(SessionError::InvalidParams("refused".into()))
		}
	}

	#[test]
	fn defaults_register_jsonrpc() {
		let registry = ClientRegistry::with_defaults();
		assert_eq!(registry.transports().collect::<Vec<_>>(), vec![DEFAULT_TRANSPORT]);
	}

	#[tokio::test]
	async fn unknown_transport_is_rejected() {
		let registry = ClientRegistry::with_defaults();
		let err = registry.connect("carrier-pigeon", "localhost:1").await.err().unwrap();
		assert!(matches!(err, SessionError::UnknownTransport(kind) if kind == "carrier-pigeon"));
	}

	#[tokio::test]
	async fn factory_errors_become_connection_errors() {
		let mut registry = ClientRegistry::new();
		registry.register("refusing", Refusing);
		let err = registry.connect("refusing", "localhost:1").await.err().unwrap();
		match err {
			SessionError::Connection { transport, address, .. } => {
				assert_eq!(transport, "refusing");
				assert_eq!(address, "localhost:1");
			}
			other => panic!("expected connection error, got {other:?}"),
		}
	}
}
