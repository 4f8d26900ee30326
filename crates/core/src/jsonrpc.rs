//! JSON-RPC over HTTP transport, the default admin client.

use admctl_protocol::{AdminRpcClient, NAMESPACE, ServerInfo};
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::{ArrayParams, ObjectParams};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::Value;
use tracing::debug;

use crate::client::{AdminClient, ClientFactory, DEFAULT_TRANSPORT};
use crate::context::ExecutionContext;
use crate::error::{Result, SessionError};

/// Builds [`JsonRpcClient`]s.
///
/// Building does no network I/O; the first call dials the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcClientFactory;

#[async_trait]
impl ClientFactory for JsonRpcClientFactory {
	async fn connect(&self, address: &str) -> Result<Box<dyn AdminClient>> {
		Ok(Box::new(JsonRpcClient::new(address)?))
	}
}

pub struct JsonRpcClient {
	address: String,
	endpoint: String,
	inner: Option<HttpClient>,
}

impl std::fmt::Debug for JsonRpcClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JsonRpcClient")
			.field("endpoint", &self.endpoint)
			.field("closed", &self.inner.is_none())
			.finish()
	}
}

impl JsonRpcClient {
	pub fn new(address: &str) -> Result<Self> {
		let endpoint = endpoint_url(address);
		let inner = HttpClientBuilder::default().build(&endpoint).map_err(|err| SessionError::Connection {
			transport: DEFAULT_TRANSPORT.to_string(),
			address: address.to_string(),
			source: err.into(),
		})?;
		Ok(Self {
			address: address.to_string(),
			endpoint,
			inner: Some(inner),
		})
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	fn client(&self) -> Result<&HttpClient> {
		self.inner.as_ref().ok_or(SessionError::ClientClosed)
	}
}

#[async_trait]
impl AdminClient for JsonRpcClient {
	fn transport(&self) -> &str {
		DEFAULT_TRANSPORT
	}

	fn address(&self) -> &str {
		&self.address
	}

	async fn ping(&self, ctx: &ExecutionContext) -> Result<bool> {
		let client = self.client()?;
		Ok(ctx.run(client.ping()).await??)
	}

	async fn server_info(&self, ctx: &ExecutionContext) -> Result<ServerInfo> {
		let client = self.client()?;
		Ok(ctx.run(client.server_info()).await??)
	}

	async fn call(&self, ctx: &ExecutionContext, method: &str, params: Value) -> Result<Value> {
		let client = self.client()?;
		let method = qualify_method(method);
		debug!(target = "admctl.client", %method, "rpc call");
		let response = match params {
			Value::Null => ctx.run(client.request::<Value, _>(&method, ArrayParams::new())).await?,
			Value::Array(items) => {
				let mut array = ArrayParams::new();
				for item in items {
					array.insert(item).map_err(|err| SessionError::InvalidParams(err.to_string()))?;
				}
				ctx.run(client.request::<Value, _>(&method, array)).await?
			}
			Value::Object(fields) => {
				let mut object = ObjectParams::new();
				for (name, value) in fields {
					object.insert(&name, value).map_err(|err| SessionError::InvalidParams(err.to_string()))?;
				}
				ctx.run(client.request::<Value, _>(&method, object)).await?
			}
			other => {
				return Err(SessionError::InvalidParams(format!("params must be an array or an object, got {other}")));
			}
		};
		Ok(response?)
	}

	async fn close(&mut self) -> Result<()> {
		match self.inner.take() {
			Some(client) => {
				drop(client);
				debug!(target = "admctl.client", endpoint = %self.endpoint, "admin client closed");
				Ok(())
			}
			None => Err(SessionError::ClientClosed),
		}
	}
}

/// Turns a bare `host:port` into an HTTP URL; full URLs pass through.
pub fn endpoint_url(address: &str) -> String {
	let address = address.trim();
	if address.contains("://") {
		address.to_string()
	} else {
		format!("http://{address}")
	}
}

/// Prefixes unqualified method names with the admin namespace.
fn qualify_method(method: &str) -> String {
	if method.contains('_') {
		method.to_string()
	} else {
		format!("{NAMESPACE}_{method}")
	}
}
