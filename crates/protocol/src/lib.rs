//! RPC surface of the remote admin service.
//!
//! The `#[rpc]` macro generates both halves: `AdminRpcClient` (implemented for any
//! jsonrpsee client such as `HttpClient`) and `AdminRpcServer` (for stub services
//! and embedders).

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use serde::{Deserialize, Serialize};

/// Method namespace shared by every admin RPC.
pub const NAMESPACE: &str = "admin";

/// Identity of the service answering admin RPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
	pub name: String,
	pub version: String,
	/// Seconds since the service started.
	#[serde(default)]
	pub uptime_secs: u64,
}

#[rpc(client, server, namespace = "admin")]
pub trait AdminRpc {
	#[method(name = "ping")]
	async fn ping(&self) -> RpcResult<bool>;

	#[method(name = "serverInfo")]
	async fn server_info(&self) -> RpcResult<ServerInfo>;
}
