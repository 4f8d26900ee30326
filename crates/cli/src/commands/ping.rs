//! Ping command.

use std::time::Instant;

use admctl::Session;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingData {
	pub server: String,
	pub pong: bool,
	pub latency_ms: u64,
}

pub async fn execute(session: &Session) -> Result<PingData> {
	let client = session.client();
	let sent = Instant::now();
	let pong = client.ping(session.context()).await?;
	let latency_ms = sent.elapsed().as_millis() as u64;

	info!(target = "admctl.cli", server = client.address(), pong, latency_ms, "ping");

	Ok(PingData {
		server: client.address().to_string(),
		pong,
		latency_ms,
	})
}
