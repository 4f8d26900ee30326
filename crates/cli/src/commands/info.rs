use admctl::Session;
use admctl_protocol::ServerInfo;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoData {
	pub server: String,
	#[serde(flatten)]
	pub info: ServerInfo,
}

pub async fn execute(session: &Session) -> Result<InfoData> {
	let client = session.client();
	let info = client.server_info(session.context()).await?;
	Ok(InfoData {
		server: client.address().to_string(),
		info,
	})
}
