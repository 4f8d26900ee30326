//! Raw RPC invocation.

use admctl::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cli::CallArgs;
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
	pub method: String,
	pub result: Value,
}

/// Parses `--params`: absent means no params, otherwise a JSON array or object.
pub fn parse_params(raw: Option<&str>) -> Result<Value> {
	let Some(raw) = raw else {
		return Ok(Value::Null);
	};
	match serde_json::from_str(raw)? {
		value @ (Value::Array(_) | Value::Object(_)) => Ok(value),
		other => Err(CliError::InvalidInput(format!("params must be a JSON array or object, got {other}"))),
	}
}

pub async fn execute(session: &Session, args: &CallArgs) -> Result<CallData> {
	let params = parse_params(args.params.as_deref())?;
	debug!(target = "admctl.cli", method = %args.method, "calling");
	let result = session.client().call(session.context(), &args.method, params).await?;
	Ok(CallData {
		method: args.method.clone(),
		result,
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn missing_params_are_null() {
		assert_eq!(parse_params(None).unwrap(), Value::Null);
	}

	#[test]
	fn array_and_object_params_pass_through() {
		assert_eq!(parse_params(Some("[1, \"a\"]")).unwrap(), json!([1, "a"]));
		assert_eq!(parse_params(Some("{\"k\": true}")).unwrap(), json!({ "k": true }));
	}

	#[test]
	fn scalar_params_are_rejected() {
		let err = parse_params(Some("42")).unwrap_err();
		assert!(matches!(err, CliError::InvalidInput(_)));
	}

	#[test]
	fn malformed_json_is_a_json_error() {
		let err = parse_params(Some("[1,")).unwrap_err();
		assert!(matches!(err, CliError::Json(_)));
	}
}
