//! Connection configuration read from already-parsed flags.

use std::time::Duration;

use crate::error::{Result, SessionError};

/// Default upper bound on a command's execution context.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(60 * 60);

const MISSING_SERVER: &str = "please specify -server <host:port> (--server) to specify the admin server to connect to";

/// Immutable per-invocation connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
	/// Address of the admin server, `host:port` or a full URL.
	pub server: String,
	/// Lifetime of the execution context handed to the command.
	pub action_timeout: Duration,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			server: String::new(),
			action_timeout: DEFAULT_ACTION_TIMEOUT,
		}
	}
}

impl ConnectionConfig {
	pub fn new(server: impl Into<String>) -> Self {
		Self {
			server: server.into(),
			..Default::default()
		}
	}

	pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
		self.action_timeout = timeout;
		self
	}

	/// Checks the config before any resource is acquired.
	pub fn validate(&self) -> Result<()> {
		if self.server.trim().is_empty() {
			return Err(SessionError::Configuration(MISSING_SERVER.to_string()));
		}
		Ok(())
	}
}

/// Parses a duration written the way operators write them on the command
/// line: `300ms`, `30s`, `1m30s`, `1.5h`, or a bare `0`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
	let s = input.trim();
	if s.is_empty() {
		return Err("empty duration".to_string());
	}
	if s == "0" {
		return Ok(Duration::ZERO);
	}
	if s.starts_with('-') {
		return Err(format!("negative duration: {input}"));
	}
	let s = s.strip_prefix('+').unwrap_or(s);

	let mut total = 0f64;
	let mut rest = s;
	while !rest.is_empty() {
		let num_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(rest.len());
		if num_len == 0 {
			return Err(format!("invalid duration: {input}"));
		}
		let value: f64 = rest[..num_len].parse().map_err(|_| format!("invalid duration: {input}"))?;
		rest = &rest[num_len..];

		let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
		let nanos_per_unit = match &rest[..unit_len] {
			"ns" => 1f64,
			"us" | "µs" => 1e3,
			"ms" => 1e6,
			"s" => 1e9,
			"m" => 60e9,
			"h" => 3600e9,
			"" => return Err(format!("missing unit in duration: {input}")),
			unit => return Err(format!("unknown unit {unit:?} in duration: {input}")),
		};
		rest = &rest[unit_len..];
		total += value * nanos_per_unit;
	}

	if !total.is_finite() || total > u64::MAX as f64 {
		return Err(format!("duration out of range: {input}"));
	}
	Ok(Duration::from_nanos(total.round() as u64))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_server_is_a_configuration_error() {
		let err = ConnectionConfig::default().validate().unwrap_err();
		assert!(err.is_configuration());
		assert!(err.to_string().contains("please specify -server"));
	}

	#[test]
	fn whitespace_server_is_rejected() {
		assert!(ConnectionConfig::new("   ").validate().is_err());
	}

	#[test]
	fn server_passes_validation() {
		let config = ConnectionConfig::new("localhost:15999");
		config.validate().unwrap();
		assert_eq!(config.action_timeout, DEFAULT_ACTION_TIMEOUT);
	}

	#[test]
	fn default_timeout_is_one_hour() {
		assert_eq!(DEFAULT_ACTION_TIMEOUT, Duration::from_secs(3600));
	}

	#[test]
	fn parses_single_units() {
		assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
		assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
		assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
		assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
		assert_eq!(parse_duration("15us").unwrap(), Duration::from_micros(15));
		assert_eq!(parse_duration("15µs").unwrap(), Duration::from_micros(15));
		assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
	}

	#[test]
	fn parses_compound_and_fractional() {
		assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
		assert_eq!(parse_duration("1h2m3s").unwrap(), Duration::from_secs(3723));
		assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
		assert_eq!(parse_duration("0.5s").unwrap(), Duration::from_millis(500));
	}

	#[test]
	fn zero_needs_no_unit() {
		assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
		assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
	}

	#[test]
	fn rejects_malformed_durations() {
		for bad in ["", "10", "-1s", "1x", "s", "1..5s", "h1"] {
			assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
		}
	}
}
