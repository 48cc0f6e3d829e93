use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub remote: Remote,
	pub retrieval: Retrieval,
	pub triage: Triage,
	pub reference: Reference,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
	/// Base URL of the record service instance, without a trailing slash.
	pub instance_url: String,
	/// REST API version segment, e.g. "v58.0".
	pub api_version: String,
	/// Optional. Inline session token; takes precedence over `api_token_env`.
	pub api_token: Option<String>,
	/// Optional. Name of the environment variable holding the session token.
	pub api_token_env: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	/// Upper bound on in-flight page or per-code requests for one retrieval.
	pub max_concurrency: usize,
	pub retry: Retry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retry {
	/// Total attempts per request, including the first one.
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Triage {
	/// Owner identifier of the shared investigation queue.
	pub queue_owner_id: String,
	#[serde(default)]
	pub investigation_policy: InvestigationPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationPolicy {
	/// Take the first open investigation and log when there are several.
	#[default]
	First,
	/// Fail the record batch when a complaint has more than one open investigation.
	Strict,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
	pub eea_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	#[serde(default = "default_field_ttl_secs")]
	pub field_ttl_secs: u64,
}
impl Default for Cache {
	fn default() -> Self {
		Self { field_ttl_secs: default_field_ttl_secs() }
	}
}

fn default_field_ttl_secs() -> u64 {
	3_600
}
