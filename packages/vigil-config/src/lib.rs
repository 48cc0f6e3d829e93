mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, InvestigationPolicy, Reference, Remote, Retrieval, Retry, Service, Triage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let instance_url = cfg.remote.instance_url.as_str();

	if !(instance_url.starts_with("http://") || instance_url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "remote.instance_url must be an http or https URL.".to_string(),
		});
	}
	if cfg.remote.api_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "remote.api_version must be non-empty.".to_string(),
		});
	}
	if cfg.remote.api_token.is_none() && cfg.remote.api_token_env.is_none() {
		return Err(Error::Validation {
			message: "One of remote.api_token or remote.api_token_env must be set.".to_string(),
		});
	}
	if cfg.remote.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "remote.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.remote.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("remote.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.retrieval.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retrieval.retry.max_attempts must be at least one.".to_string(),
		});
	}
	if cfg.retrieval.retry.initial_backoff_ms > cfg.retrieval.retry.max_backoff_ms {
		return Err(Error::Validation {
			message: "retrieval.retry.initial_backoff_ms must not exceed retrieval.retry.max_backoff_ms."
				.to_string(),
		});
	}
	if cfg.triage.queue_owner_id.trim().is_empty() {
		return Err(Error::Validation {
			message: "triage.queue_owner_id must be non-empty.".to_string(),
		});
	}
	if cfg.reference.eea_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "reference.eea_path must be non-empty.".to_string(),
		});
	}
	if cfg.cache.field_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "cache.field_ttl_secs must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.remote.api_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false) {
		cfg.remote.api_token = None;
	}
	if cfg.remote.api_token_env.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
		cfg.remote.api_token_env = None;
	}

	let trimmed = cfg.remote.instance_url.trim().trim_end_matches('/').to_string();

	cfg.remote.instance_url = trimmed;
}
