use std::env;

use crate::{BoxFuture, Error, Result};

/// Source of the bearer session token sent with every query.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	fn token(&self) -> BoxFuture<'_, Result<String>>;
}

/// Token resolved once from configuration or the environment.
pub struct StaticToken {
	token: String,
}
impl StaticToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self { token: token.into() }
	}

	pub fn from_config(cfg: &vigil_config::Remote) -> Result<Self> {
		if let Some(token) = cfg.api_token.as_deref() {
			return Ok(Self::new(token));
		}

		let Some(name) = cfg.api_token_env.as_deref() else {
			return Err(Error::InvalidConfig {
				message: "No session token source is configured.".to_string(),
			});
		};
		let token = env::var(name).map_err(|_| Error::InvalidConfig {
			message: format!("Environment variable {name} is not set."),
		})?;

		if token.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: format!("Environment variable {name} is empty."),
			});
		}

		Ok(Self::new(token))
	}
}
impl CredentialProvider for StaticToken {
	fn token(&self) -> BoxFuture<'_, Result<String>> {
		let token = self.token.clone();

		Box::pin(async move { Ok(token) })
	}
}
