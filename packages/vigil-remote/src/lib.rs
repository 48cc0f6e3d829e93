pub mod client;
pub mod credentials;
pub mod retry;

mod error;

pub use client::{HttpQueryClient, RawPage};
pub use credentials::{CredentialProvider, StaticToken};
pub use error::{Error, Result};
pub use retry::RetryPolicy;

use std::{future::Future, pin::Pin};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub fn auth_headers(token: &str) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

	Ok(headers)
}

pub fn default_headers(raw: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in raw {
		let Some(value) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, value.parse()?);
	}

	Ok(headers)
}
