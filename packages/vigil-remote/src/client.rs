use std::{sync::Arc, time::Duration};

use reqwest::{Client, StatusCode, header::HeaderMap};
use serde::Deserialize;
use serde_json::Value;

use vigil_domain::CompiledQuery;

use crate::{Error, Result, credentials::CredentialProvider, retry::RetryPolicy};

/// One page of a query response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
	#[serde(rename = "totalSize")]
	pub total_size: u64,
	#[serde(default)]
	pub done: bool,
	#[serde(default)]
	pub records: Vec<Value>,
	/// Continuation path for the next page, relative to the instance URL.
	#[serde(rename = "nextRecordsUrl", default)]
	pub next_records_url: Option<String>,
}

/// Shared HTTP client for the record service. Built once and reused for every request.
pub struct HttpQueryClient {
	http: Client,
	instance_url: String,
	query_path: String,
	default_headers: HeaderMap,
	credentials: Arc<dyn CredentialProvider>,
	retry: RetryPolicy,
}
impl HttpQueryClient {
	pub fn new(
		cfg: &vigil_config::Remote,
		retry: RetryPolicy,
		credentials: Arc<dyn CredentialProvider>,
	) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let default_headers = crate::default_headers(&cfg.default_headers)?;

		Ok(Self {
			http,
			instance_url: cfg.instance_url.clone(),
			query_path: format!("/services/data/{}/query", cfg.api_version),
			default_headers,
			credentials,
			retry,
		})
	}

	pub async fn query(&self, query: &CompiledQuery) -> Result<RawPage> {
		let url = format!("{}{}?q={}", self.instance_url, self.query_path, query.encoded());

		tracing::debug!(query = query.as_str(), "Issuing remote query.");

		self.retry.run("Remote query", || self.get_page(&url)).await
	}

	/// Fetches a page addressed by a continuation locator such as a `nextRecordsUrl`.
	pub async fn query_more(&self, locator: &str) -> Result<RawPage> {
		let url = format!("{}{locator}", self.instance_url);

		self.retry.run("Remote page fetch", || self.get_page(&url)).await
	}

	async fn get_page(&self, url: &str) -> Result<RawPage> {
		let token = self.credentials.token().await?;
		let mut headers = self.default_headers.clone();

		headers.extend(crate::auth_headers(&token)?);

		let res = self.http.get(url).headers(headers).send().await?;
		let status = res.status();

		if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
			return Err(Error::Authentication { status: status.as_u16() });
		}
		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status: status.as_u16(), body });
		}

		let body = res.bytes().await?;

		parse_page(&body)
	}
}

fn parse_page(body: &[u8]) -> Result<RawPage> {
	serde_json::from_slice(body).map_err(|err| Error::InvalidResponse {
		message: format!("Query response is not a valid page: {err}"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_page_with_continuation() {
		let body = br#"{
			"totalSize": 4500,
			"done": false,
			"nextRecordsUrl": "/services/data/v58.0/query/01gXX-2000",
			"records": [{ "Id": "a" }]
		}"#;
		let page = parse_page(body).expect("parse failed");

		assert_eq!(page.total_size, 4500);
		assert_eq!(page.records.len(), 1);
		assert_eq!(page.next_records_url.as_deref(), Some("/services/data/v58.0/query/01gXX-2000"));
	}

	#[test]
	fn rejects_page_without_total() {
		let err = parse_page(br#"{ "records": [] }"#).expect_err("Expected parse failure.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}
}
