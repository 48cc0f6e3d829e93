use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use vigil_domain::{CompiledQuery, compiler};

use crate::{Error, QueryClient, Result, fanout};

/// Derives follow-up page locators from the continuation marker of the first page.
pub trait Continuation
where
	Self: Send + Sync,
{
	fn locator(&self, marker: &str, offset: u64) -> Result<String>;
}

/// Markers of the form `<cursor>-<offset>`, where the trailing digits address the first record
/// of the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetSuffix;
impl Continuation for OffsetSuffix {
	fn locator(&self, marker: &str, offset: u64) -> Result<String> {
		let Some((cursor, suffix)) = marker.rsplit_once('-') else {
			return Err(Error::PaginationInconsistency {
				message: format!("Continuation marker '{marker}' has no offset suffix."),
			});
		};

		if suffix.is_empty() || !suffix.bytes().all(|byte| byte.is_ascii_digit()) {
			return Err(Error::PaginationInconsistency {
				message: format!("Continuation marker '{marker}' has a non-numeric offset."),
			});
		}

		Ok(format!("{cursor}-{offset}"))
	}
}

/// Paginated retrieval over a [`QueryClient`].
///
/// Clones share one request gate, so remote requests in flight stay within `max_concurrency`
/// across every concurrent retrieval made through the same retriever.
#[derive(Clone)]
pub struct Retriever {
	client: Arc<dyn QueryClient>,
	continuation: Arc<dyn Continuation>,
	max_concurrency: usize,
	requests: Arc<Semaphore>,
}
impl Retriever {
	pub fn new(client: Arc<dyn QueryClient>, max_concurrency: usize) -> Self {
		Self::with_continuation(client, Arc::new(OffsetSuffix), max_concurrency)
	}

	pub fn with_continuation(
		client: Arc<dyn QueryClient>,
		continuation: Arc<dyn Continuation>,
		max_concurrency: usize,
	) -> Self {
		let max_concurrency = max_concurrency.max(1);

		Self {
			client,
			continuation,
			max_concurrency,
			requests: Arc::new(Semaphore::new(max_concurrency)),
		}
	}

	pub fn max_concurrency(&self) -> usize {
		self.max_concurrency
	}

	/// Fetches every record matched by `query`.
	///
	/// The first page fixes the page size. The remaining pages are requested concurrently and
	/// merged in page order, and the merged count must equal the declared total.
	pub async fn fetch_all<T>(&self, query: &CompiledQuery) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let first = {
			let _permit = acquire(&self.requests).await?;

			self.client.query(query).await?
		};
		let total = first.total_size;
		let page_size = first.records.len() as u64;

		if page_size == 0 && total > 0 {
			return Err(Error::PaginationInconsistency {
				message: format!("Remote declared {total} records but returned an empty page."),
			});
		}

		let remaining = if total == 0 { 0 } else { total.div_ceil(page_size) - 1 };
		let locators = if remaining == 0 {
			Vec::new()
		} else {
			let Some(marker) = first.next_records_url.as_deref() else {
				return Err(Error::PaginationInconsistency {
					message: format!(
						"{remaining} pages remain but the first page has no continuation marker."
					),
				});
			};

			(1..=remaining)
				.map(|page| self.continuation.locator(marker, page * page_size))
				.collect::<Result<Vec<_>>>()?
		};

		tracing::debug!(total, page_size, remaining, "Fetching remaining pages.");

		let client = self.client.clone();
		let requests = self.requests.clone();
		let pages = fanout::run_ordered(locators, self.max_concurrency, move |locator| {
			let client = client.clone();
			let requests = requests.clone();

			async move {
				let _permit = acquire(&requests).await?;
				let page = client.query_more(&locator).await?;

				Ok::<_, Error>(page.records)
			}
		})
		.await?;
		let mut raw = first.records;

		for page in pages {
			raw.extend(page);
		}

		if raw.len() as u64 != total {
			return Err(Error::PaginationInconsistency {
				message: format!("Remote declared {total} records but {} were received.", raw.len()),
			});
		}

		raw.into_iter()
			.map(|value| {
				serde_json::from_value(value).map_err(|err| Error::RemoteQuery {
					message: format!("Record does not match the expected shape: {err}"),
				})
			})
			.collect()
	}

	/// Distinct values of `field`, sorted ascending with null group keys dropped.
	pub async fn fetch_grouped(
		&self,
		object: &str,
		field: &str,
		conditions: &[String],
	) -> Result<Vec<String>> {
		let query = compiler::compile_grouped(object, field, conditions);
		let rows: Vec<Map<String, Value>> = self.fetch_all(&query).await?;
		let key = field.rsplit('.').next().unwrap_or(field);
		let mut values: Vec<String> = rows
			.iter()
			.filter_map(|row| match row.get(key) {
				Some(Value::String(value)) => Some(value.clone()),
				Some(Value::Number(value)) => Some(value.to_string()),
				_ => None,
			})
			.collect();

		values.sort();
		values.dedup();

		Ok(values)
	}
}

async fn acquire(requests: &Arc<Semaphore>) -> Result<OwnedSemaphorePermit> {
	requests.clone().acquire_owned().await.map_err(|err| Error::Task { message: err.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offset_suffix_replaces_trailing_digits() {
		let locator = OffsetSuffix
			.locator("/services/data/v58.0/query/01gAB-cd-2000", 4000)
			.expect("Failed to derive locator.");

		assert_eq!(locator, "/services/data/v58.0/query/01gAB-cd-4000");
	}

	#[test]
	fn offset_suffix_rejects_markers_without_offset() {
		for marker in ["/services/data/v58.0/query/01gAB", "/query/01gAB-", "/query/01g-x1"] {
			let err = OffsetSuffix.locator(marker, 10).expect_err("Expected inconsistency.");

			assert!(matches!(err, Error::PaginationInconsistency { .. }), "{marker}");
		}
	}
}
