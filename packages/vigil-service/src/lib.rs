pub mod cache;
pub mod complaints;
pub mod fanout;
pub mod fields;
pub mod normalize;
pub mod reference;
pub mod retrieval;
pub mod summary;
pub mod trends;
pub mod triage;

mod error;

pub use cache::TtlCache;
pub use complaints::ComplaintReport;
pub use error::{Error, Result};
pub use normalize::{Normalized, NormalizedComplaint};
pub use reference::EeaReference;
pub use retrieval::{Continuation, OffsetSuffix, Retriever};
pub use summary::{CountryCount, SummaryMetric, SummaryRow, SummaryTable};
pub use trends::{CodeTrend, TrendRequest};
pub use triage::{PriorityRecord, QUEUE_LABEL, TriageReport, TriageView};
pub use vigil_remote::BoxFuture;

use std::sync::Arc;

use vigil_config::Config;
use vigil_domain::{CompiledQuery, FieldName};
use vigil_remote::{HttpQueryClient, RawPage, RetryPolicy, StaticToken};

/// Transport seam of the retrieval engine.
pub trait QueryClient
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, vigil_remote::Result<RawPage>>;

	fn query_more<'a>(&'a self, locator: &'a str)
	-> BoxFuture<'a, vigil_remote::Result<RawPage>>;
}

impl QueryClient for HttpQueryClient {
	fn query<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, vigil_remote::Result<RawPage>> {
		Box::pin(HttpQueryClient::query(self, query))
	}

	fn query_more<'a>(
		&'a self,
		locator: &'a str,
	) -> BoxFuture<'a, vigil_remote::Result<RawPage>> {
		Box::pin(HttpQueryClient::query_more(self, locator))
	}
}

pub struct VigilService {
	pub cfg: Config,
	pub(crate) retriever: Retriever,
	pub(crate) eea: Arc<EeaReference>,
	field_cache: TtlCache<FieldName, Vec<String>>,
}
impl VigilService {
	pub fn new(cfg: Config, client: Arc<dyn QueryClient>, eea: EeaReference) -> Self {
		let retriever = Retriever::new(client, cfg.retrieval.max_concurrency);

		Self { cfg, retriever, eea: Arc::new(eea), field_cache: TtlCache::new() }
	}

	/// Builds the shared HTTP client for the configured remote and loads the EEA reference.
	pub fn connect(cfg: Config) -> Result<Self> {
		let credentials = Arc::new(StaticToken::from_config(&cfg.remote)?);
		let retry = RetryPolicy::from_config(&cfg.retrieval.retry);
		let client = HttpQueryClient::new(&cfg.remote, retry, credentials)?;
		let eea = EeaReference::load(&cfg.reference.eea_path)?;

		tracing::info!(
			instance = %cfg.remote.instance_url,
			api_version = %cfg.remote.api_version,
			eea_members = eea.len(),
			"Vigil service connected."
		);

		Ok(Self::new(cfg, Arc::new(client), eea))
	}

	pub fn eea(&self) -> &EeaReference {
		&self.eea
	}

	pub fn retriever(&self) -> &Retriever {
		&self.retriever
	}
}
