use std::time::Duration;

use vigil_domain::FieldName;

use crate::{Result, VigilService};

impl VigilService {
	/// Distinct values offered for `field`, served from the TTL cache when fresh.
	pub async fn field_values(&self, field: FieldName) -> Result<Vec<String>> {
		let ttl = Duration::from_secs(self.cfg.cache.field_ttl_secs);

		self.field_cache
			.get_or_refresh(field, ttl, || async {
				let source = field.source();

				tracing::debug!(%field, object = source.object, "Loading field values.");

				self.retriever.fetch_grouped(source.object, source.field, &source.conditions()).await
			})
			.await
	}
}
