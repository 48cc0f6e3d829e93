use serde::{Deserialize, Serialize};

use vigil_domain::{FilterCriteria, records::ComplaintRecord};

use crate::{
	Error, Result, VigilService, fanout,
	normalize::normalize,
	summary::{SummaryRow, summarize},
};

#[derive(Debug, Clone, Deserialize)]
pub struct TrendRequest {
	#[serde(default)]
	pub criteria: FilterCriteria,
	pub device_codes: Vec<String>,
}

/// Yearly counts for complaints carrying one device code.
#[derive(Debug, Clone, Serialize)]
pub struct CodeTrend {
	pub code: String,
	pub summary: Vec<SummaryRow>,
	pub total: usize,
	pub dropped_incomplete: usize,
}

impl VigilService {
	/// Runs one retrieval per device code, concurrently, and returns trends in input order.
	///
	/// Each retrieval uses `criteria` with its device-code filter replaced by the single code.
	pub async fn code_trends(
		&self,
		criteria: &FilterCriteria,
		codes: &[String],
	) -> Result<Vec<CodeTrend>> {
		let mut jobs = Vec::with_capacity(codes.len());

		for code in codes {
			let per_code = FilterCriteria { device_codes: vec![code.clone()], ..criteria.clone() };
			let query = vigil_domain::compile(&per_code)?;

			jobs.push((code.clone(), query));
		}

		let retriever = self.retriever.clone();
		let eea = self.eea.clone();
		let selected = criteria.countries.clone();

		fanout::run_ordered(jobs, retriever.max_concurrency(), move |(code, query)| {
			let retriever = retriever.clone();
			let eea = eea.clone();
			let selected = selected.clone();

			async move {
				let raw: Vec<ComplaintRecord> = retriever.fetch_all(&query).await?;
				let normalized = normalize(raw, query.spilled());
				let summary = summarize(&normalized.records, &eea, &selected).rows();

				Ok::<_, Error>(CodeTrend {
					code,
					summary,
					total: normalized.records.len(),
					dropped_incomplete: normalized.dropped_incomplete,
				})
			}
		})
		.await
	}
}
