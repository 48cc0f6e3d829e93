use serde::Serialize;

use vigil_domain::{FilterCriteria, records::ComplaintRecord};

use crate::{
	Result, VigilService,
	normalize::{self, Normalized, NormalizedComplaint},
	summary::{self, CountryCount, SummaryRow},
};

#[derive(Debug, Clone, Serialize)]
pub struct ComplaintReport {
	pub records: Vec<NormalizedComplaint>,
	/// Yearly counts over every country, before the country filter.
	pub summary: Vec<SummaryRow>,
	pub countries: Vec<CountryCount>,
	pub dropped_incomplete: usize,
	pub unmatched: usize,
}

impl VigilService {
	pub async fn complaints(&self, criteria: &FilterCriteria) -> Result<ComplaintReport> {
		let Normalized { records, dropped_incomplete, unmatched } =
			self.retrieve_complaints(criteria).await?;
		let summary = summary::summarize(&records, &self.eea, &criteria.countries).rows();
		let countries = summary::country_frequency(&records);
		let records = normalize::filter_countries(records, &criteria.countries);

		tracing::info!(
			rows = records.len(),
			dropped_incomplete,
			unmatched,
			"Complaint retrieval finished."
		);

		Ok(ComplaintReport { records, summary, countries, dropped_incomplete, unmatched })
	}

	pub(crate) async fn retrieve_complaints(&self, criteria: &FilterCriteria) -> Result<Normalized> {
		let query = vigil_domain::compile(criteria)?;
		let raw: Vec<ComplaintRecord> = self.retriever.fetch_all(&query).await?;

		Ok(normalize::normalize(raw, query.spilled()))
	}
}
