use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{normalize::NormalizedComplaint, reference::EeaReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SummaryMetric {
	#[serde(rename = "World")]
	World,
	#[serde(rename = "EEA")]
	Eea,
	#[serde(rename = "Selected Country")]
	SelectedCountry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
	pub metric: SummaryMetric,
	pub year: i32,
	pub count: u64,
}

/// Yearly complaint counts keyed by `(year, metric)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
	cells: BTreeMap<(i32, SummaryMetric), u64>,
}
impl SummaryTable {
	pub fn get(&self, metric: SummaryMetric, year: i32) -> Option<u64> {
		self.cells.get(&(year, metric)).copied()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	/// Flat rows ordered by year, then metric.
	pub fn rows(&self) -> Vec<SummaryRow> {
		self.cells
			.iter()
			.map(|(&(year, metric), &count)| SummaryRow { metric, year, count })
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
	pub country: String,
	pub count: u64,
}

/// Counts complaints per year of event.
///
/// Every year present gets a World and an EEA row. Selected Country rows are emitted only when
/// `selected` is non-empty.
pub fn summarize(
	records: &[NormalizedComplaint],
	eea: &EeaReference,
	selected: &[String],
) -> SummaryTable {
	let mut cells = BTreeMap::new();

	for record in records {
		let year = record.date_of_event.year();

		*cells.entry((year, SummaryMetric::World)).or_insert(0) += 1;

		let eea_count = cells.entry((year, SummaryMetric::Eea)).or_insert(0);

		if eea.contains(&record.reportable_country) {
			*eea_count += 1;
		}

		if !selected.is_empty() {
			let selected_count = cells.entry((year, SummaryMetric::SelectedCountry)).or_insert(0);

			if selected.iter().any(|country| *country == record.reportable_country) {
				*selected_count += 1;
			}
		}
	}

	SummaryTable { cells }
}

/// Complaints per reporting country, most frequent first and ties by name.
pub fn country_frequency(records: &[NormalizedComplaint]) -> Vec<CountryCount> {
	let mut counts: HashMap<&str, u64> = HashMap::new();

	for record in records {
		*counts.entry(record.reportable_country.as_str()).or_insert(0) += 1;
	}

	let mut out: Vec<CountryCount> = counts
		.into_iter()
		.map(|(country, count)| CountryCount { country: country.to_string(), count })
		.collect();

	out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));

	out
}
