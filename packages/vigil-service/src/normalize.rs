use serde::Serialize;
use time::Date;

use vigil_domain::{ChildGroupKind, date_serde, records::ComplaintRecord};

/// Complaint row with every required column present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedComplaint {
	pub id: String,
	pub name: String,
	pub product_segment: String,
	#[serde(with = "vigil_domain::date_serde")]
	pub date_of_event: Date,
	pub reportable_country: String,
	pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
	pub records: Vec<NormalizedComplaint>,
	/// Rows removed because a required column was null or unparseable.
	pub dropped_incomplete: usize,
	/// Rows removed because a spilled child group had no matching child.
	pub unmatched: usize,
}

/// Applies the client-side half of spilled child-group filters and drops incomplete rows.
pub fn normalize(raw: Vec<ComplaintRecord>, spilled: &[ChildGroupKind]) -> Normalized {
	let mut out = Normalized::default();

	for record in raw {
		if !spilled.iter().all(|group| matches_group(&record, *group)) {
			out.unmatched += 1;

			continue;
		}

		match complete(record) {
			Some(record) => out.records.push(record),
			None => out.dropped_incomplete += 1,
		}
	}

	if out.dropped_incomplete > 0 || out.unmatched > 0 {
		tracing::info!(
			kept = out.records.len(),
			dropped_incomplete = out.dropped_incomplete,
			unmatched = out.unmatched,
			"Normalized complaint rows."
		);
	}

	out
}

/// Keeps records reported from one of `countries`. An empty selection keeps everything.
pub fn filter_countries(
	records: Vec<NormalizedComplaint>,
	countries: &[String],
) -> Vec<NormalizedComplaint> {
	if countries.is_empty() {
		return records;
	}

	records
		.into_iter()
		.filter(|record| countries.iter().any(|country| *country == record.reportable_country))
		.collect()
}

fn matches_group(record: &ComplaintRecord, group: ChildGroupKind) -> bool {
	match group {
		ChildGroupKind::DeviceCode =>
			record.device_codes.as_ref().is_some_and(|codes| !codes.is_empty()),
		ChildGroupKind::PatientCode =>
			record.patient_codes.as_ref().is_some_and(|codes| !codes.is_empty()),
		ChildGroupKind::EvaluationCode =>
			record.evaluation_codings.as_ref().is_some_and(|codings| !codings.is_empty()),
	}
}

fn complete(record: ComplaintRecord) -> Option<NormalizedComplaint> {
	let date_of_event = record.date_of_event.as_deref().and_then(date_serde::parse_date_prefix)?;

	Some(NormalizedComplaint {
		id: record.id?,
		name: record.name?,
		product_segment: record.product_segment?,
		date_of_event,
		reportable_country: record.reportable_country?,
		status: record.status,
	})
}

#[cfg(test)]
mod tests {
	use vigil_domain::records::{ChildCollection, ChildId};

	use super::*;

	fn row(id: &str) -> ComplaintRecord {
		ComplaintRecord {
			id: Some(id.to_string()),
			name: Some(format!("CN-{id}")),
			product_segment: Some("Vascular".to_string()),
			date_of_event: Some("2023-05-04".to_string()),
			reportable_country: Some("Germany".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn null_required_columns_are_dropped_and_counted() {
		let raw = vec![
			row("1"),
			ComplaintRecord { product_segment: None, ..row("2") },
			ComplaintRecord { date_of_event: Some("not-a-date".to_string()), ..row("3") },
			ComplaintRecord { reportable_country: None, ..row("4") },
			row("5"),
		];
		let normalized = normalize(raw, &[]);

		assert_eq!(normalized.records.len(), 2);
		assert_eq!(normalized.dropped_incomplete, 3);
		assert_eq!(normalized.unmatched, 0);
	}

	#[test]
	fn spilled_groups_require_a_matching_child() {
		let codings = ChildCollection {
			total_size: 1,
			records: vec![ChildId { id: Some("e1".to_string()) }],
		};
		let matched = ComplaintRecord { evaluation_codings: Some(codings), ..row("1") };
		let empty = ComplaintRecord { evaluation_codings: Some(ChildCollection::default()), ..row("2") };
		let missing = row("3");
		let normalized = normalize(vec![matched, empty, missing], &[ChildGroupKind::EvaluationCode]);

		assert_eq!(normalized.unmatched, 2);
		assert_eq!(normalized.records.len(), 1);
		assert_eq!(normalized.records[0].id, "1");
	}

	#[test]
	fn timestamps_keep_their_date_part() {
		let normalized = normalize(
			vec![ComplaintRecord {
				date_of_event: Some("2023-05-04T10:00:00.000+0000".to_string()),
				..row("1")
			}],
			&[],
		);

		assert_eq!(normalized.records[0].date_of_event, time::macros::date!(2023 - 05 - 04));
	}

	#[test]
	fn country_filter_is_a_no_op_without_selection() {
		let records = normalize(vec![row("1"), row("2")], &[]).records;

		assert_eq!(filter_countries(records.clone(), &[]).len(), 2);
		assert!(filter_countries(records, &["France".to_string()]).is_empty());
	}
}
