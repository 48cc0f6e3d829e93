use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use vigil_config::InvestigationPolicy;
use vigil_domain::{
	AgeMetrics, PriorityTier, bucket, compiler,
	date_serde::parse_date_prefix,
	records::{ComplaintRecord, Investigation, UserRef},
};

use crate::{Error, Result, VigilService};

/// Owner label for investigations not yet assigned to a person.
pub const QUEUE_LABEL: &str = "Investigation Queue";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageView {
	#[default]
	Queue,
	Assigned,
	All,
}

/// One row of the investigation work list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRecord {
	pub priority: PriorityTier,
	pub priority_label: String,
	pub bucket: String,
	pub product_category: Option<String>,
	pub product_name: Option<String>,
	pub age_of_complaint: i64,
	pub age_at_end_of_month: i64,
	pub days_in_queue: i64,
	pub product_segment: Option<String>,
	pub complaint_id: Option<String>,
	pub complaint_name: Option<String>,
	pub investigation_id: Option<String>,
	pub investigation_name: Option<String>,
	pub investigation_status: Option<String>,
	pub owner_id: Option<String>,
	pub owner_name: String,
	pub letter_request_id: Option<String>,
	pub letter_request_name: Option<String>,
	pub reportable: String,
	pub country: Option<String>,
	pub reportable_tree: String,
	pub device_codes: String,
	pub patient_codes: String,
	pub max_severity: f64,
	pub device_codes_long: String,
	pub patient_codes_long: String,
	#[serde(with = "vigil_domain::date_serde")]
	pub alert_date: Date,
}

#[derive(Debug, Clone, Default)]
pub struct TriageBuild {
	pub records: Vec<PriorityRecord>,
	/// Rows without an investigation, alert date or queue-entry date.
	pub dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
	pub view: TriageView,
	pub records: Vec<PriorityRecord>,
	pub dropped: usize,
}

impl VigilService {
	pub async fn triage(&self, view: TriageView) -> Result<TriageReport> {
		self.triage_at(view, OffsetDateTime::now_utc().date()).await
	}

	/// Builds the work list with ages measured against `today`.
	pub async fn triage_at(&self, view: TriageView, today: Date) -> Result<TriageReport> {
		let raw: Vec<ComplaintRecord> =
			self.retriever.fetch_all(&compiler::compile_triage()).await?;
		let TriageBuild { mut records, dropped } =
			derive(raw, today, self.cfg.triage.investigation_policy)?;
		let queue_owner_id = self.cfg.triage.queue_owner_id.as_str();
		let owner_ids = owner_lookup_ids(&records, queue_owner_id);
		let names = if owner_ids.is_empty() {
			HashMap::new()
		} else {
			let users: Vec<UserRef> =
				self.retriever.fetch_all(&compiler::compile_owner_lookup(&owner_ids)).await?;

			users.into_iter().filter_map(|user| Some((user.id?, user.name?))).collect()
		};

		resolve_owners(&mut records, &names, queue_owner_id);
		sort_records(&mut records);

		let records = apply_view(records, view);

		tracing::info!(?view, rows = records.len(), dropped, "Built triage list.");

		Ok(TriageReport { view, records, dropped })
	}
}

/// Derives the work-list columns for every row, dropping rows that cannot be aged.
pub fn derive(
	raw: Vec<ComplaintRecord>,
	today: Date,
	policy: InvestigationPolicy,
) -> Result<TriageBuild> {
	let mut build = TriageBuild::default();

	for record in raw {
		match derive_one(record, today, policy)? {
			Some(record) => build.records.push(record),
			None => build.dropped += 1,
		}
	}

	if build.dropped > 0 {
		tracing::info!(dropped = build.dropped, "Dropped triage rows missing required columns.");
	}

	Ok(build)
}

/// Distinct owner identifiers that need a display-name lookup.
pub fn owner_lookup_ids(records: &[PriorityRecord], queue_owner_id: &str) -> Vec<String> {
	records
		.iter()
		.filter_map(|record| record.owner_id.as_deref())
		.filter(|owner| *owner != queue_owner_id)
		.collect::<BTreeSet<_>>()
		.into_iter()
		.map(str::to_string)
		.collect()
}

/// The queue sentinel and owners missing from `names` resolve to [`QUEUE_LABEL`].
pub fn resolve_owners(
	records: &mut [PriorityRecord],
	names: &HashMap<String, String>,
	queue_owner_id: &str,
) {
	for record in records {
		record.owner_name = record
			.owner_id
			.as_deref()
			.filter(|owner| *owner != queue_owner_id)
			.and_then(|owner| names.get(owner))
			.cloned()
			.unwrap_or_else(|| QUEUE_LABEL.to_string());
	}
}

/// Tier ascending, then oldest complaint, then longest time in queue.
pub fn sort_records(records: &mut [PriorityRecord]) {
	records.sort_by(|a, b| {
		a.priority
			.cmp(&b.priority)
			.then_with(|| b.age_of_complaint.cmp(&a.age_of_complaint))
			.then_with(|| b.days_in_queue.cmp(&a.days_in_queue))
	});
}

pub fn apply_view(records: Vec<PriorityRecord>, view: TriageView) -> Vec<PriorityRecord> {
	match view {
		TriageView::All => records,
		TriageView::Queue =>
			records.into_iter().filter(|record| record.owner_name == QUEUE_LABEL).collect(),
		TriageView::Assigned =>
			records.into_iter().filter(|record| record.owner_name != QUEUE_LABEL).collect(),
	}
}

fn derive_one(
	record: ComplaintRecord,
	today: Date,
	policy: InvestigationPolicy,
) -> Result<Option<PriorityRecord>> {
	let investigations =
		record.investigations.as_ref().map(|c| c.records.as_slice()).unwrap_or_default();
	let complaint = record.name.as_deref().or(record.id.as_deref()).unwrap_or("<unnamed>");
	let Some(investigation) = select_investigation(complaint, investigations, policy)? else {
		return Ok(None);
	};
	let Some(alert_date) = record.alert_date.as_deref().and_then(parse_date_prefix) else {
		return Ok(None);
	};
	let Some(queue_entered) = record.investigation_started.as_deref().and_then(parse_date_prefix)
	else {
		return Ok(None);
	};
	let metrics = AgeMetrics::compute(today, alert_date, queue_entered);
	let tier = metrics.tier();
	let product_category = record.product.as_ref().and_then(|product| product.category.clone());
	let device = record.device_codes.as_ref().map(|c| c.records.as_slice()).unwrap_or_default();
	let patient = record.patient_codes.as_ref().map(|c| c.records.as_slice()).unwrap_or_default();
	let answers = record.questionnaires.as_ref().map(|c| c.records.as_slice()).unwrap_or_default();
	let letter = record.letter_requests.as_ref().and_then(|c| c.records.first());
	let max_severity = patient
		.iter()
		.map(|code| code.severity.unwrap_or(0.0))
		.fold(0.0_f64, f64::max);
	let reportable = if record.reportable.as_deref() == Some("Y") { "Yes" } else { "No" };

	Ok(Some(PriorityRecord {
		priority: tier,
		priority_label: tier.label().to_string(),
		bucket: bucket(product_category.as_deref().unwrap_or_default()).to_string(),
		product_name: record.product.as_ref().and_then(|product| product.name.clone()),
		product_category,
		age_of_complaint: metrics.age_of_complaint,
		age_at_end_of_month: metrics.age_at_end_of_month,
		days_in_queue: metrics.days_in_queue,
		product_segment: record.product_segment.clone(),
		complaint_id: record.id.clone(),
		complaint_name: record.name.clone(),
		investigation_id: investigation.id.clone(),
		investigation_name: investigation.name.clone(),
		investigation_status: investigation.status.clone(),
		owner_id: investigation.owner_id.clone(),
		owner_name: QUEUE_LABEL.to_string(),
		letter_request_id: letter.and_then(|request| request.id.clone()),
		letter_request_name: letter.and_then(|request| request.name.clone()),
		reportable: reportable.to_string(),
		country: record.reportable_country.clone(),
		reportable_tree: combine(
			answers,
			|answer| vec![answer.key_value.as_deref().map(|value| value.trim_end_matches("_Tree"))],
			", ",
		),
		device_codes: combine(device, |code| vec![code.code.as_deref()], ", "),
		patient_codes: combine(patient, |code| vec![code.code.as_deref()], ", "),
		max_severity,
		device_codes_long: combine(
			device,
			|code| vec![code.code.as_deref(), code.name.as_deref(), code.clarifier.as_deref()],
			"\n",
		),
		patient_codes_long: combine(
			patient,
			|code| {
				vec![
					code.code.as_deref(),
					code.name.as_deref(),
					code.clarifier.as_deref(),
					code.anatomy.as_deref(),
				]
			},
			"\n",
		),
		alert_date,
	}))
}

fn select_investigation<'a>(
	complaint: &str,
	investigations: &'a [Investigation],
	policy: InvestigationPolicy,
) -> Result<Option<&'a Investigation>> {
	let open = investigations.iter().filter(|investigation| investigation.is_open()).count();

	if open > 1 {
		match policy {
			InvestigationPolicy::First => tracing::warn!(
				complaint,
				open,
				"Complaint has several open investigations. Using the first."
			),
			InvestigationPolicy::Strict =>
				return Err(Error::AmbiguousInvestigation { complaint: complaint.to_string(), open }),
		}
	}

	Ok(investigations
		.iter()
		.find(|investigation| investigation.is_open())
		.or_else(|| investigations.first()))
}

/// Joins the present parts of each child with `" - "`, then the distinct entries in sorted order.
fn combine<T, F>(children: &[T], parts: F, separator: &str) -> String
where
	F: Fn(&T) -> Vec<Option<&str>>,
{
	let entries: BTreeSet<String> = children
		.iter()
		.map(|child| parts(child).into_iter().flatten().collect::<Vec<_>>().join(" - "))
		.filter(|entry| !entry.is_empty())
		.collect();

	entries.into_iter().collect::<Vec<_>>().join(separator)
}

#[cfg(test)]
mod tests {
	use time::macros::date;
	use vigil_domain::records::{
		ChildCollection, DeviceCode, LetterRequest, PatientCode, ProductRef, QuestionnaireAnswer,
	};

	use super::*;

	fn collection<T>(records: Vec<T>) -> Option<ChildCollection<T>> {
		Some(ChildCollection { total_size: records.len() as u64, records })
	}

	fn investigation(id: &str, owner: &str, status: &str) -> Investigation {
		Investigation {
			id: Some(id.to_string()),
			name: Some(format!("INV-{id}")),
			owner_id: Some(owner.to_string()),
			status: Some(status.to_string()),
		}
	}

	fn complaint(alert: &str, queued: &str, investigations: Vec<Investigation>) -> ComplaintRecord {
		ComplaintRecord {
			id: Some("a0X1".to_string()),
			name: Some("CN-000001".to_string()),
			alert_date: Some(alert.to_string()),
			investigation_started: Some(queued.to_string()),
			product: Some(ProductRef {
				name: Some("Stent".to_string()),
				category: Some("FFR".to_string()),
			}),
			investigations: collection(investigations),
			..Default::default()
		}
	}

	fn code(code: &str, name: Option<&str>, severity: Option<f64>) -> PatientCode {
		PatientCode {
			code: Some(code.to_string()),
			name: name.map(str::to_string),
			severity,
			..Default::default()
		}
	}

	#[test]
	fn derives_work_list_columns() {
		let record = ComplaintRecord {
			reportable: Some("Y".to_string()),
			patient_codes: collection(vec![
				code("E02", Some("Bleeding"), Some(2.0)),
				code("E01", None, None),
				code("E02", Some("Bleeding"), Some(4.0)),
			]),
			device_codes: collection(vec![DeviceCode {
				code: Some("A0401".to_string()),
				clarifier: Some("Kinked".to_string()),
				..Default::default()
			}]),
			questionnaires: collection(vec![
				QuestionnaireAnswer { key_value: Some("MDR_Tree".to_string()) },
				QuestionnaireAnswer { key_value: Some("MDR_Tree".to_string()) },
				QuestionnaireAnswer { key_value: Some("EU_Tree".to_string()) },
			]),
			letter_requests: collection(vec![LetterRequest {
				id: Some("lr1".to_string()),
				name: Some("LR-1".to_string()),
			}]),
			..complaint("2024-03-01", "2024-03-08T09:30:00.000+0000", vec![investigation(
				"i1",
				"005A",
				"Open",
			)])
		};
		let build = derive(vec![record], date!(2024 - 03 - 10), InvestigationPolicy::First)
			.expect("Derivation failed.");
		let row = &build.records[0];

		assert_eq!(build.dropped, 0);
		assert_eq!(row.priority, PriorityTier::Tier4);
		assert_eq!(row.bucket, "OCT/FFR");
		assert_eq!(row.days_in_queue, 2);
		assert_eq!(row.reportable, "Yes");
		assert_eq!(row.reportable_tree, "EU, MDR");
		assert_eq!(row.patient_codes, "E01, E02");
		assert_eq!(row.patient_codes_long, "E01\nE02 - Bleeding");
		assert_eq!(row.device_codes_long, "A0401 - Kinked");
		assert_eq!(row.max_severity, 4.0);
		assert_eq!(row.letter_request_name.as_deref(), Some("LR-1"));
		assert_eq!(row.owner_id.as_deref(), Some("005A"));
	}

	#[test]
	fn rows_without_dates_or_investigations_are_dropped() {
		let raw = vec![
			complaint("2024-03-01", "2024-03-02", Vec::new()),
			ComplaintRecord {
				alert_date: None,
				..complaint("2024-03-01", "2024-03-02", vec![investigation("i1", "q", "Open")])
			},
			complaint("2024-03-01", "", vec![investigation("i2", "q", "Open")]),
			complaint("2024-03-01", "2024-03-02", vec![investigation("i3", "q", "Open")]),
		];
		let build =
			derive(raw, date!(2024 - 03 - 10), InvestigationPolicy::First).expect("Derivation failed.");

		assert_eq!(build.records.len(), 1);
		assert_eq!(build.dropped, 3);
	}

	#[test]
	fn investigation_policy_governs_several_open_investigations() {
		let investigations = vec![
			investigation("i1", "q", "Closed - Complete"),
			investigation("i2", "005A", "Open"),
			investigation("i3", "005B", "Open"),
		];
		let first = derive(
			vec![complaint("2024-03-01", "2024-03-02", investigations.clone())],
			date!(2024 - 03 - 10),
			InvestigationPolicy::First,
		)
		.expect("Derivation failed.");

		assert_eq!(first.records[0].investigation_id.as_deref(), Some("i2"));

		let all_closed = derive(
			vec![complaint("2024-03-01", "2024-03-02", vec![
				investigation("i4", "005A", "Closed - Complete"),
				investigation("i5", "005B", "Closed - Void"),
			])],
			date!(2024 - 03 - 10),
			InvestigationPolicy::First,
		)
		.expect("Derivation failed.");

		assert_eq!(all_closed.records[0].investigation_id.as_deref(), Some("i4"));

		let err = derive(
			vec![complaint("2024-03-01", "2024-03-02", investigations)],
			date!(2024 - 03 - 10),
			InvestigationPolicy::Strict,
		)
		.expect_err("Expected ambiguity error.");

		assert!(matches!(err, Error::AmbiguousInvestigation { open: 2, .. }));
	}

	#[test]
	fn owners_resolve_and_views_split_on_queue_label() {
		let raw = vec![
			complaint("2024-01-01", "2024-03-02", vec![investigation("i1", "QUEUE", "Open")]),
			complaint("2024-03-01", "2024-03-02", vec![investigation("i2", "005A", "Open")]),
			complaint("2024-03-05", "2024-03-06", vec![investigation("i3", "005Z", "Open")]),
			complaint("2024-02-20", "2024-02-21", vec![investigation("i4", "005A", "Open")]),
		];
		let mut records = derive(raw, date!(2024 - 03 - 10), InvestigationPolicy::First)
			.expect("Derivation failed.")
			.records;

		assert_eq!(owner_lookup_ids(&records, "QUEUE"), vec!["005A", "005Z"]);

		let names = HashMap::from([("005A".to_string(), "Ada Analyst".to_string())]);

		resolve_owners(&mut records, &names, "QUEUE");
		sort_records(&mut records);

		let order: Vec<_> =
			records.iter().map(|record| record.investigation_id.as_deref().unwrap_or("")).collect();

		assert_eq!(order, vec!["i1", "i4", "i2", "i3"]);

		let queue = apply_view(records.clone(), TriageView::Queue);
		let assigned = apply_view(records.clone(), TriageView::Assigned);

		assert_eq!(queue.len(), 2);
		assert!(queue.iter().all(|record| record.owner_name == QUEUE_LABEL));
		assert_eq!(assigned.len(), 2);
		assert!(assigned.iter().all(|record| record.owner_name == "Ada Analyst"));
		assert_eq!(apply_view(records, TriageView::All).len(), 4);
	}
}
