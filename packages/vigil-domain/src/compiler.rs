//! Compiles [`FilterCriteria`] into query strings for the remote record service.
//!
//! Child-collection filters use one of two encodings. With at most [`MAX_SEMI_JOINS`] active
//! groups each group is folded into the predicate as a semi-join. Beyond that the remote
//! service rejects the query, so every active group moves into the projection as a correlated
//! sub-select and [`CompiledQuery::spilled`] tells the normalizer which groups to filter
//! client-side.

use crate::{
	date_serde,
	filter::{ChildGroupKind, ComplaintStatusFlag, FilterCriteria, RecordType, ValidationError},
};

/// Most semi-join sub-queries the remote service accepts in one predicate.
pub const MAX_SEMI_JOINS: usize = 2;

pub const COMPLAINT_OBJECT: &str = "CMPL123CME__Complaint__c";
pub const STATUS_FIELD: &str = "CMPL123CME__CMPL123_WF_Status__c";
pub const STATUS_VOID: &str = "Closed - Void";
pub const STATUS_DUPLICATE: &str = "Closed - Duplicate";
pub const STATUS_NO_COMPLAINT: &str = "Closed - No Complaint";
/// Record type identifier of complaints raised from literature searches.
pub const LITERATURE_RECORD_TYPE_ID: &str = "0121R000000oLitAAE";

const DATE_OF_EVENT: &str = "Date_of_Event__c";
const PRODUCT_CATEGORY: &str = "CMPL123CME__Product__r.Product_Category_Formula__c";
const REPORTABLE_FIELD: &str = "At_least_one_Reportable_is_not_CC__c";
const COMPLAINT_PROJECTION: [&str; 6] = [
	"A.Id",
	"A.Name",
	"A.Product_Segment__c",
	"A.Date_of_Event__c",
	"A.Reportable_Country__c",
	"A.CMPL123CME__CMPL123_WF_Status__c",
];
const TRIAGE_EXCLUDED_CATEGORIES: [&str; 6] = ["OCCL", "SHDIST", "SHTPM", "SURG", "TRCATH", "VR"];
const INVESTIGATION_CLOSED_STATUSES: [&str; 3] =
	["Closed - Cancelled", "Closed - Complete", "Closed - Void"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
	text: String,
	spilled: Vec<ChildGroupKind>,
}
impl CompiledQuery {
	pub fn new(text: String) -> Self {
		Self { text, spilled: Vec::new() }
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	/// Child groups emitted as projection sub-selects instead of predicate semi-joins.
	pub fn spilled(&self) -> &[ChildGroupKind] {
		&self.spilled
	}

	/// Form-encoded text for the `q` parameter; spaces become `+`.
	pub fn encoded(&self) -> String {
		url::form_urlencoded::byte_serialize(self.text.as_bytes()).collect()
	}
}

/// Compiles complaint search criteria.
///
/// The country filter is not compiled: it is applied after summary aggregation so the yearly
/// statistics see every country.
pub fn compile(criteria: &FilterCriteria) -> Result<CompiledQuery, ValidationError> {
	criteria.validate()?;

	let mut projection: Vec<String> =
		COMPLAINT_PROJECTION.iter().map(|column| column.to_string()).collect();
	let mut conditions = Vec::new();

	if let Some(start) = criteria.date_start {
		conditions.push(format!("{DATE_OF_EVENT} >= {}", date_serde::format_date(start)));
	}
	if let Some(end) = criteria.date_end {
		conditions.push(format!("{DATE_OF_EVENT} < {}", date_serde::format_date(end)));
	}
	if !criteria.product_segments.is_empty() {
		conditions.push(in_list("Product_Segment__c", &criteria.product_segments));
	}
	if !criteria.product_families.is_empty() {
		conditions.push(in_list(PRODUCT_CATEGORY, &criteria.product_families));
	}

	conditions.extend(status_conditions(&criteria.complaint_statuses));

	if let Some(condition) = record_type_condition(&criteria.record_types) {
		conditions.push(condition);
	}

	let mut reportable: Vec<&str> = criteria.reportable.iter().map(|flag| flag.code()).collect();

	reportable.sort_unstable();
	reportable.dedup();

	if !reportable.is_empty() {
		conditions.push(in_list(REPORTABLE_FIELD, &reportable));
	}
	if let Some(excluded) = criteria.excluded_complaint.as_deref() {
		conditions.push(not_in_list("Name", &[excluded]));
	}

	let active = criteria.active_groups();
	let spill = active.len() > MAX_SEMI_JOINS;
	let mut spilled = Vec::new();

	for group in active {
		let predicate = group_predicate(group, criteria);

		if spill {
			projection.push(format!(
				"(SELECT Id FROM {} WHERE {predicate})",
				group.relationship()
			));
			spilled.push(group);
		} else {
			conditions.push(format!(
				"Id IN (SELECT {} FROM {} WHERE {predicate})",
				group.parent_ref(),
				group.child_object()
			));
		}
	}

	let text = assemble(&projection, &format!("{COMPLAINT_OBJECT} A"), &conditions, None);

	Ok(CompiledQuery { text, spilled })
}

/// `SELECT field FROM object [WHERE ...] GROUP BY field`.
pub fn compile_grouped(object: &str, field: &str, conditions: &[String]) -> CompiledQuery {
	let projection = [field.to_string()];

	CompiledQuery::new(assemble(&projection, object, conditions, Some(field)))
}

/// Open complaints with at least one investigation still in progress.
pub fn compile_triage() -> CompiledQuery {
	let projection: Vec<String> = [
		"A.Id",
		"A.Name",
		"A.CMPL123CME__Product__r.Name",
		"A.CMPL123CME__Product__r.Product_Category_Formula__c",
		"A.Product_Segment__c",
		"A.Reportable_Country__c",
		"A.Alert_Date__c",
		"A.Investigation_Done_On__c",
		"A.At_least_one_Reportable_is_not_CC__c",
		"(SELECT OwnerId, Id, Name, CMPL123_WF_Status__c FROM CMPL123CME__Investigations__r)",
		"(SELECT Code__c, Name__c, Clarifier__c FROM RDC_Codes__r)",
		"(SELECT Code__c, Name__c, Clarifier__c, Anatomy__c, Severity__c FROM Patient_Codes__r)",
		"(SELECT CMPL123CME__Key_value__c FROM CMPL123CME__Questionnaires__r WHERE Reportable__c IN ('Yes'))",
		"(SELECT Id, Name FROM Letter_Requests__r WHERE Status__c NOT IN ('Cancelled'))",
	]
	.iter()
	.map(|column| column.to_string())
	.collect();
	let conditions = vec![
		format!(
			"Id IN (SELECT CMPL123CME__Complaint__c FROM CMPL123CME__Investigation__c WHERE {})",
			not_in_list("CMPL123_WF_Status__c", &INVESTIGATION_CLOSED_STATUSES)
		),
		in_list(&format!("A.{STATUS_FIELD}"), &["Investigation in Progress"]),
		not_in_list(&format!("A.{PRODUCT_CATEGORY}"), &TRIAGE_EXCLUDED_CATEGORIES),
	];

	CompiledQuery::new(assemble(&projection, &format!("{COMPLAINT_OBJECT} A"), &conditions, None))
}

/// Resolves owner identifiers to user display names. Identifiers are sorted for a stable text.
pub fn compile_owner_lookup<S>(owner_ids: &[S]) -> CompiledQuery
where
	S: AsRef<str>,
{
	let mut ids: Vec<&str> = owner_ids.iter().map(AsRef::as_ref).collect();

	ids.sort_unstable();
	ids.dedup();

	let projection = ["Id".to_string(), "Name".to_string()];
	let conditions = [in_list("Id", &ids)];

	CompiledQuery::new(assemble(&projection, "User", &conditions, None))
}

pub fn quote(value: &str) -> String {
	let mut out = String::with_capacity(value.len() + 2);

	out.push('\'');

	for ch in value.chars() {
		if matches!(ch, '\'' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('\'');

	out
}

pub fn in_list<S>(field: &str, values: &[S]) -> String
where
	S: AsRef<str>,
{
	format!("{field} IN ({})", quoted_values(values))
}

pub fn not_in_list<S>(field: &str, values: &[S]) -> String
where
	S: AsRef<str>,
{
	format!("{field} NOT IN ({})", quoted_values(values))
}

fn quoted_values<S>(values: &[S]) -> String
where
	S: AsRef<str>,
{
	values.iter().map(|value| quote(value.as_ref())).collect::<Vec<_>>().join(", ")
}

fn status_conditions(flags: &[ComplaintStatusFlag]) -> Vec<String> {
	let no_complaint = flags.contains(&ComplaintStatusFlag::NoComplaint);
	let confirmed = flags.contains(&ComplaintStatusFlag::ComplaintConfirmed);

	match (no_complaint, confirmed) {
		(true, false) => vec![
			not_in_list(STATUS_FIELD, &[STATUS_VOID, STATUS_DUPLICATE]),
			in_list(STATUS_FIELD, &[STATUS_NO_COMPLAINT]),
		],
		(false, true) =>
			vec![not_in_list(STATUS_FIELD, &[STATUS_VOID, STATUS_DUPLICATE, STATUS_NO_COMPLAINT])],
		_ => vec![not_in_list(STATUS_FIELD, &[STATUS_VOID, STATUS_DUPLICATE])],
	}
}

fn record_type_condition(types: &[RecordType]) -> Option<String> {
	let literature = types.contains(&RecordType::LiteratureSearch);
	let trended = types.contains(&RecordType::Trended);

	match (literature, trended) {
		(true, false) => Some(in_list("RecordTypeId", &[LITERATURE_RECORD_TYPE_ID])),
		(false, true) => Some(not_in_list("RecordTypeId", &[LITERATURE_RECORD_TYPE_ID])),
		_ => None,
	}
}

fn group_predicate(group: ChildGroupKind, criteria: &FilterCriteria) -> String {
	let mut parts = Vec::new();

	match group {
		ChildGroupKind::DeviceCode => {
			if !criteria.device_codes.is_empty() {
				parts.push(in_list("Code__c", &criteria.device_codes));
			}
			if !criteria.device_clarifiers.is_empty() {
				parts.push(in_list("Clarifier__c", &criteria.device_clarifiers));
			}
		},
		ChildGroupKind::PatientCode => {
			if !criteria.patient_codes.is_empty() {
				parts.push(in_list("Code__c", &criteria.patient_codes));
			}
			if !criteria.patient_severities.is_empty() {
				let severities = criteria
					.patient_severities
					.iter()
					.map(|severity| severity.to_string())
					.collect::<Vec<_>>()
					.join(", ");

				parts.push(format!("Severity__c IN ({severities})"));
			}
		},
		ChildGroupKind::EvaluationCode => {
			if !criteria.result_codes.is_empty() {
				parts.push(in_list("Evaluation_Result_Code__r.Name", &criteria.result_codes));
			}
			if !criteria.conclusion_codes.is_empty() {
				parts.push(in_list(
					"Evaluation_Conclusion_Code__r.Name",
					&criteria.conclusion_codes,
				));
			}
		},
	}

	parts.join(" AND ")
}

fn assemble(
	projection: &[String],
	object: &str,
	conditions: &[String],
	group_by: Option<&str>,
) -> String {
	let mut text = format!("SELECT {} FROM {object}", projection.join(", "));

	if !conditions.is_empty() {
		text.push_str(" WHERE ");
		text.push_str(&conditions.join(" AND "));
	}
	if let Some(field) = group_by {
		text.push_str(" GROUP BY ");
		text.push_str(field);
	}

	text
}
