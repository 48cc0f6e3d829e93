use regex::Regex;
use serde::{Deserialize, Serialize};
use time::Date;

const EXCLUDED_COMPLAINT_PATTERN: &str = r"^[Cc][Nn]-\d{6}$";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid filter {filter}: {message}")]
pub struct ValidationError {
	pub filter: &'static str,
	pub message: String,
}

/// Search criteria for one complaint retrieval.
///
/// Every multi-valued filter is optional: an empty list places no restriction on the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
	#[serde(with = "crate::date_serde::option")]
	pub date_start: Option<Date>,
	/// Exclusive upper bound on the date of event.
	#[serde(with = "crate::date_serde::option")]
	pub date_end: Option<Date>,
	pub product_segments: Vec<String>,
	pub device_codes: Vec<String>,
	pub device_clarifiers: Vec<String>,
	pub patient_codes: Vec<String>,
	pub patient_severities: Vec<u8>,
	pub result_codes: Vec<String>,
	pub conclusion_codes: Vec<String>,
	pub countries: Vec<String>,
	pub product_families: Vec<String>,
	pub record_types: Vec<RecordType>,
	pub complaint_statuses: Vec<ComplaintStatusFlag>,
	pub reportable: Vec<ReportableFlag>,
	pub excluded_complaint: Option<String>,
}
impl FilterCriteria {
	pub fn validate(&self) -> Result<(), ValidationError> {
		if let Some(excluded) = self.excluded_complaint.as_deref()
			&& !is_complaint_name(excluded)
		{
			return Err(ValidationError {
				filter: "excluded_complaint",
				message: format!("'{excluded}' must look like CN- followed by six digits."),
			});
		}
		if let (Some(start), Some(end)) = (self.date_start, self.date_end)
			&& start >= end
		{
			return Err(ValidationError {
				filter: "date_end",
				message: "date_end must be later than date_start.".to_string(),
			});
		}

		for (filter, values) in [
			("product_segments", &self.product_segments),
			("device_codes", &self.device_codes),
			("device_clarifiers", &self.device_clarifiers),
			("patient_codes", &self.patient_codes),
			("result_codes", &self.result_codes),
			("conclusion_codes", &self.conclusion_codes),
			("countries", &self.countries),
			("product_families", &self.product_families),
		] {
			if values.iter().any(|value| value.trim().is_empty()) {
				return Err(ValidationError {
					filter,
					message: "values must be non-empty.".to_string(),
				});
			}
		}

		Ok(())
	}

	/// Child groups with at least one non-empty member filter, in compilation order.
	pub fn active_groups(&self) -> Vec<ChildGroupKind> {
		ChildGroupKind::ALL.into_iter().filter(|group| group.is_active(self)).collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildGroupKind {
	DeviceCode,
	PatientCode,
	EvaluationCode,
}
impl ChildGroupKind {
	pub const ALL: [Self; 3] = [Self::DeviceCode, Self::PatientCode, Self::EvaluationCode];

	pub fn is_active(self, criteria: &FilterCriteria) -> bool {
		match self {
			Self::DeviceCode =>
				!criteria.device_codes.is_empty() || !criteria.device_clarifiers.is_empty(),
			Self::PatientCode =>
				!criteria.patient_codes.is_empty() || !criteria.patient_severities.is_empty(),
			Self::EvaluationCode =>
				!criteria.result_codes.is_empty() || !criteria.conclusion_codes.is_empty(),
		}
	}

	/// Child object queried by a semi-join.
	pub fn child_object(self) -> &'static str {
		match self {
			Self::DeviceCode => "RDC_Code__c",
			Self::PatientCode => "Patient_Code__c",
			Self::EvaluationCode => "Engineering_Coding__c",
		}
	}

	/// Lookup field on the child object that references the complaint.
	pub fn parent_ref(self) -> &'static str {
		"Complaint__c"
	}

	/// Relationship name used for correlated sub-selects in the projection.
	pub fn relationship(self) -> &'static str {
		match self {
			Self::DeviceCode => "RDC_Codes__r",
			Self::PatientCode => "Patient_Codes__r",
			Self::EvaluationCode => "Engineering_Codings__r",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
	#[serde(rename = "Literature Search")]
	LiteratureSearch,
	#[serde(rename = "Trended")]
	Trended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatusFlag {
	#[serde(rename = "No Complaint")]
	NoComplaint,
	#[serde(rename = "Complaint Confirmed")]
	ComplaintConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportableFlag {
	Yes,
	No,
}
impl ReportableFlag {
	/// Single-letter code stored by the remote schema.
	pub fn code(self) -> &'static str {
		match self {
			Self::Yes => "Y",
			Self::No => "N",
		}
	}
}

fn is_complaint_name(value: &str) -> bool {
	Regex::new(EXCLUDED_COMPLAINT_PATTERN).map(|re| re.is_match(value)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn excluded_complaint_accepts_either_case() {
		for value in ["CN-123456", "cn-000001", "Cn-999999"] {
			let criteria = FilterCriteria {
				excluded_complaint: Some(value.to_string()),
				..Default::default()
			};

			assert!(criteria.validate().is_ok(), "{value} should be accepted");
		}
	}

	#[test]
	fn excluded_complaint_rejects_wrong_shapes() {
		for value in ["CN-12345", "CN-1234567", "XX-123456", "CN123456", " CN-123456"] {
			let criteria = FilterCriteria {
				excluded_complaint: Some(value.to_string()),
				..Default::default()
			};
			let err = criteria.validate().expect_err("Expected validation error.");

			assert_eq!(err.filter, "excluded_complaint");
		}
	}

	#[test]
	fn severities_have_no_upper_bound() {
		let criteria = FilterCriteria {
			patient_codes: vec!["E0101".to_string()],
			patient_severities: vec![1, 6, 9],
			..Default::default()
		};

		assert!(criteria.validate().is_ok());
	}

	#[test]
	fn active_groups_follow_member_filters() {
		let criteria = FilterCriteria {
			device_clarifiers: vec!["Kinked".to_string()],
			conclusion_codes: vec!["C01".to_string()],
			..Default::default()
		};

		assert_eq!(
			criteria.active_groups(),
			vec![ChildGroupKind::DeviceCode, ChildGroupKind::EvaluationCode]
		);
		assert!(FilterCriteria::default().active_groups().is_empty());
	}

	#[test]
	fn criteria_deserialize_from_labels() {
		let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
			"date_start": "2023-01-01",
			"record_types": ["Literature Search"],
			"complaint_statuses": ["No Complaint"],
			"reportable": ["Yes"]
		}))
		.expect("Failed to parse criteria.");

		assert_eq!(criteria.record_types, vec![RecordType::LiteratureSearch]);
		assert_eq!(criteria.complaint_statuses, vec![ComplaintStatusFlag::NoComplaint]);
		assert_eq!(criteria.reportable, vec![ReportableFlag::Yes]);
		assert!(criteria.date_start.is_some());
		assert!(criteria.date_end.is_none());
	}
}
