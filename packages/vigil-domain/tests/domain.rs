use time::macros::date;

use vigil_domain::{
	ChildGroupKind, ComplaintStatusFlag, FieldName, FilterCriteria, PriorityTier, RecordType,
	ReportableFlag, assign_priority, bucket, compile,
	compiler::{self, LITERATURE_RECORD_TYPE_ID},
};

fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| value.to_string()).collect()
}

fn two_group_criteria() -> FilterCriteria {
	FilterCriteria {
		device_codes: strings(&["A0401"]),
		patient_codes: strings(&["E0101"]),
		..Default::default()
	}
}

fn three_group_criteria() -> FilterCriteria {
	FilterCriteria { result_codes: strings(&["R01"]), ..two_group_criteria() }
}

#[test]
fn compiling_twice_is_byte_identical() {
	let criteria = FilterCriteria {
		date_start: Some(date!(2023 - 01 - 01)),
		product_segments: strings(&["Vascular", "Structural Heart"]),
		patient_severities: vec![3, 4],
		record_types: vec![RecordType::Trended],
		excluded_complaint: Some("CN-123456".to_string()),
		..three_group_criteria()
	};
	let first = compile(&criteria).expect("Failed to compile.");
	let second = compile(&criteria.clone()).expect("Failed to compile.");

	assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());
	assert_eq!(first.encoded(), second.encoded());
}

#[test]
fn two_active_groups_fold_into_semi_joins() {
	let query = compile(&two_group_criteria()).expect("Failed to compile.");
	let text = query.as_str();

	assert!(query.spilled().is_empty());
	assert!(text.contains(
		"Id IN (SELECT Complaint__c FROM RDC_Code__c WHERE Code__c IN ('A0401'))"
	));
	assert!(text.contains(
		"Id IN (SELECT Complaint__c FROM Patient_Code__c WHERE Code__c IN ('E0101'))"
	));
	assert!(!text.contains("FROM RDC_Codes__r"));
	assert!(!text.contains("FROM Patient_Codes__r"));
}

#[test]
fn three_active_groups_spill_into_projection() {
	let query = compile(&three_group_criteria()).expect("Failed to compile.");
	let text = query.as_str();
	let (projection, predicate) =
		text.split_once(" FROM CMPL123CME__Complaint__c A").expect("Expected the complaint object.");

	assert_eq!(query.spilled(), &[
		ChildGroupKind::DeviceCode,
		ChildGroupKind::PatientCode,
		ChildGroupKind::EvaluationCode,
	]);
	assert!(projection.contains("(SELECT Id FROM RDC_Codes__r WHERE Code__c IN ('A0401'))"));
	assert!(projection.contains(
		"(SELECT Id FROM Engineering_Codings__r WHERE Evaluation_Result_Code__r.Name IN ('R01'))"
	));
	assert!(!text.contains("Id IN (SELECT Complaint__c"));
	assert!(!predicate.contains("RDC_Code"));
}

#[test]
fn date_bounds_are_inclusive_then_exclusive() {
	let criteria = FilterCriteria {
		date_start: Some(date!(2023 - 01 - 01)),
		date_end: Some(date!(2023 - 02 - 01)),
		..Default::default()
	};
	let query = compile(&criteria).expect("Failed to compile.");

	assert!(query.as_str().contains("Date_of_Event__c >= 2023-01-01"));
	assert!(query.as_str().contains("Date_of_Event__c < 2023-02-01"));
}

#[test]
fn severities_are_unquoted_inside_group_predicate() {
	let criteria = FilterCriteria {
		patient_codes: strings(&["E0101"]),
		patient_severities: vec![2, 3],
		..Default::default()
	};
	let query = compile(&criteria).expect("Failed to compile.");

	assert!(query.as_str().contains(
		"FROM Patient_Code__c WHERE Code__c IN ('E0101') AND Severity__c IN (2, 3))"
	));
}

#[test]
fn status_flags_select_exclusion_shape() {
	let no_complaint = compile(&FilterCriteria {
		complaint_statuses: vec![ComplaintStatusFlag::NoComplaint],
		..Default::default()
	})
	.expect("Failed to compile.");
	let confirmed = compile(&FilterCriteria {
		complaint_statuses: vec![ComplaintStatusFlag::ComplaintConfirmed],
		..Default::default()
	})
	.expect("Failed to compile.");

	assert!(no_complaint.as_str().contains(
		"CMPL123CME__CMPL123_WF_Status__c NOT IN ('Closed - Void', 'Closed - Duplicate') AND CMPL123CME__CMPL123_WF_Status__c IN ('Closed - No Complaint')"
	));
	assert!(confirmed.as_str().contains(
		"CMPL123CME__CMPL123_WF_Status__c NOT IN ('Closed - Void', 'Closed - Duplicate', 'Closed - No Complaint')"
	));
}

#[test]
fn record_type_labels_map_to_literature_identifier() {
	let literature = compile(&FilterCriteria {
		record_types: vec![RecordType::LiteratureSearch],
		..Default::default()
	})
	.expect("Failed to compile.");
	let both = compile(&FilterCriteria {
		record_types: vec![RecordType::LiteratureSearch, RecordType::Trended],
		..Default::default()
	})
	.expect("Failed to compile.");

	assert!(
		literature.as_str().contains(&format!("RecordTypeId IN ('{LITERATURE_RECORD_TYPE_ID}')"))
	);
	assert!(!both.as_str().contains("RecordTypeId"));
}

#[test]
fn countries_are_not_compiled_into_predicate() {
	let query = compile(&FilterCriteria {
		countries: strings(&["Germany"]),
		reportable: vec![ReportableFlag::No, ReportableFlag::Yes, ReportableFlag::No],
		..Default::default()
	})
	.expect("Failed to compile.");

	assert!(!query.as_str().contains("Germany"));
	assert!(query.as_str().contains("At_least_one_Reportable_is_not_CC__c IN ('N', 'Y')"));
}

#[test]
fn invalid_excluded_identifier_is_rejected_before_compilation() {
	let err = compile(&FilterCriteria {
		excluded_complaint: Some("CN-12".to_string()),
		..Default::default()
	})
	.expect_err("Expected validation error.");

	assert!(err.to_string().contains("excluded_complaint"), "Unexpected error: {err}");
}

#[test]
fn grouped_query_has_group_by_clause() {
	let source = FieldName::RdcClarifier.source();
	let query = compiler::compile_grouped(source.object, source.field, &source.conditions());

	assert_eq!(
		query.as_str(),
		"SELECT Clarifier__c FROM CMPL123CME__Complaint_Code__c WHERE CMPL123CME__Type__c IN ('DEVICE CODE') GROUP BY Clarifier__c"
	);
}

#[test]
fn triage_query_targets_open_investigations() {
	let query = compiler::compile_triage();

	assert!(query.as_str().contains("FROM CMPL123CME__Investigations__r"));
	assert!(query.as_str().contains("IN ('Investigation in Progress')"));
	assert!(query.as_str().contains("NOT IN ('OCCL', 'SHDIST', 'SHTPM', 'SURG', 'TRCATH', 'VR')"));
}

#[test]
fn priority_cascade_boundaries() {
	assert_eq!(assign_priority(60, 0, 0), PriorityTier::Tier1);
	assert_eq!(assign_priority(60, 100, 100), PriorityTier::Tier1);
	assert_eq!(assign_priority(10, 15, 0), PriorityTier::Tier2);
	assert_eq!(assign_priority(10, 12, 70), PriorityTier::Tier3);
	assert_eq!(assign_priority(10, 5, 70), PriorityTier::Tier3);
	assert_eq!(assign_priority(10, 5, 59), PriorityTier::Tier4);
}

#[test]
fn bucket_mapping() {
	assert_eq!(bucket("FFR"), "OCT/FFR");
	assert_eq!(bucket("Coroventis"), "OCT/FFR");
	assert_eq!(bucket("DIL"), "DIL");
	assert_eq!(bucket("Unknown"), "Core");
}

#[test]
fn field_names_parse_from_path_segments() {
	assert_eq!("rdc_code".parse::<FieldName>(), Ok(FieldName::RdcCode));
	assert!("nope".parse::<FieldName>().is_err());
}
