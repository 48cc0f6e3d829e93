use serde::{Deserialize, Serialize};

/// Nested child relationship as returned inside a parent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildCollection<T> {
	#[serde(rename = "totalSize", default)]
	pub total_size: u64,
	#[serde(default = "Vec::new")]
	pub records: Vec<T>,
}
impl<T> ChildCollection<T> {
	pub fn is_empty(&self) -> bool {
		self.total_size == 0 && self.records.is_empty()
	}
}
impl<T> Default for ChildCollection<T> {
	fn default() -> Self {
		Self { total_size: 0, records: Vec::new() }
	}
}

/// One complaint row. Scalars stay optional so incomplete rows decode and can be counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
	#[serde(rename = "Product_Segment__c", default)]
	pub product_segment: Option<String>,
	#[serde(rename = "Date_of_Event__c", default)]
	pub date_of_event: Option<String>,
	#[serde(rename = "Reportable_Country__c", default)]
	pub reportable_country: Option<String>,
	#[serde(rename = "CMPL123CME__CMPL123_WF_Status__c", default)]
	pub status: Option<String>,
	#[serde(rename = "Alert_Date__c", default)]
	pub alert_date: Option<String>,
	/// Timestamp at which the complaint entered the investigation queue.
	#[serde(rename = "Investigation_Done_On__c", default)]
	pub investigation_started: Option<String>,
	#[serde(rename = "At_least_one_Reportable_is_not_CC__c", default)]
	pub reportable: Option<String>,
	#[serde(rename = "CMPL123CME__Product__r", default)]
	pub product: Option<ProductRef>,
	#[serde(rename = "RDC_Codes__r", default)]
	pub device_codes: Option<ChildCollection<DeviceCode>>,
	#[serde(rename = "Patient_Codes__r", default)]
	pub patient_codes: Option<ChildCollection<PatientCode>>,
	#[serde(rename = "Engineering_Codings__r", default)]
	pub evaluation_codings: Option<ChildCollection<ChildId>>,
	#[serde(rename = "CMPL123CME__Investigations__r", default)]
	pub investigations: Option<ChildCollection<Investigation>>,
	#[serde(rename = "CMPL123CME__Questionnaires__r", default)]
	pub questionnaires: Option<ChildCollection<QuestionnaireAnswer>>,
	#[serde(rename = "Letter_Requests__r", default)]
	pub letter_requests: Option<ChildCollection<LetterRequest>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
	#[serde(rename = "Product_Category_Formula__c", default)]
	pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCode {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Code__c", default)]
	pub code: Option<String>,
	#[serde(rename = "Name__c", default)]
	pub name: Option<String>,
	#[serde(rename = "Clarifier__c", default)]
	pub clarifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientCode {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Code__c", default)]
	pub code: Option<String>,
	#[serde(rename = "Name__c", default)]
	pub name: Option<String>,
	#[serde(rename = "Clarifier__c", default)]
	pub clarifier: Option<String>,
	#[serde(rename = "Anatomy__c", default)]
	pub anatomy: Option<String>,
	#[serde(rename = "Severity__c", default)]
	pub severity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildId {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigation {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
	#[serde(rename = "OwnerId", default)]
	pub owner_id: Option<String>,
	#[serde(rename = "CMPL123_WF_Status__c", default)]
	pub status: Option<String>,
}
impl Investigation {
	pub fn is_open(&self) -> bool {
		!self.status.as_deref().map(|status| status.starts_with("Closed")).unwrap_or(false)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireAnswer {
	#[serde(rename = "CMPL123CME__Key_value__c", default)]
	pub key_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRequest {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
}

/// Row of a `SELECT Id, Name FROM User` lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
	#[serde(rename = "Id", default)]
	pub id: Option<String>,
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_nested_collections_and_nulls() {
		let record: ComplaintRecord = serde_json::from_value(serde_json::json!({
			"attributes": { "type": "CMPL123CME__Complaint__c" },
			"Id": "a0X1",
			"Name": "CN-000001",
			"Product_Segment__c": null,
			"CMPL123CME__Product__r": { "Name": "Stent", "Product_Category_Formula__c": "SES" },
			"Patient_Codes__r": {
				"totalSize": 1,
				"done": true,
				"records": [{ "Code__c": "E0101", "Severity__c": 3.0 }]
			},
			"RDC_Codes__r": null
		}))
		.expect("Failed to decode record.");

		assert_eq!(record.id.as_deref(), Some("a0X1"));
		assert!(record.product_segment.is_none());
		assert!(record.device_codes.is_none());

		let patient = record.patient_codes.expect("Expected patient codes.");

		assert_eq!(patient.records[0].severity, Some(3.0));
		assert_eq!(
			record.product.and_then(|product| product.category).as_deref(),
			Some("SES")
		);
	}

	#[test]
	fn closed_investigations_are_not_open() {
		let closed = Investigation {
			status: Some("Closed - Complete".to_string()),
			..Default::default()
		};
		let open = Investigation {
			status: Some("Investigation in Progress".to_string()),
			..Default::default()
		};

		assert!(!closed.is_open());
		assert!(open.is_open());
		assert!(Investigation::default().is_open());
	}
}
