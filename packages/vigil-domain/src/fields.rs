use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fields whose distinct values are offered as filter choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
	ProductSegment,
	RdcCode,
	RdcClarifier,
	PcCode,
	ResultCode,
	ConclusionCode,
	Country,
}
impl FieldName {
	pub const ALL: [Self; 7] = [
		Self::ProductSegment,
		Self::RdcCode,
		Self::RdcClarifier,
		Self::PcCode,
		Self::ResultCode,
		Self::ConclusionCode,
		Self::Country,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ProductSegment => "product_segment",
			Self::RdcCode => "rdc_code",
			Self::RdcClarifier => "rdc_clarifier",
			Self::PcCode => "pc_code",
			Self::ResultCode => "result_code",
			Self::ConclusionCode => "conclusion_code",
			Self::Country => "country",
		}
	}

	pub fn source(self) -> FieldSource {
		const CODE_OBJECT: &str = "CMPL123CME__Complaint_Code__c";

		match self {
			Self::ProductSegment =>
				FieldSource { object: "Product_Segment__c", field: "Name", conditions: &[] },
			Self::RdcCode => FieldSource {
				object: CODE_OBJECT,
				field: "Name",
				conditions: &["CMPL123CME__Type__c IN ('DEVICE CODE')"],
			},
			Self::RdcClarifier => FieldSource {
				object: CODE_OBJECT,
				field: "Clarifier__c",
				conditions: &["CMPL123CME__Type__c IN ('DEVICE CODE')"],
			},
			Self::PcCode => FieldSource {
				object: CODE_OBJECT,
				field: "Name",
				conditions: &[
					"CMPL123CME__Type__c IN ('HEALTH EFFECT - CLINICAL CODE', 'HEALTH EFFECT - IMPACT CODE')",
				],
			},
			Self::ResultCode => FieldSource {
				object: CODE_OBJECT,
				field: "Name",
				conditions: &["CMPL123CME__Type__c IN ('EVAL RESULT CODE')"],
			},
			Self::ConclusionCode => FieldSource {
				object: CODE_OBJECT,
				field: "Name",
				conditions: &["CMPL123CME__Type__c IN ('EVAL CONCLUSION CODE')"],
			},
			Self::Country =>
				FieldSource { object: "Country__c", field: "Country_Name__c", conditions: &[] },
		}
	}
}
impl fmt::Display for FieldName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for FieldName {
	type Err = UnknownField;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|field| field.as_str() == raw)
			.ok_or_else(|| UnknownField(raw.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown field '{0}'.")]
pub struct UnknownField(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSource {
	pub object: &'static str,
	pub field: &'static str,
	pub conditions: &'static [&'static str],
}
impl FieldSource {
	pub fn conditions(&self) -> Vec<String> {
		self.conditions.iter().map(|condition| condition.to_string()).collect()
	}
}
