use serde::{Serialize, Serializer};
use time::Date;

/// Complaint age in days at which a record is urgent.
pub const AGE_THRESHOLD_DAYS: i64 = 60;
/// Days in the investigation queue after which a record is escalated.
pub const QUEUE_THRESHOLD_DAYS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityTier {
	/// Already 60 days old.
	Tier1,
	/// More than 12 days in the investigation queue.
	Tier2,
	/// Will be 60 days old at the end of the month.
	Tier3,
	Tier4,
}
impl PriorityTier {
	pub fn rank(self) -> u8 {
		match self {
			Self::Tier1 => 1,
			Self::Tier2 => 2,
			Self::Tier3 => 3,
			Self::Tier4 => 4,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Tier1 => "Priority 1 (> 60 days old now)",
			Self::Tier2 => "Priority 2 (> 12 days in queue)",
			Self::Tier3 => "Priority 3 (> 60 days old at EOM)",
			Self::Tier4 => "Priority 4",
		}
	}
}
impl Serialize for PriorityTier {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u8(self.rank())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeMetrics {
	pub age_of_complaint: i64,
	pub age_at_end_of_month: i64,
	pub days_in_queue: i64,
}
impl AgeMetrics {
	pub fn compute(today: Date, alert_date: Date, queue_entered: Date) -> Self {
		Self {
			age_of_complaint: (today - alert_date).whole_days(),
			age_at_end_of_month: (end_of_month(today) - alert_date).whole_days(),
			days_in_queue: (today - queue_entered).whole_days(),
		}
	}

	pub fn tier(&self) -> PriorityTier {
		assign_priority(self.age_of_complaint, self.days_in_queue, self.age_at_end_of_month)
	}
}

/// First matching rule wins.
pub fn assign_priority(
	age_of_complaint: i64,
	days_in_queue: i64,
	age_at_end_of_month: i64,
) -> PriorityTier {
	if age_of_complaint >= AGE_THRESHOLD_DAYS {
		return PriorityTier::Tier1;
	}
	if days_in_queue > QUEUE_THRESHOLD_DAYS {
		return PriorityTier::Tier2;
	}
	if age_at_end_of_month >= AGE_THRESHOLD_DAYS {
		return PriorityTier::Tier3;
	}

	PriorityTier::Tier4
}

pub fn bucket(category: &str) -> &'static str {
	match category {
		"FFR" | "OCT" | "Coroventis" => "OCT/FFR",
		"VC" => "VC",
		"EPS" => "EPS",
		"GW" => "GW",
		"DIL" => "DIL",
		"SES" => "SES",
		_ => "Core",
	}
}

pub fn end_of_month(date: Date) -> Date {
	let last = date.month().length(date.year());

	date.replace_day(last).unwrap_or(date)
}
