pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::FormatItem, macros::format_description};

pub(crate) const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	Date::parse(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
}

/// Parses the leading `YYYY-MM-DD` of a date or timestamp string.
pub fn parse_date_prefix(raw: &str) -> Option<Date> {
	let prefix = raw.get(..10)?;

	Date::parse(prefix, DATE_FORMAT).ok()
}

pub fn format_date(value: Date) -> String {
	value.format(DATE_FORMAT).unwrap_or_default()
}
