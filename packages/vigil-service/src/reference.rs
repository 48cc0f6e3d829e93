use std::{
	collections::{HashMap, HashSet},
	fs,
	path::Path,
};

use crate::{Error, Result};

/// Countries belonging to the European Economic Area. Loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct EeaReference {
	members: HashSet<String>,
}
impl EeaReference {
	/// Reads a JSON object mapping country name to EEA membership.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path).map_err(|err| Error::Reference {
			message: format!("Failed to read EEA reference at {}: {err}", path.display()),
		})?;

		Self::parse(&raw)
	}

	pub fn parse(raw: &str) -> Result<Self> {
		let table: HashMap<String, bool> = serde_json::from_str(raw).map_err(|err| {
			Error::Reference { message: format!("EEA reference is not a country map: {err}") }
		})?;

		Ok(Self::from_pairs(table))
	}

	pub fn from_pairs<I, S>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (S, bool)>,
		S: Into<String>,
	{
		let members = pairs
			.into_iter()
			.filter_map(|(country, member)| member.then(|| country.into()))
			.collect();

		Self { members }
	}

	pub fn contains(&self, country: &str) -> bool {
		self.members.contains(country)
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}
}
