pub mod compiler;
pub mod date_serde;
pub mod fields;
pub mod filter;
pub mod priority;
pub mod records;

pub use compiler::{CompiledQuery, compile};
pub use fields::{FieldName, FieldSource, UnknownField};
pub use filter::{
	ChildGroupKind, ComplaintStatusFlag, FilterCriteria, RecordType, ReportableFlag,
	ValidationError,
};
pub use priority::{AgeMetrics, PriorityTier, assign_priority, bucket};
