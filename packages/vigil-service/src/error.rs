use vigil_domain::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Authentication failed: remote returned status {status}.")]
	Authentication { status: u16 },
	#[error("Remote query error: {message}")]
	RemoteQuery { message: String },
	#[error("Pagination inconsistency: {message}")]
	PaginationInconsistency { message: String },
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("Complaint {complaint} has {open} open investigations.")]
	AmbiguousInvestigation { complaint: String, open: usize },
	#[error("Reference data error: {message}")]
	Reference { message: String },
	#[error("Task error: {message}")]
	Task { message: String },
}
impl From<vigil_remote::Error> for Error {
	fn from(err: vigil_remote::Error) -> Self {
		match err {
			vigil_remote::Error::Authentication { status } => Self::Authentication { status },
			other => Self::RemoteQuery { message: other.to_string() },
		}
	}
}
