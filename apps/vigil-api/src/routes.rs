use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use vigil_domain::{FieldName, FilterCriteria};
use vigil_service::{
	CodeTrend, ComplaintReport, Error as ServiceError, TrendRequest, TriageReport, TriageView,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/fields/{field}", get(field_values))
		.route("/v1/complaints", post(complaints))
		.route("/v1/triage", get(triage))
		.route("/v1/trends", post(trends))
		.with_state(state)
}

#[derive(Debug, Serialize)]
pub struct FieldValuesResponse {
	pub field: FieldName,
	pub values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TriageParams {
	#[serde(default)]
	pub view: TriageView,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
	pub trends: Vec<CodeTrend>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation(err) => ApiError::new(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				err.to_string(),
				Some(vec![err.filter.to_string()]),
			),
			ServiceError::Authentication { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "remote_authentication", err.to_string(), None),
			ServiceError::RemoteQuery { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "remote_query", err.to_string(), None),
			ServiceError::PaginationInconsistency { .. } => ApiError::new(
				StatusCode::BAD_GATEWAY,
				"pagination_inconsistency",
				err.to_string(),
				None,
			),
			ServiceError::AmbiguousInvestigation { .. } =>
				ApiError::new(StatusCode::CONFLICT, "ambiguous_investigation", err.to_string(), None),
			ServiceError::Reference { .. } | ServiceError::Task { .. } => {
				tracing::error!(error = %err, "Request failed.");

				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string(), None)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn field_values(
	State(state): State<AppState>,
	Path(field): Path<String>,
) -> Result<Json<FieldValuesResponse>, ApiError> {
	let field: FieldName = field.parse().map_err(|err: vigil_domain::UnknownField| {
		ApiError::new(StatusCode::NOT_FOUND, "unknown_field", err.to_string(), None)
	})?;
	let values = state.service.field_values(field).await?;

	Ok(Json(FieldValuesResponse { field, values }))
}

async fn complaints(
	State(state): State<AppState>,
	Json(criteria): Json<FilterCriteria>,
) -> Result<Json<ComplaintReport>, ApiError> {
	let report = state.service.complaints(&criteria).await?;

	Ok(Json(report))
}

async fn triage(
	State(state): State<AppState>,
	Query(params): Query<TriageParams>,
) -> Result<Json<TriageReport>, ApiError> {
	let report = state.service.triage(params.view).await?;

	Ok(Json(report))
}

async fn trends(
	State(state): State<AppState>,
	Json(request): Json<TrendRequest>,
) -> Result<Json<TrendsResponse>, ApiError> {
	let trends = state.service.code_trends(&request.criteria, &request.device_codes).await?;

	Ok(Json(TrendsResponse { trends }))
}
