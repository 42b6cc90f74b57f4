use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use casematch_service::{
	BillingAnalysis, BillingAnalysisRequest, SearchOutcome, SearchRequest,
	SearchWithBillingResponse, ServiceError,
};
use serde::Serialize;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/admissions/search", post(search))
		.route("/v1/admissions/search_billing", post(search_billing))
		.route("/v1/admissions/billing_analysis", post(billing_analysis))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn search_billing(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchWithBillingResponse>, ApiError> {
	let response = state.service.search_with_billing(payload).await?;

	Ok(Json(response))
}

async fn billing_analysis(
	State(state): State<AppState>,
	Json(payload): Json<BillingAnalysisRequest>,
) -> Result<Json<BillingAnalysis>, ApiError> {
	let response = state.service.billing_analysis(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InvalidRequest { .. } =>
				(StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
			ServiceError::Collaborator { .. } => (StatusCode::BAD_GATEWAY, "collaborator_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
