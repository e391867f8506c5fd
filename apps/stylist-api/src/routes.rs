use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use stylist_service::{
	Error, RecommendRequest, ResponseSource,
	catalog::{self, EnrichedArticles},
};

use crate::state::AppState;

pub const FAILURE_MESSAGE: &str = "Multi-agent system failed to process the query.";

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
	pub summary_text: String,
	pub categorized_articles: EnrichedArticles,
	pub source: ResponseSource,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/agent/recommend", post(recommend))
		.route("/agent/recommend/", post(recommend))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn recommend(
	State(state): State<AppState>,
	payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
	let Json(payload) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
	let span = tracing::info_span!("recommend", request_id = %Uuid::new_v4());

	async move {
		let outcome = state.orchestrator.recommend(payload).await?;
		let categorized_articles =
			catalog::enrich_articles(state.orchestrator.context(), &outcome.response).await;

		Ok(Json(RecommendResponse {
			summary_text: outcome.response.summary_text,
			categorized_articles,
			source: outcome.source,
		}))
	}
	.instrument(span)
	.await
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn bad_request(message: impl Into<String>) -> Self {
		Self { status: StatusCode::BAD_REQUEST, message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => Self::bad_request(message),
			other => {
				tracing::error!(error = %other, "Recommendation failed.");

				Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: FAILURE_MESSAGE.to_string() }
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
