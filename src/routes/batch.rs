use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;

use crate::{
    dto::batch_dto::{
        BatchNoticeResponse, BatchRequest, BatchSummaryResponse, FULLY_COVERED_MESSAGE,
        NO_CONTENT_MESSAGE,
    },
    error::{Error, Result},
    models::{batch::BackfillOutcome, identity::Identity},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/admin/batch-generate-quizzes",
    request_body(content = BatchRequest, description = "Optional; defaults to limit 10"),
    responses(
        (status = 200, description = "Run finished, possibly with per-book errors", body = BatchSummaryResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Run could not complete", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn batch_generate_quizzes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<Response> {
    let request = BatchRequest::from_body(&body);
    let limit = state.backfill_service.effective_limit(request.limit);
    tracing::info!(user_id = %identity.user_id, limit, "Batch quiz generation requested");

    let outcome = state
        .backfill_service
        .run(limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Batch quiz generation failed");
            Error::batch_failed(e)
        })?;

    let response = match outcome {
        BackfillOutcome::NoContent => Json(BatchNoticeResponse::new(NO_CONTENT_MESSAGE)).into_response(),
        BackfillOutcome::FullyCovered => {
            Json(BatchNoticeResponse::new(FULLY_COVERED_MESSAGE)).into_response()
        }
        BackfillOutcome::Completed(summary) => {
            Json(BatchSummaryResponse::from(summary)).into_response()
        }
    };
    Ok(response)
}
