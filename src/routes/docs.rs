use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::dto::batch_dto::{BatchNoticeResponse, BatchRequest, BatchSummaryResponse, ErrorResponse};
use crate::models::{
    batch::BatchResult,
    book::Difficulty,
    stats::{AdminStats, DailyActivity},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::batch::batch_generate_quizzes,
        crate::routes::stats::admin_stats,
        crate::routes::stats::quiz_activity,
        crate::routes::health::health,
    ),
    components(schemas(
        BatchRequest,
        BatchSummaryResponse,
        BatchNoticeResponse,
        BatchResult,
        Difficulty,
        AdminStats,
        DailyActivity,
        ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags((name = "quiz-backfill", description = "Quiz coverage backfill administration"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
