use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::ReadingService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/readings",
    tag = "reading",
    request_body = StartReadingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reading started", body = ReadingResponse),
        (status = 403, description = "Not a participant"),
        (status = 409, description = "Reading already recorded for this part")
    )
)]
pub async fn start_reading(
    reading_service: web::Data<ReadingService>,
    req: HttpRequest,
    request: web::Json<StartReadingRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match reading_service.start(user_id, request.into_inner()).await {
        Ok(reading) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": reading
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/readings",
    tag = "reading",
    params(ReadingQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The caller's readings"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_readings(
    reading_service: web::Data<ReadingService>,
    req: HttpRequest,
    query: web::Query<ReadingQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match reading_service.list(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/readings/{id}/status",
    tag = "reading",
    params(("id" = i32, Path, description = "Reading id")),
    request_body = UpdateReadingStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Status changed", body = ReadingResponse),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_reading_status(
    reading_service: web::Data<ReadingService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<UpdateReadingStatusRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match reading_service
        .update_status(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(reading) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": reading
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn reading_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/readings")
            .route("", web::post().to(start_reading))
            .route("", web::get().to(list_readings))
            .route("/{id}/status", web::put().to(update_reading_status)),
    );
}
