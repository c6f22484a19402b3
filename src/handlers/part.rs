use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::PartService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/khatmas/{id}/parts/{part_number}/assign",
    tag = "part",
    params(
        ("id" = i32, Path, description = "Khatma id"),
        ("part_number" = i32, Path, description = "Part number, 1 to 30")
    ),
    request_body = AssignPartRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Part assigned or unassigned", body = KhatmaPartResponse),
        (status = 400, description = "Assignee is not a participant"),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn assign_part(
    part_service: web::Data<PartService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
    request: web::Json<AssignPartRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (khatma_id, part_number) = path.into_inner();

    match part_service
        .assign(user_id, khatma_id, part_number, request.user_id)
        .await
    {
        Ok(part) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": part
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/parts/{part_number}/complete",
    tag = "part",
    params(
        ("id" = i32, Path, description = "Khatma id"),
        ("part_number" = i32, Path, description = "Part number, 1 to 30")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Part completed", body = KhatmaPartResponse),
        (status = 403, description = "Neither assignee nor creator")
    )
)]
pub async fn complete_part(
    part_service: web::Data<PartService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (khatma_id, part_number) = path.into_inner();

    match part_service.complete(user_id, khatma_id, part_number).await {
        Ok(part) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": part
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/parts/{part_number}/uncomplete",
    tag = "part",
    params(
        ("id" = i32, Path, description = "Khatma id"),
        ("part_number" = i32, Path, description = "Part number, 1 to 30")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Part reopened", body = KhatmaPartResponse),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn uncomplete_part(
    part_service: web::Data<PartService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (khatma_id, part_number) = path.into_inner();

    match part_service.uncomplete(user_id, khatma_id, part_number).await {
        Ok(part) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": part
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Registered inside the `/khatmas` scope.
pub fn part_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/{id}/parts/{part_number}/assign",
        web::post().to(assign_part),
    )
    .route(
        "/{id}/parts/{part_number}/complete",
        web::post().to(complete_part),
    )
    .route(
        "/{id}/parts/{part_number}/uncomplete",
        web::post().to(uncomplete_part),
    );
}
