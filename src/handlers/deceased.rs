use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::DeceasedService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/deceased",
    tag = "deceased",
    request_body = CreateDeceasedRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deceased record created", body = DeceasedResponse),
        (status = 400, description = "Invalid dates or fields"),
        (status = 409, description = "Name already recorded")
    )
)]
pub async fn create_deceased(
    deceased_service: web::Data<DeceasedService>,
    req: HttpRequest,
    request: web::Json<CreateDeceasedRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match deceased_service.create(user_id, request.into_inner()).await {
        Ok(deceased) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": deceased
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/deceased",
    tag = "deceased",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Records added by the caller"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_deceased(
    deceased_service: web::Data<DeceasedService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match deceased_service.list(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/deceased/{id}",
    tag = "deceased",
    params(("id" = i32, Path, description = "Deceased id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deceased record", body = DeceasedResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_deceased(
    deceased_service: web::Data<DeceasedService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match deceased_service.get(user_id, path.into_inner()).await {
        Ok(deceased) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": deceased
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/deceased/{id}",
    tag = "deceased",
    params(("id" = i32, Path, description = "Deceased id")),
    request_body = UpdateDeceasedRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deceased record updated", body = DeceasedResponse),
        (status = 400, description = "Invalid dates or fields"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_deceased(
    deceased_service: web::Data<DeceasedService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<UpdateDeceasedRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match deceased_service
        .update(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(deceased) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": deceased
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/deceased/{id}",
    tag = "deceased",
    params(("id" = i32, Path, description = "Deceased id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deceased record deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_deceased(
    deceased_service: web::Data<DeceasedService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match deceased_service.delete(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Deceased record deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn deceased_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/deceased")
            .route("", web::post().to(create_deceased))
            .route("", web::get().to(list_deceased))
            .route("/{id}", web::get().to(get_deceased))
            .route("/{id}", web::put().to(update_deceased))
            .route("/{id}", web::delete().to(delete_deceased)),
    );
}
