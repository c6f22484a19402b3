use crate::handlers::part::part_routes;
use crate::middlewares::{current_user_id, optional_user_id};
use crate::models::*;
use crate::services::KhatmaService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/khatmas",
    tag = "khatma",
    request_body = CreateKhatmaRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Khatma created with its 30 parts", body = KhatmaResponse),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Not allowed to create in this group"),
        (status = 409, description = "Title already used")
    )
)]
pub async fn create_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    request: web::Json<CreateKhatmaRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.create(user_id, request.into_inner()).await {
        Ok(khatma) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": khatma
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/public",
    tag = "khatma",
    params(KhatmaQuery),
    responses(
        (status = 200, description = "Public khatmas")
    )
)]
pub async fn list_public_khatmas(
    khatma_service: web::Data<KhatmaService>,
    query: web::Query<KhatmaQuery>,
) -> Result<HttpResponse> {
    match khatma_service.list_public(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/mine",
    tag = "khatma",
    params(KhatmaQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Khatmas the caller participates in"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_khatmas(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    query: web::Query<KhatmaQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.list_mine(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/shared/{sharing_link}",
    tag = "khatma",
    params(("sharing_link" = String, Path, description = "Sharing link")),
    responses(
        (status = 200, description = "Shared khatma", body = KhatmaDetailResponse),
        (status = 404, description = "Unknown link")
    )
)]
pub async fn get_shared_khatma(
    khatma_service: web::Data<KhatmaService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match khatma_service.get_shared(&path).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/{id}",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    responses(
        (status = 200, description = "Khatma with parts and progress", body = KhatmaDetailResponse),
        (status = 403, description = "Private khatma"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match khatma_service
        .get(optional_user_id(&req), path.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/khatmas/{id}",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    request_body = UpdateKhatmaRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Khatma updated", body = KhatmaResponse),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<UpdateKhatmaRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service
        .update(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(khatma) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": khatma
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/khatmas/{id}",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Khatma deleted"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.delete(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Khatma deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/complete",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All parts completed", body = KhatmaResponse),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn complete_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.complete(user_id, path.into_inner()).await {
        Ok(khatma) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": khatma
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/share",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Share link and message", body = ShareKhatmaResponse),
        (status = 403, description = "Neither creator nor participant")
    )
)]
pub async fn share_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.share(user_id, path.into_inner()).await {
        Ok(share) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": share
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/{id}/progress",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    responses(
        (status = 200, description = "Completion progress", body = KhatmaProgressResponse),
        (status = 403, description = "Private khatma"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_progress(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match khatma_service
        .progress(optional_user_id(&req), path.into_inner())
        .await
    {
        Ok(progress) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": progress
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/join",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Joined", body = ParticipantResponse),
        (status = 400, description = "Participant limit reached"),
        (status = 409, description = "Already participating")
    )
)]
pub async fn join_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.join(user_id, path.into_inner()).await {
        Ok(participant) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": participant
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/khatmas/{id}/leave",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Left the khatma"),
        (status = 400, description = "The creator cannot leave"),
        (status = 404, description = "Not a participant")
    )
)]
pub async fn leave_khatma(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.leave(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Left the khatma"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/khatmas/{id}/participants",
    tag = "khatma",
    params(("id" = i32, Path, description = "Khatma id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Participants", body = [ParticipantResponse]),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn list_participants(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match khatma_service.participants(user_id, path.into_inner()).await {
        Ok(participants) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": participants
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/khatmas/{id}/participants/{user_id}",
    tag = "khatma",
    params(
        ("id" = i32, Path, description = "Khatma id"),
        ("user_id" = i32, Path, description = "Participant to remove")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Participant removed"),
        (status = 400, description = "The creator cannot be removed"),
        (status = 403, description = "Not the creator")
    )
)]
pub async fn remove_participant(
    khatma_service: web::Data<KhatmaService>,
    req: HttpRequest,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (khatma_id, target_user_id) = path.into_inner();

    match khatma_service
        .remove_participant(user_id, khatma_id, target_user_id)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Participant removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn khatma_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/khatmas")
            .route("", web::post().to(create_khatma))
            .route("/public", web::get().to(list_public_khatmas))
            .route("/mine", web::get().to(list_my_khatmas))
            .route("/shared/{sharing_link}", web::get().to(get_shared_khatma))
            .route("/{id}", web::get().to(get_khatma))
            .route("/{id}", web::put().to(update_khatma))
            .route("/{id}", web::delete().to(delete_khatma))
            .route("/{id}/complete", web::post().to(complete_khatma))
            .route("/{id}/share", web::post().to(share_khatma))
            .route("/{id}/progress", web::get().to(get_progress))
            .route("/{id}/join", web::post().to(join_khatma))
            .route("/{id}/leave", web::post().to(leave_khatma))
            .route("/{id}/participants", web::get().to(list_participants))
            .route(
                "/{id}/participants/{user_id}",
                web::delete().to(remove_participant),
            )
            .configure(part_routes),
    );
}
