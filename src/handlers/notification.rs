use crate::middlewares::current_user_id;
use crate::models::*;
use crate::services::NotificationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notification",
    params(NotificationQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Notifications, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notifications(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.list(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCountResponse)
    )
)]
pub async fn unread_count(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.unread_count(user_id).await {
        Ok(count) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": count
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notification",
    params(("id" = i32, Path, description = "Notification id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Marked as read", body = NotificationResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn mark_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.mark_read(user_id, path.into_inner()).await {
        Ok(notification) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": notification
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All marked as read", body = AffectedResponse)
    )
)]
pub async fn mark_all_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.mark_all_read(user_id).await {
        Ok(affected) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": affected
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notification",
    params(("id" = i32, Path, description = "Notification id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_notification(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.delete(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Notification deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/notifications",
    tag = "notification",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All deleted", body = AffectedResponse)
    )
)]
pub async fn delete_all_notifications(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match notification_service.delete_all(user_id).await {
        Ok(affected) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": affected
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn notification_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("", web::delete().to(delete_all_notifications))
            .route("/unread-count", web::get().to(unread_count))
            .route("/read-all", web::post().to(mark_all_read))
            .route("/{id}/read", web::post().to(mark_read))
            .route("/{id}", web::delete().to(delete_notification)),
    );
}
