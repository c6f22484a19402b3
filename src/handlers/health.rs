use crate::database::DbPool;
use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result, web};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    match pool.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(HealthResponse {
            status: "ok".to_string(),
            database: true,
        })),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded".to_string(),
                database: false,
            }))
        }
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
