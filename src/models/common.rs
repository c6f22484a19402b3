use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of rows touched by a bulk operation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AffectedResponse {
    pub affected: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
}
