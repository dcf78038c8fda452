use axum::Json;

/// GET /utils/health-check/ - liveness only, touches nothing
pub async fn health_check() -> Json<bool> {
    Json(true)
}
