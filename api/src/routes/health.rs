use crate::response::ApiResponse;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use util::state::AppState;

/// Builds the `/health` route group.
///
/// A single `GET /health` endpoint for uptime checks, load balancers, or
/// deployment health monitoring.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: String,
    database: &'static str,
}

/// GET /health
///
/// Returns a simple success response to indicate the API is running, along
/// with whether the persistence layer is reachable.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "ok", "timestamp": "2026-03-02T08:00:00Z", "database": "available" },
///   "message": "Health check passed"
/// }
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: if state.is_available() {
            "available"
        } else {
            "unavailable"
        },
    };
    Json(ApiResponse::success(status, "Health check passed"))
}

#[cfg(test)]
mod tests {
    use super::health_check;
    use axum::body::to_bytes;
    use axum::extract::State;
    use axum::response::IntoResponse;
    use serde_json::Value;
    use util::state::AppState;

    #[tokio::test]
    async fn health_check_reports_degraded_database() {
        let response = health_check(State(AppState::unavailable()))
            .await
            .into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["database"], "unavailable");
        assert_eq!(json["message"], "Health check passed");
    }
}
