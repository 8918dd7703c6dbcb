use axum::Json;

use crate::models::StatusResponse;

pub async fn index() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: Some("Study assistant backend is running"),
    })
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        message: None,
    })
}
