use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::controllers::api_error::ApiError;
use crate::models::bank::{LoginRequest, LoginResponse};
use crate::services::register_service::ServiceRegister;

pub fn router() -> Router<ServiceRegister> {
    Router::new().route("/api/auth/login", post(login))
}

async fn login(
    State(services): State<ServiceRegister>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = services
        .bank_repository
        .authenticate(&body.username, &body.password)
        .await
        .ok_or(ApiError::Unauthorized)?;
    info!("User {} logged in", user.username);
    Ok(Json(LoginResponse {
        token: services.tokens.token_for(user.role).to_string(),
        role: user.role,
        user,
    }))
}
