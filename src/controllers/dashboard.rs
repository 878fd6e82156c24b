use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::controllers::api_error::ApiError;
use crate::models::bank::{AdminDashboard, Caller, ClientDashboard};
use crate::services::register_service::ServiceRegister;

pub fn client_router() -> Router<ServiceRegister> {
    Router::new().route("/api/client/dashboard", get(client_dashboard))
}

pub fn admin_router() -> Router<ServiceRegister> {
    Router::new().route("/api/admin/dashboard", get(admin_dashboard))
}

async fn client_dashboard(
    State(services): State<ServiceRegister>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<ClientDashboard>, ApiError> {
    Ok(Json(services.bank_repository.client_dashboard(caller).await?))
}

async fn admin_dashboard(State(services): State<ServiceRegister>) -> Json<AdminDashboard> {
    Json(services.bank_repository.admin_dashboard().await)
}
