use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::controllers::api_error::ApiError;
use crate::models::bank::{Account, Caller};
use crate::services::register_service::ServiceRegister;

pub fn router() -> Router<ServiceRegister> {
    Router::new()
        .route("/api/accounts", get(list_accounts))
        .route("/api/accounts/:id", get(get_account))
}

async fn list_accounts(
    State(services): State<ServiceRegister>,
    Extension(caller): Extension<Caller>,
) -> Json<Vec<Account>> {
    Json(services.bank_repository.accounts(caller).await)
}

async fn get_account(
    State(services): State<ServiceRegister>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<u32>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(services.bank_repository.account(caller, id).await?))
}
