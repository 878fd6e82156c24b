use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tracing::info;

use crate::controllers::api_error::ApiError;
use crate::models::bank::{Caller, Transaction, TransactionQuery, TransferReceipt, TransferRequest};
use crate::services::register_service::ServiceRegister;

pub fn router() -> Router<ServiceRegister> {
    Router::new()
        .route("/api/transactions", get(list_transactions))
        .route("/api/transfers", post(create_transfer))
}

async fn list_transactions(
    State(services): State<ServiceRegister>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(services.bank_repository.transactions(caller, &query).await?))
}

async fn create_transfer(
    State(services): State<ServiceRegister>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferReceipt>), ApiError> {
    let receipt = services.bank_repository.transfer(caller, &body).await?;
    info!(
        "Transfer {} of {} {} from account {} to {}",
        receipt.reference, receipt.amount, receipt.currency, receipt.from_account_id, receipt.to_account_id
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}
