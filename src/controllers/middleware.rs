use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::controllers::api_error::ApiError;
use crate::error::BankError;
use crate::models::bank::Caller;
use crate::services::register_service::ServiceRegister;

/// Literal `Authorization: Bearer <token>` match against the configured tokens.
pub async fn authenticate<B>(
    State(services): State<ServiceRegister>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, ApiError> {
    let caller = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| services.tokens.caller_for(token.trim()))
        .ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

pub async fn require_admin<B>(req: Request<B>, next: Next<B>) -> Result<Response, ApiError> {
    match req.extensions().get::<Caller>() {
        Some(caller) if caller.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(BankError::Forbidden.into()),
        None => Err(ApiError::Unauthorized),
    }
}
