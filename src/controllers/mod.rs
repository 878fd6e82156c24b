pub mod accounts;
pub mod api_error;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod middleware;
pub mod server;
pub mod transactions;
