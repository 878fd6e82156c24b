use std::net::SocketAddr;
use anyhow::{bail, Context};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::Method;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use crate::config::ServeArgs;
use crate::controllers::middleware::{authenticate, require_admin};
use crate::controllers::{accounts, auth, dashboard, health, transactions};
use crate::repositories::bank_repository::BankRepository;
use crate::services::register_service::ServiceRegister;

pub fn app(services: ServiceRegister) -> Router {
    let admin = dashboard::admin_router().route_layer(middleware::from_fn(require_admin));
    let protected = Router::new()
        .merge(accounts::router())
        .merge(transactions::router())
        .merge(dashboard::client_router())
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(services.clone(), authenticate));

    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(protected)
        .with_state(services) // Inject services into handlers as state
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::OPTIONS,
                        ])
                        .allow_headers([AUTHORIZATION, ACCEPT, COOKIE, CONTENT_TYPE])
                        .allow_origin(cors::Any),
                ),
        )
}

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    if args.client_token == args.admin_token {
        bail!("CLIENT_TOKEN and ADMIN_TOKEN must differ");
    }
    let bank_repository = BankRepository::seeded(&args.demo_password);
    let services = ServiceRegister::new(&args, bank_repository);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.server_port));
    info!("Starting mock banking API at {}", addr);

    axum::Server::try_bind(&addr)?
        .serve(app(services).into_make_service())
        .await
        .context("Error starting server")
}
