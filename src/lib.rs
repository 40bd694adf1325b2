pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::DbPool;
use modules::auth::auth_routes;
use modules::auth::crud::{MySqlOneTimeCodes, MySqlRefreshTokens, MySqlUserDirectory};
use modules::auth::interface::CodeDelivery;
use modules::auth::service::AuthService;
use services::jwt::JwtService;
use services::rate_limit::{create_rate_limiter, enforce};
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: Arc<JwtService>,
    pub auth: AuthService,
}

pub async fn create_app(
    db: DbPool,
    jwt_service: JwtService,
    token_pepper: String,
    mailer: Arc<dyn CodeDelivery>,
) -> Router {
    let jwt_service = Arc::new(jwt_service);

    let auth = AuthService::new(
        Arc::new(MySqlUserDirectory::new(db.clone())),
        Arc::new(MySqlOneTimeCodes::new(db.clone())),
        Arc::new(MySqlRefreshTokens::new(db.clone())),
        mailer,
        jwt_service.clone(),
        token_pepper,
    );

    let state = Arc::new(AppState {
        db,
        jwt_service,
        auth,
    });

    // Coarse global limit; the auth core has its own per-account cooldowns.
    let rate_limiter = create_rate_limiter(50);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(middleware::from_fn(
            move |request: axum::extract::Request, next: middleware::Next| {
                enforce(rate_limiter.clone(), request, next)
            },
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Timebook Auth API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
