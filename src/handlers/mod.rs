pub mod auth;
pub mod resource;

use axum::{
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AdminCredentials, JwtSessionAuth, SessionAuth};
use crate::config::AppConfig;
use crate::upstream::{ContentService, HttpContentService};

pub use resource::{require_fields, HandlerConfig, ResourceConfig, Validation};

/// Injected collaborators: the auth service, the upstream content-service
/// client, and the admin login credentials. All explicit so tests can swap
/// them wholesale without touching process-wide config.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn SessionAuth>,
    pub upstream: Arc<dyn ContentService>,
    pub credentials: AdminCredentials,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let auth = JwtSessionAuth::new(
            config.security.jwt_secret.clone(),
            config.security.session_expiry_hours as i64,
        );
        let upstream = HttpContentService::new(
            &config.upstream.base_url,
            config.upstream.api_token.clone(),
            Duration::from_secs(config.upstream.timeout_secs),
        )?;

        let credentials = AdminCredentials::new(
            config.security.admin_email.clone(),
            config.security.admin_password.clone(),
        );

        Ok(Self {
            auth: Arc::new(auth),
            upstream: Arc::new(upstream),
            credentials,
        })
    }
}

/// Assemble the full router: public root/health/auth routes plus one route
/// pair per configured resource.
pub fn app(state: AppState, resources: impl IntoIterator<Item = ResourceConfig>) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session));

    for config in resources {
        router = router.merge(resource::routes(config));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resources this storefront fronts. Products carry the one concrete
/// validation rule the admin UI relies on.
pub fn storefront_resources() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::new("products").validate(require_fields(&["name"])),
        ResourceConfig::new("categories").validate(require_fields(&["name"])),
        ResourceConfig::new("stages"),
        ResourceConfig::new("notifications"),
    ]
}

/// Bootstrap the gateway from the process-wide config.
pub async fn serve(port_override: Option<u16>) -> anyhow::Result<()> {
    let config = crate::config::config();
    let state = AppState::from_config(config)?;
    let app = app(state, storefront_resources());

    let port = port_override.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Vitrine gateway listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Vitrine Gateway",
        "version": version,
        "description": "Session-gated CRUD proxy in front of a headless content service",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/auth/login, /auth/session",
            "resources": "/resource/:endpoint[/:id] (auth per resource config)",
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
