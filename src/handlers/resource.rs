use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Output transformation applied to successful upstream results before they
/// are returned to the client. Default is identity.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Body validation for create/update. Default accepts everything.
pub type Validate = Arc<dyn Fn(&Value) -> Validation + Send + Sync>;

/// Outcome of running a validator against a request body.
pub struct Validation {
    pub valid: bool,
    pub details: Value,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            details: Value::Array(Vec::new()),
        }
    }

    pub fn rejected(details: Value) -> Self {
        Self {
            valid: false,
            details,
        }
    }
}

/// Per-verb handler configuration. Built once at route registration,
/// immutable afterwards, shared by every invocation of that route. The
/// endpoint is bound here explicitly rather than recovered from the URL.
#[derive(Clone)]
pub struct HandlerConfig {
    pub endpoint: String,
    pub require_auth: bool,
    pub transform: Transform,
    pub validate: Validate,
}

impl HandlerConfig {
    /// Read configuration: open by default.
    pub fn read(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            require_auth: false,
            transform: identity(),
            validate: always_valid(),
        }
    }

    /// Write configuration: authenticated by default.
    pub fn write(endpoint: impl Into<String>) -> Self {
        Self {
            require_auth: true,
            ..Self::read(endpoint)
        }
    }
}

/// Full configuration of one proxied resource: one `HandlerConfig` per verb,
/// all bound to the same endpoint name.
#[derive(Clone)]
pub struct ResourceConfig {
    pub list: HandlerConfig,
    pub get: HandlerConfig,
    pub create: HandlerConfig,
    pub update: HandlerConfig,
    pub delete: HandlerConfig,
}

impl ResourceConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            list: HandlerConfig::read(endpoint),
            get: HandlerConfig::read(endpoint),
            create: HandlerConfig::write(endpoint),
            update: HandlerConfig::write(endpoint),
            delete: HandlerConfig::write(endpoint),
        }
    }

    /// Gate every verb (reads included) behind session authentication.
    pub fn require_auth(mut self, on: bool) -> Self {
        self.list.require_auth = on;
        self.get.require_auth = on;
        self.create.require_auth = on;
        self.update.require_auth = on;
        self.delete.require_auth = on;
        self
    }

    /// Apply an output transform to list/get/create/update results.
    pub fn transform(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        let f: Transform = Arc::new(f);
        self.list.transform = f.clone();
        self.get.transform = f.clone();
        self.create.transform = f.clone();
        self.update.transform = f;
        self
    }

    /// Validate create/update bodies before any upstream call is made.
    pub fn validate(mut self, f: impl Fn(&Value) -> Validation + Send + Sync + 'static) -> Self {
        let f: Validate = Arc::new(f);
        self.create.validate = f.clone();
        self.update.validate = f;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.list.endpoint
    }
}

fn identity() -> Transform {
    Arc::new(|data| data)
}

fn always_valid() -> Validate {
    Arc::new(|_| Validation::ok())
}

/// Validator rejecting bodies where any of the given fields is missing, null,
/// or a blank string.
pub fn require_fields(fields: &[&str]) -> impl Fn(&Value) -> Validation + Send + Sync + 'static {
    let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    move |body: &Value| {
        let mut details = Vec::new();
        for field in &fields {
            let present = match body.get(field) {
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            };
            if !present {
                details.push(json!({
                    "field": field,
                    "message": format!("'{}' es obligatorio", field),
                }));
            }
        }
        if details.is_empty() {
            Validation::ok()
        } else {
            Validation::rejected(Value::Array(details))
        }
    }
}

/// Build the routes for one resource:
/// `/resource/{endpoint}` (GET list, POST create) and
/// `/resource/{endpoint}/:id` (GET one, PUT update, DELETE remove).
pub fn routes(config: ResourceConfig) -> Router<AppState> {
    let collection_path = format!("/resource/{}", config.endpoint());
    let item_path = format!("{}/:id", collection_path);

    let ResourceConfig {
        list: list_cfg,
        get: get_cfg,
        create: create_cfg,
        update: update_cfg,
        delete: delete_cfg,
    } = config;

    Router::new()
        .route(
            &collection_path,
            get(
                move |State(state): State<AppState>,
                      headers: HeaderMap,
                      Query(params): Query<HashMap<String, String>>| {
                    list(state, list_cfg.clone(), headers, params)
                },
            )
            .post(
                move |State(state): State<AppState>, headers: HeaderMap, body: Bytes| {
                    create(state, create_cfg.clone(), headers, body)
                },
            ),
        )
        .route(
            &item_path,
            get(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      headers: HeaderMap,
                      Query(params): Query<HashMap<String, String>>| {
                    get_by_id(state, get_cfg.clone(), headers, id, params)
                },
            )
            .put(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      headers: HeaderMap,
                      body: Bytes| {
                    update(state, update_cfg.clone(), headers, id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, Path(id): Path<String>, headers: HeaderMap| {
                    delete(state, delete_cfg.clone(), headers, id)
                },
            ),
        )
}

/// Auth gate shared by every verb. Runs before anything else; on failure the
/// upstream client is never touched.
fn check_auth(state: &AppState, cfg: &HandlerConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    if !cfg.require_auth {
        return Ok(());
    }
    match state.auth.get_session(headers) {
        Some(session) => {
            tracing::debug!(user = %session.email, endpoint = %cfg.endpoint, "authenticated request");
            Ok(())
        }
        None => Err(ApiError::unauthorized()),
    }
}

/// Malformed bodies map to the 500 catch-all, not a parse-level 400; only a
/// validator rejection produces 400.
fn parse_body(cfg: &HandlerConfig, body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(endpoint = %cfg.endpoint, error = %e, "failed to parse request body");
        ApiError::internal(format!("body parse: {}", e))
    })
}

fn upstream_failure(verb: &str, cfg: &HandlerConfig, e: crate::upstream::UpstreamError) -> ApiError {
    tracing::error!(endpoint = %cfg.endpoint, verb, error = %e, "upstream call failed");
    ApiError::internal(e.to_string())
}

async fn list(
    state: AppState,
    cfg: HandlerConfig,
    headers: HeaderMap,
    params: HashMap<String, String>,
) -> Result<Response, ApiError> {
    check_auth(&state, &cfg, &headers)?;

    let data = state
        .upstream
        .list(&cfg.endpoint, &params)
        .await
        .map_err(|e| upstream_failure("list", &cfg, e))?;

    Ok(Json((cfg.transform)(data)).into_response())
}

async fn get_by_id(
    state: AppState,
    cfg: HandlerConfig,
    headers: HeaderMap,
    id: String,
    params: HashMap<String, String>,
) -> Result<Response, ApiError> {
    check_auth(&state, &cfg, &headers)?;

    let data = state
        .upstream
        .get(&cfg.endpoint, &id, &params)
        .await
        .map_err(|e| upstream_failure("get", &cfg, e))?;

    Ok(Json((cfg.transform)(data)).into_response())
}

async fn create(
    state: AppState,
    cfg: HandlerConfig,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_auth(&state, &cfg, &headers)?;

    let body = parse_body(&cfg, &body)?;
    let outcome = (cfg.validate)(&body);
    if !outcome.valid {
        return Err(ApiError::validation_failed(outcome.details));
    }

    let data = state
        .upstream
        .create(&cfg.endpoint, &body)
        .await
        .map_err(|e| upstream_failure("create", &cfg, e))?;

    Ok((StatusCode::CREATED, Json((cfg.transform)(data))).into_response())
}

async fn update(
    state: AppState,
    cfg: HandlerConfig,
    headers: HeaderMap,
    id: String,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_auth(&state, &cfg, &headers)?;

    let body = parse_body(&cfg, &body)?;
    let outcome = (cfg.validate)(&body);
    if !outcome.valid {
        return Err(ApiError::validation_failed(outcome.details));
    }

    let data = state
        .upstream
        .update(&cfg.endpoint, &id, &body)
        .await
        .map_err(|e| upstream_failure("update", &cfg, e))?;

    Ok(Json((cfg.transform)(data)).into_response())
}

async fn delete(
    state: AppState,
    cfg: HandlerConfig,
    headers: HeaderMap,
    id: String,
) -> Result<Response, ApiError> {
    check_auth(&state, &cfg, &headers)?;

    state
        .upstream
        .delete(&cfg.endpoint, &id)
        .await
        .map_err(|e| upstream_failure("delete", &cfg, e))?;

    Ok(Json(json!({ "success": true })).into_response())
}
