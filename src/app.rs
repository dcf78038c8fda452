use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::password::Argon2Params;
use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{elevated, private, protected, public};
use crate::middleware::{require_session, require_superuser_middleware};
use crate::proxmox::Hypervisor;

/// Shared, immutable application state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: Arc<TokenCodec>,
    pub store: Arc<dyn Store>,
    pub hypervisor: Arc<dyn Hypervisor>,
    pub password_params: Argon2Params,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        codec: Arc<TokenCodec>,
        store: Arc<dyn Store>,
        hypervisor: Arc<dyn Hypervisor>,
    ) -> Self {
        Self {
            config,
            codec,
            store,
            hypervisor,
            password_params: Argon2Params::default(),
        }
    }

    pub fn with_password_params(mut self, params: Argon2Params) -> Self {
        self.password_params = params;
        self
    }
}

pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(elevated_routes(state.clone()));

    if state.config.is_local() {
        api = api.merge(private_routes());
    }

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest(&state.config.api.prefix, api)
        .with_state(state)
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login/access-token", post(public::login_access_token))
        .route("/reset-password/", post(public::reset_password))
        .route("/utils/health-check/", get(public::health_check))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/login/test-token", post(protected::test_token))
        .route("/users/me", get(protected::read_user_me))
        .route(
            "/items/",
            get(protected::read_items).post(protected::create_item),
        )
        .route(
            "/items/:id",
            get(protected::read_item)
                .put(protected::update_item)
                .delete(protected::delete_item),
        )
        .route("/resources/", get(protected::list_resources))
        .route("/resources/nodes", get(protected::list_nodes))
        .route("/resources/:vmid", get(protected::get_resource))
        .route("/resources/:vmid/:action", post(protected::resource_action))
        .route("/vm/:vmid/console", get(protected::vm_console))
        .route("/lxc/:vmid/terminal", get(protected::lxc_terminal))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn elevated_routes(state: AppState) -> Router<AppState> {
    // The last route_layer runs first: session, then the privilege check
    Router::new()
        .route("/users/", get(elevated::read_users))
        .route("/users/:user_id", delete(elevated::delete_user))
        .route_layer(middleware::from_fn(require_superuser_middleware))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn private_routes() -> Router<AppState> {
    Router::new().route("/private/users/", post(private::create_user))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.config.api.project_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "api": state.config.api.prefix,
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
