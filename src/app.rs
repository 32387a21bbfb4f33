use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::database::ProfileStore;
use crate::handlers;
use crate::middleware::identity_middleware;

/// Shared, read-only request state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: Authenticator,
    pub store: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(config: AppConfig, authenticator: Authenticator, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            config: Arc::new(config),
            authenticator,
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        // Protected: every route below resolves a principal first
        .merge(profile_routes(state.clone()));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn profile_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::profiles;

    Router::new()
        // Collection-level operations
        .route("/profiles", get(profiles::list).post(profiles::create_full))
        .route("/profiles/bulk", get(profiles::bulk))
        .route("/profiles/username", post(profiles::create_username_only))
        // Record-level operations
        .route(
            "/profiles/:id",
            get(profiles::record_get)
                .put(profiles::record_put)
                .delete(profiles::record_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, identity_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
