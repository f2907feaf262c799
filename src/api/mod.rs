// API module - HTTP endpoints

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use self::middleware::session::AppState;

pub mod char_taxes;
pub mod corp_helpers;
pub mod corp_taxes;
pub mod global_taxes;
pub mod health;
pub mod middleware;
pub mod params;

/// Prefix shared by every report endpoint
pub const API_PREFIX: &str = "/api/taxtools";

pub fn router() -> Router<AppState> {
    let reports = Router::new()
        .merge(char_taxes::router())
        .merge(corp_helpers::router())
        .merge(corp_taxes::router())
        .merge(global_taxes::router());

    Router::new()
        .route("/health", get(health::health_check))
        .nest(API_PREFIX, reports)
}

/// Full application: routes, session handling and request tracing
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
