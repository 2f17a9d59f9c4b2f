use axum::{
    routing::{get, post},
    Router,
};
use relay_channels::Dispatcher;
use relay_events::Formatter;
use std::sync::Arc;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
///
/// Everything in here is built once at startup and only read afterwards.
pub struct AppState {
    pub formatter: Formatter,
    pub dispatcher: Dispatcher,
    /// Expected `Authorization` header value; `None` disables the check.
    pub auth_header: Option<String>,
}

impl AppState {
    pub fn new(formatter: Formatter, dispatcher: Dispatcher, auth_header: Option<String>) -> Self {
        Self {
            formatter,
            dispatcher,
            auth_header,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/webhook", post(crate::http::webhook::webhook_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
