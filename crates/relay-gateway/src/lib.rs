//! HTTP front door of the relay: `POST /webhook` for Harbor and `GET /health`.

pub mod app;
pub mod http;

pub use app::{build_router, AppState};
