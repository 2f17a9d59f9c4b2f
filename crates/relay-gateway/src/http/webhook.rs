//! Harbor webhook ingress: POST /webhook.
//!
//! Harbor treats anything but a 2xx as a failed delivery and retries it, so
//! every outcome the relay understands is acknowledged with 200 and a short
//! body saying what happened. The only non-200 answer is 401, and only when
//! an auth header is configured.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
};
use relay_events::{Decision, EventPayload};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::app::AppState;

pub const BODY_OK: &str = "OK";
pub const BODY_IGNORED: &str = "Ignored";
pub const BODY_NO_RESOURCES: &str = "No resources";
pub const BODY_INVALID: &str = "Invalid payload";
pub const BODY_UNAUTHORIZED: &str = "Unauthorized";

/// POST /webhook
///
/// Parses the Harbor payload, formats it, and relays every resulting message
/// before answering. Delivery failures are logged by the dispatcher and do
/// not change the response.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let receipt_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("webhook", receipt_id = %receipt_id);

    async move {
        if let Some(expected) = state.auth_header.as_deref() {
            if let Err(reason) = verify_auth_header(&headers, expected) {
                warn!(reason = %reason, "webhook authentication failed");
                return (StatusCode::UNAUTHORIZED, BODY_UNAUTHORIZED);
            }
        }

        let payload: EventPayload = match serde_json::from_slice(&body) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, bytes = body.len(), "webhook body is not a valid Harbor payload");
                return (StatusCode::OK, BODY_INVALID);
            }
        };

        info!(
            event_type = %payload.event_type,
            operator = payload.operator.as_deref().unwrap_or_default(),
            repository = payload
                .event_data
                .repository
                .repo_full_name
                .as_deref()
                .unwrap_or_default(),
            resources = payload.resources().len(),
            occurred_at = ?payload.occurred_at(),
            "webhook arrived"
        );

        let classification = state.formatter.classify_and_format(&payload);
        let decision = classification.decision;

        let report = state.dispatcher.dispatch(classification.messages).await;

        info!(
            decision = decision.as_str(),
            delivered = report.delivered,
            failed = report.failed,
            "webhook handled"
        );
        (StatusCode::OK, response_body(decision))
    }
    .instrument(span)
    .await
}

/// Text returned to Harbor for each classification outcome.
pub fn response_body(decision: Decision) -> &'static str {
    match decision {
        Decision::Ignored => BODY_IGNORED,
        Decision::NoResources => BODY_NO_RESOURCES,
        Decision::Unsupported | Decision::Processed(_) => BODY_OK,
    }
}

/// Harbor sends the policy's "Auth Header" value verbatim as `Authorization`.
fn verify_auth_header(headers: &HeaderMap, expected: &str) -> Result<(), String> {
    let received = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "missing Authorization header".to_string())?
        .to_str()
        .map_err(|_| "Authorization header is not valid UTF-8".to_string())?;

    if received == expected {
        Ok(())
    } else {
        Err("Authorization header mismatch".to_string())
    }
}
