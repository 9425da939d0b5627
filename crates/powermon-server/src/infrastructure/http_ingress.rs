//! HTTP ingress: the `/status` and `/verify` endpoints.
//!
//! | Route           | Body                                   | Reply              |
//! |-----------------|----------------------------------------|--------------------|
//! | `GET /status`   | none                                   | `200 Status okay.` |
//! | `POST /status`  | empty, or `{"MACS":[..],"NickName":..}`| `200` / `400`      |
//! | `POST /verify`  | form: `mac=..&mac=..&nickname=..`      | `200` / `400`      |
//!
//! Reported addresses are handed to the [`VerificationTracker`]; the
//! handlers never touch dispatcher state themselves.

use std::future::Future;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use powermon_core::protocol::messages::{
    STATUS_OK_BODY, STATUS_PATH, VERIFY_MAC_FIELD, VERIFY_NICKNAME_FIELD, VERIFY_PATH,
};
use powermon_core::{MacAddress, MacParseError, StatusReport};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::application::verification_tracker::VerificationTracker;

/// Body returned for an accepted `/verify` report.
pub const VERIFY_OK_BODY: &str = "Verification okay.\n";

/// A malformed inbound payload.  Always answered with `400 Bad Request`.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("invalid status report: {0}")]
    InvalidReport(#[from] serde_json::Error),
    #[error("verification report carries no 'mac' field")]
    NoAddresses,
    #[error(transparent)]
    InvalidAddress(#[from] MacParseError),
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        debug!("rejected request: {self}");
        (StatusCode::BAD_REQUEST, format!("{self}\n")).into_response()
    }
}

/// Builds the router.
pub fn router(tracker: VerificationTracker) -> Router {
    Router::new()
        .route(STATUS_PATH, get(status_bare).post(status_report))
        .route(VERIFY_PATH, post(verify_report))
        .with_state(tracker)
}

/// Serves `router(tracker)` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the listener's I/O error if serving fails.
pub async fn serve<F>(
    listener: TcpListener,
    tracker: VerificationTracker,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(tracker))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn status_bare() -> &'static str {
    debug!("received bare probe");
    STATUS_OK_BODY
}

async fn status_report(
    State(tracker): State<VerificationTracker>,
    body: Bytes,
) -> Result<&'static str, IngressError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        debug!("received bare probe");
        return Ok(STATUS_OK_BODY);
    }

    let report: StatusReport = serde_json::from_slice(&body)?;
    info!("received ping from [{}]", report.nickname);

    if tracker.is_active() {
        // Addresses stay strings on the wire; an odd one is skipped rather
        // than failing the whole probe.
        let macs: Vec<MacAddress> = report
            .macs
            .iter()
            .filter_map(|raw| match raw.parse() {
                Ok(mac) => Some(mac),
                Err(e) => {
                    debug!("skipping reported address: {e}");
                    None
                }
            })
            .collect();
        let nickname = (!report.nickname.is_empty()).then_some(report.nickname.as_str());
        tracker.forward(macs, nickname).await;
    }
    Ok(STATUS_OK_BODY)
}

async fn verify_report(
    State(tracker): State<VerificationTracker>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<&'static str, IngressError> {
    let mut macs = Vec::new();
    let mut nickname = None;
    for (field, value) in fields {
        match field.as_str() {
            VERIFY_MAC_FIELD => macs.push(value.trim().parse::<MacAddress>()?),
            VERIFY_NICKNAME_FIELD => nickname = Some(value),
            _ => {}
        }
    }
    if macs.is_empty() {
        return Err(IngressError::NoAddresses);
    }

    info!(
        "received verification report from [{}] for {} address(es)",
        nickname.as_deref().unwrap_or_default(),
        macs.len()
    );
    tracker.forward(macs, nickname.as_deref()).await;
    Ok(VERIFY_OK_BODY)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
