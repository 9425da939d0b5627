//! HTTP probe protocol payloads.
//!
//! # Probe protocol (for beginners)
//!
//! The protocol is intentionally tiny so that any HTTP tool can speak it:
//!
//! ```text
//! Client                                   Server
//! ──────                                   ──────
//! POST /status            (no body)   ──►  200 "Status okay."
//! POST /status  {"MACS":[..],"NickName":".."}
//!                                     ──►  200, MACs forwarded as verifications
//! POST /verify  mac=..&mac=..&nickname=..
//!                                     ──►  200 (even if nothing matched)
//! ```
//!
//! Anything other than a `200` (or no answer at all) is a failed probe.

use serde::{Deserialize, Serialize};

/// Path of the liveness probe endpoint.
pub const STATUS_PATH: &str = "/status";

/// Path of the verification report endpoint.
pub const VERIFY_PATH: &str = "/verify";

/// Body returned by the server for every accepted probe.
pub const STATUS_OK_BODY: &str = "Status okay.\n";

/// Form field carrying one hardware address in a `/verify` report.
pub const VERIFY_MAC_FIELD: &str = "mac";

/// Optional form field carrying the reporter's nickname in a `/verify` report.
pub const VERIFY_NICKNAME_FIELD: &str = "nickname";

/// JSON document optionally attached to `POST /status`.
///
/// Field names match the established wire format (`MACS`, `NickName`).
/// Addresses stay as strings on the wire: a server must keep answering a
/// probe even if one of the reported addresses is not one it understands,
/// otherwise a client could shut itself down over a formatting quirk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(rename = "MACS", default)]
    pub macs: Vec<String>,
    #[serde(rename = "NickName", default)]
    pub nickname: String,
}

/// Encodes a `/verify` report as `(field, value)` pairs for a form body.
pub fn verify_form(
    macs: impl IntoIterator<Item = String>,
    nickname: &str,
) -> Vec<(&'static str, String)> {
    let mut fields: Vec<(&'static str, String)> =
        macs.into_iter().map(|m| (VERIFY_MAC_FIELD, m)).collect();
    if !nickname.is_empty() {
        fields.push((VERIFY_NICKNAME_FIELD, nickname.to_string()));
    }
    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
