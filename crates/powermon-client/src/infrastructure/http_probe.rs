//! HTTP implementation of [`Prober`].
//!
//! Every probe is a `POST /status` bounded by a short fixed timeout (2 s by
//! default).  Without an identity the body is empty; with one, the body is
//! the JSON `StatusReport` so a server that is still waking machines can
//! count this client as back online.

use std::time::Duration;

use async_trait::async_trait;
use powermon_core::{ClientIdentity, ProbeEndpoint, StatusReport};
use reqwest::StatusCode;

use crate::application::probe_sender::{ProbeError, Prober};

/// Probes `POST /status` over HTTP(S).
pub struct HttpProber {
    client: reqwest::Client,
    url: String,
    report: Option<StatusReport>,
}

impl HttpProber {
    /// Creates a prober for `endpoint`.
    ///
    /// `timeout` bounds each whole request (connect + response).
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Setup`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: &ProbeEndpoint,
        timeout: Duration,
        identity: Option<&ClientIdentity>,
    ) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Setup(e.to_string()))?;
        Ok(Self {
            client,
            url: endpoint.status_url(),
            report: identity.map(ClientIdentity::to_report),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> Result<(), ProbeError> {
        let request = self.client.post(&self.url);
        let request = match &self.report {
            Some(report) => request.json(report),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ProbeError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
