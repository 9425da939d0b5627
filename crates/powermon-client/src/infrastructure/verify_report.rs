//! One-shot verification report (`POST /verify`).
//!
//! Used by `powermon verify`, typically from a boot script, to tell a server
//! that is still sending wake packets that this machine is up.  The body is
//! form encoded with one `mac` field per local hardware address.

use powermon_core::protocol::messages::verify_form;
use powermon_core::{ClientIdentity, ProbeEndpoint};
use thiserror::Error;
use tracing::info;

/// Error type for verification reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The identity has no hardware addresses, so there is nothing to verify.
    #[error("no hardware addresses to report")]
    NothingToReport,
    /// The request could not be sent.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server refused the report.
    #[error("server rejected the report with status {0}")]
    Rejected(u16),
}

/// Sends verification reports to one server.
pub struct VerificationReporter {
    client: reqwest::Client,
    url: String,
}

impl VerificationReporter {
    pub fn new(endpoint: &ProbeEndpoint, client: reqwest::Client) -> Self {
        Self {
            client,
            url: endpoint.verify_url(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reports every hardware address of `identity`.
    ///
    /// # Errors
    ///
    /// See [`ReportError`].
    pub async fn report(&self, identity: &ClientIdentity) -> Result<(), ReportError> {
        let macs: Vec<String> = identity.hardware_addresses().map(ToString::to_string).collect();
        if macs.is_empty() {
            return Err(ReportError::NothingToReport);
        }
        let count = macs.len();
        let form = verify_form(macs, identity.nickname());

        let response = self.client.post(&self.url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(ReportError::Rejected(response.status().as_u16()));
        }
        info!("reported {count} hardware address(es) to {}", self.url);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use powermon_core::Scheme;

    #[test]
    fn test_reporter_targets_verify_path() {
        let ep = ProbeEndpoint::new("192.168.0.5", 10101, Scheme::Http).unwrap();
        let reporter = VerificationReporter::new(&ep, reqwest::Client::new());
        assert_eq!(reporter.url(), "http://192.168.0.5:10101/verify");
    }

    #[tokio::test]
    async fn test_empty_identity_is_not_sent() {
        // Arrange
        let ep = ProbeEndpoint::new("127.0.0.1", 1, Scheme::Http).unwrap();
        let reporter = VerificationReporter::new(&ep, reqwest::Client::new());

        // Act
        let result = reporter.report(&ClientIdentity::default()).await;

        // Assert – rejected locally, no request attempted
        assert!(matches!(result, Err(ReportError::NothingToReport)));
    }
}
