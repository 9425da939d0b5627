//! Pushover notification transport.
//!
//! Each message is posted once per configured user token:
//!
//! ```json
//! {"message": "...", "token": "<app token>", "user": "<user token>",
//!  "priority": 1, "timestamp": 1700000000}
//! ```
//!
//! Delivery to each user runs on its own Tokio task and is retried up to
//! `max_attempts` times, `retry_delay` apart, because the network is often
//! still coming up when powermon has something to say (right after a power
//! cut, or right after the server boots).  `send` only spawns the tasks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, error};

use super::{Notifier, NotifyError};

/// Pushover messages API endpoint.
pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Validated Pushover settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushoverSettings {
    pub api_token: String,
    pub user_tokens: Vec<String>,
    /// Prefixed to every message as `"<nickname>: <message>"` when set.
    pub nickname: Option<String>,
}

impl PushoverSettings {
    /// Builds settings from the raw option values.
    ///
    /// Returns `Ok(None)` when neither a token nor a user is given
    /// (notifications disabled).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotConfigured`] when only one of the two is
    /// present.
    pub fn from_options(
        api_token: Option<String>,
        user_tokens: Vec<String>,
        nickname: Option<String>,
    ) -> Result<Option<Self>, NotifyError> {
        let api_token = api_token.filter(|t| !t.is_empty());
        let user_tokens: Vec<String> = user_tokens.into_iter().filter(|u| !u.is_empty()).collect();

        match (api_token, user_tokens.is_empty()) {
            (None, true) => Ok(None),
            (None, false) => Err(NotifyError::NotConfigured(
                "API token must be specified using -k [--pushover-token]".into(),
            )),
            (Some(_), true) => Err(NotifyError::NotConfigured(
                "must specify one or more user tokens using -u [--user-token]".into(),
            )),
            (Some(api_token), false) => Ok(Some(Self {
                api_token,
                user_tokens,
                nickname: nickname.filter(|n| !n.is_empty()),
            })),
        }
    }

    /// Applies the nickname prefix.
    pub fn format_message(&self, message: &str) -> String {
        match &self.nickname {
            Some(nick) => format!("{nick}: {message}"),
            None => message.to_string(),
        }
    }
}

/// JSON body of one Pushover API call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct Notification {
    message: String,
    token: String,
    user: String,
    priority: i32,
    timestamp: u64,
}

/// Delivers notifications through the Pushover API.
pub struct PushoverNotifier {
    settings: PushoverSettings,
    client: reqwest::Client,
    api_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl PushoverNotifier {
    /// Creates a notifier with the production endpoint and retry policy
    /// (10 attempts, 10 seconds apart).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: PushoverSettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            settings,
            client,
            api_url: PUSHOVER_URL.to_string(),
            max_attempts: 10,
            retry_delay: Duration::from_secs(10),
        })
    }

    /// Overrides the API URL and retry policy.
    pub fn with_delivery(mut self, api_url: impl Into<String>, max_attempts: u32, retry_delay: Duration) -> Self {
        self.api_url = api_url.into();
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }
}

impl Notifier for PushoverNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| NotifyError::NoRuntime)?;
        let message = self.settings.format_message(message);

        for user in &self.settings.user_tokens {
            let notification = Notification {
                message: message.clone(),
                token: self.settings.api_token.clone(),
                user: user.clone(),
                priority: 1,
                timestamp: unix_timestamp(),
            };
            let client = self.client.clone();
            let url = self.api_url.clone();
            let attempts = self.max_attempts;
            let delay = self.retry_delay;
            handle.spawn(async move {
                deliver(&client, &url, &notification, attempts, delay).await;
            });
        }
        Ok(())
    }
}

/// Posts `notification`, retrying until it is accepted or `attempts` run out.
///
/// Returns `true` once the API answered `200`.
async fn deliver(
    client: &reqwest::Client,
    url: &str,
    notification: &Notification,
    attempts: u32,
    delay: Duration,
) -> bool {
    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(delay).await;
        }
        match client.post(url).json(notification).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("Pushover notification delivered on attempt {attempt}");
                return true;
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!("failed to send Pushover notification: status {status}, body: {body}");
            }
            Err(e) => error!("failed to send Pushover notification: {e}"),
        }
    }
    error!("failed to send Pushover notification {attempts} times, not trying again");
    false
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
