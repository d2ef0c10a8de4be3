//! Notification delivery.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::{form_urlencoded, Url};

use crate::config::NotificationConfig;
use crate::error::NotifyError;
use crate::outcome::BuildOutcome;
use crate::payload::{attachments_to_json, build_attachment};
use crate::transport::{OutboundRequest, ReqwestTransport, RequestBody, Response, Transport};

/// Path of the message posting endpoint, relative to the API base.
pub const POST_MESSAGE_PATH: &str = "/api/chat.postMessage";

/// Why a send was skipped without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Errored(String),
}

/// Result of one notification attempt.
#[derive(Debug)]
pub enum Delivery {
    /// Configuration forbids sending.
    Skipped(SkipReason),
    /// The request completed. Non-2xx statuses land here too.
    Sent(Response),
    /// The request could not be assembled or did not complete.
    Failed(NotifyError),
}

impl Delivery {
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    #[must_use]
    pub const fn response(&self) -> Option<&Response> {
        match self {
            Self::Sent(response) => Some(response),
            _ => None,
        }
    }

    /// Collapse into a `Result`; a skip is `Ok(None)`.
    pub fn into_result(self) -> Result<Option<Response>, NotifyError> {
        match self {
            Self::Skipped(_) => Ok(None),
            Self::Sent(response) => Ok(Some(response)),
            Self::Failed(e) => Err(e),
        }
    }
}

/// Posts build notifications to the messaging API.
pub struct Notifier {
    config: NotificationConfig,
    transport: Box<dyn Transport>,
}

impl Notifier {
    /// Create a notifier with a `reqwest` transport built from the proxy settings.
    pub fn new(config: NotificationConfig) -> Result<Self, NotifyError> {
        let transport = ReqwestTransport::new(&config.proxy)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a notifier with a specific transport.
    #[must_use]
    pub fn with_transport(config: NotificationConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Send one notification.
    ///
    /// Skips without any network activity unless the configuration is enabled
    /// and not errored. Performs at most one POST.
    pub async fn send(&self, outcome: Option<&BuildOutcome>) -> Delivery {
        if let Some(reason) = self.skip_reason() {
            debug!(reason = ?reason, "Notification skipped");
            return Delivery::Skipped(reason);
        }

        let request = match self.build_request(outcome) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "Failed to assemble notification");
                return Delivery::Failed(e);
            }
        };

        info!(url = %redacted_url(&request.url), "Preparing message");
        if let RequestBody::Form(form) = &request.body {
            info!(body = %form, "Message body");
        }

        match self.transport.post(request).await {
            Ok(response) => {
                debug!(status = response.status, "Notification sent");
                Delivery::Sent(response)
            }
            Err(e) => {
                error!(error = %e, "Failed to send notification");
                Delivery::Failed(e)
            }
        }
    }

    /// Send on a spawned task and return immediately.
    pub fn dispatch(self: Arc<Self>, outcome: Option<BuildOutcome>) -> JoinHandle<Delivery> {
        tokio::spawn(async move { self.send(outcome.as_ref()).await })
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if !self.config.enabled {
            Some(SkipReason::Disabled)
        } else if self.config.errored {
            Some(SkipReason::Errored(self.config.error_reason.clone()))
        } else {
            None
        }
    }

    /// Assemble the destination URL and body without sending.
    pub fn build_request(
        &self,
        outcome: Option<&BuildOutcome>,
    ) -> Result<OutboundRequest, NotifyError> {
        let url = self.message_url(outcome)?;

        let filename = self
            .config
            .filename
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());

        let body = if let Some(path) = filename {
            RequestBody::File(path.clone())
        } else if let Some(outcome) = outcome {
            let json = attachments_to_json(&[build_attachment(outcome)])?;
            let form = form_urlencoded::Serializer::new(String::new())
                .append_pair("attachments", &json)
                .finish();
            RequestBody::Form(form)
        } else {
            RequestBody::Empty
        };

        Ok(OutboundRequest { url, body })
    }

    /// Build the `chat.postMessage` URL. Absent values encode as "".
    pub fn message_url(&self, outcome: Option<&BuildOutcome>) -> Result<Url, NotifyError> {
        let config = &self.config;
        let base = config.api_base.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{POST_MESSAGE_PATH}"))?;

        let text = outcome
            .map(BuildOutcome::description_with_link_syntax)
            .unwrap_or_default();

        url.query_pairs_mut()
            .append_pair("token", config.token.as_deref().unwrap_or_default())
            .append_pair("username", config.bot_name.as_deref().unwrap_or_default())
            .append_pair("icon_url", config.icon_url.as_deref().unwrap_or_default())
            .append_pair("channel", config.channel.as_deref().unwrap_or_default())
            .append_pair("text", &text)
            .append_pair("pretty", "1");

        Ok(url)
    }
}

/// URL with the token value masked, for logging.
fn redacted_url(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" && !v.is_empty() {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
