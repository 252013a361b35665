pub mod embed;

use anyhow::{Context, Result};
use reqwest::{IntoUrl, StatusCode, Url};
use serde::Serialize;

use crate::{
    discord::embed::{Embed, Field},
    http::{HttpClient, RequestSpec},
    validate,
};

const AVATAR_URL: &str = "https://imgur.com/a/Cl3zspb";

/// The provider an inbound call came from. Decides the notification identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Flowroute,
    Voipms,
}

impl Source {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Flowroute => "Flowroute Message Received!",
            Self::Voipms => "Voipms Message Received!",
        }
    }

    #[must_use]
    pub const fn avatar_url(self) -> &'static str {
        AVATAR_URL
    }

    /// Whether the provider payload carries a timestamp worth showing.
    #[must_use]
    pub const fn includes_timestamp(self) -> bool {
        matches!(self, Self::Voipms)
    }
}

/// The webhook execution body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
}

impl Notification {
    #[must_use]
    pub fn new(source: Source, fields: Vec<Field>) -> Self {
        Self {
            username: source.display_name().to_owned(),
            avatar_url: source.avatar_url().to_owned(),
            embeds: vec![Embed::with_fields(fields)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// `status` is what the inbound caller should see.
    Failed { status: StatusCode, message: String },
}

impl DeliveryOutcome {
    /// Maps the webhook's answer. Only 200, 202 and 204 count as delivered.
    #[must_use]
    pub fn classify(status: StatusCode, body: &str) -> Self {
        if matches!(
            status,
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
        ) {
            return Self::Delivered;
        }
        Self::Failed {
            status: StatusCode::BAD_REQUEST,
            message: format!(
                "Discord request failed with status code {} - response body: {body}",
                status.as_u16()
            ),
        }
    }

    fn internal(message: String) -> Self {
        Self::Failed {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscordClient {
    http_client: HttpClient,
    url: Url,
}

impl DiscordClient {
    pub fn new(http_client: HttpClient, webhook_url: impl IntoUrl) -> Result<Self> {
        let url = webhook_url.into_url().context("Invalid WebHook URL")?;
        validate::webhook_url(&url).context("Invalid WebHook URL")?;
        Ok(Self { http_client, url })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Makes exactly one attempt to post `notification` to the webhook.
    pub async fn deliver(&self, notification: &Notification) -> DeliveryOutcome {
        log::debug!("Delivering notification: {notification:?}");

        let request = match RequestSpec::json(self.url.as_str(), notification)
            .and_then(|spec| self.http_client.build(spec))
        {
            Ok(request) => request,
            Err(e) => {
                log::error!("Could not build webhook request for {}: {e}", self.url);
                return DeliveryOutcome::internal(e.to_string());
            }
        };

        let response = match self.http_client.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Sending notification to webhook failed: {e}");
                return DeliveryOutcome::internal(e.to_string());
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));

        let outcome = DeliveryOutcome::classify(status, &body);
        match &outcome {
            DeliveryOutcome::Delivered => log::info!("Notification delivered ({status})"),
            DeliveryOutcome::Failed { message, .. } => log::error!("{message}"),
        }
        outcome
    }
}
