//! Discord incoming-webhook delivery.
//!
//! One message per item, carrying a single embed:
//!
//! ```text
//! { "username": "꿀꿀로드",
//!   "embeds": [{ "title", "description", "url", "color",
//!                "footer": { "text": "Source: … | 꿀꿀로드(OinkRoad)" },
//!                "timestamp" }] }
//! ```

use super::{Delivery, Notify};
use crate::error::{NewsError, Result};
use crate::models::NewsEntry;
use crate::utils::now_iso;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const BOT_NAME: &str = "꿀꿀로드";
pub const BRAND: &str = "꿀꿀로드(OinkRoad)";
pub const EMBED_COLOR: u32 = 5_763_719;

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub footer: Footer,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct Footer {
    pub text: String,
}

impl WebhookPayload {
    pub fn for_entry(entry: &NewsEntry) -> Self {
        let title = entry
            .translated_title
            .clone()
            .unwrap_or_else(|| entry.title.clone());
        let embed = Embed {
            title,
            description: entry.description().to_string(),
            url: entry.link.clone(),
            color: EMBED_COLOR,
            footer: Footer {
                text: format!("Source: {} | {}", entry.source, BRAND),
            },
            timestamp: now_iso(),
        };
        Self {
            username: BOT_NAME.to_string(),
            embeds: vec![embed],
        }
    }
}

/// Posts entries to a Discord webhook. With no URL configured every send is
/// a logged no-op.
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    webhook_url: Option<String>,
    http: Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl Notify for DiscordWebhook {
    #[instrument(level = "info", skip_all, fields(link = %entry.link))]
    async fn send(&self, entry: &NewsEntry) -> Result<Delivery> {
        let Some(url) = self.webhook_url.as_deref() else {
            warn!("DISCORD_WEBHOOK_URL not set; skipping message");
            return Ok(Delivery::Skipped);
        };

        let payload = WebhookPayload::for_entry(entry);
        let resp = self.http.post(url).json(&payload).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, %body, "Discord webhook returned non-success");
            return Err(NewsError::Status {
                url: "discord webhook".to_string(),
                status: status.as_u16(),
            });
        }

        info!(title = %entry.title, "Sent to Discord");
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated_entry() -> NewsEntry {
        let mut entry = NewsEntry::new(
            "OpenAI News",
            "New model",
            "https://openai.com/index/new-model",
            "2025-05-06",
            "Original summary",
        );
        entry.translated_title = Some("새 모델".to_string());
        entry.translated_summary = Some("번역된 요약".to_string());
        entry
    }

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload::for_entry(&translated_entry());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["username"], "꿀꿀로드");
        let embed = &json["embeds"][0];
        assert_eq!(embed["title"], "새 모델");
        assert_eq!(embed["description"], "번역된 요약");
        assert_eq!(embed["url"], "https://openai.com/index/new-model");
        assert_eq!(embed["color"], 5763719);
        assert_eq!(embed["footer"]["text"], "Source: OpenAI News | 꿀꿀로드(OinkRoad)");
        assert!(embed["timestamp"].is_string());
    }

    #[test]
    fn test_payload_falls_back_to_original_summary() {
        let mut entry = translated_entry();
        entry.translated_summary = Some(String::new());
        let payload = WebhookPayload::for_entry(&entry);
        assert_eq!(payload.embeds[0].description, "Original summary");
    }

    #[tokio::test]
    async fn test_missing_webhook_is_noop() {
        let webhook = DiscordWebhook::new(None, Duration::from_secs(10)).unwrap();
        assert!(!webhook.is_configured());
        let delivery = webhook.send(&translated_entry()).await.unwrap();
        assert_eq!(delivery, Delivery::Skipped);
    }

    #[test]
    fn test_blank_webhook_is_unconfigured() {
        let webhook = DiscordWebhook::new(Some(" ".to_string()), Duration::from_secs(10)).unwrap();
        assert!(!webhook.is_configured());
    }
}
