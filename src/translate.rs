//! Korean translation through the Gemini `generateContent` API.
//!
//! The module is split the same way as any other external collaborator:
//! - [`Translate`]: the seam the pipeline talks to
//! - [`GeminiTranslator`]: the HTTP implementation
//! - [`translate_content`] / [`translate_entry`]: never fail; a failed
//!   translation degrades to the original text plus a visible marker
//!
//! There are no retries: a failed call is reported once and the item moves on.

use crate::error::{NewsError, Result};
use crate::models::{NO_SUMMARY, NewsEntry};
use crate::utils::{truncate_for_log, truncate_with_ellipsis};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Summaries longer than this many characters are cut before translation.
pub const SUMMARY_CHAR_LIMIT: usize = 500;

const MISSING_KEY_MARKER: &str = " (번역 실패: API Key 없음)";
const FAILURE_MARKER: &str = " (번역 실패: 오류 발생)";

/// Text-to-Korean translation.
pub trait Translate {
    async fn translate(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, trimmed.
    fn into_text(self) -> Result<String> {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(NewsError::EmptyResponse("Gemini"));
        }
        Ok(text.to_string())
    }
}

/// Gemini-backed [`Translate`] implementation.
#[derive(Debug, Clone)]
pub struct GeminiTranslator {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiTranslator {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_BASE_URL, self.model)
    }
}

/// Prompt sent to the model for one piece of text.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Translate the following AI news content to natural, professional Korean.\n\
         If it's a title, keep it concise. If it's a summary, make it easy to understand.\n\
         Reply with the translation only.\n\n\
         Content:\n{text}"
    )
}

impl Translate for GeminiTranslator {
    #[instrument(level = "info", skip_all, fields(model = %self.model, chars = text.chars().count()))]
    async fn translate(&self, text: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(NewsError::MissingApiKey)?;

        let t0 = Instant::now();
        let prompt = build_prompt(text);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::Status {
                url: self.endpoint(),
                status: status.as_u16(),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        let translated = body.into_text()?;
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Translation succeeded");
        Ok(translated)
    }
}

/// Translate `text`, falling back to the original plus a failure marker.
pub async fn translate_content<T: Translate>(translator: &T, text: &str) -> String {
    match translator.translate(text).await {
        Ok(translated) => translated,
        Err(NewsError::MissingApiKey) => {
            error!("GEMINI_API_KEY not set; leaving text untranslated");
            format!("{text}{MISSING_KEY_MARKER}")
        }
        Err(e) => {
            error!(error = %e, text = %truncate_for_log(text, 80), "Translation failed");
            format!("{text}{FAILURE_MARKER}")
        }
    }
}

/// Fill in `translated_title` and `translated_summary` for `entry`.
///
/// Summaries are cut to [`SUMMARY_CHAR_LIMIT`] characters first; an empty
/// summary is not sent and becomes [`NO_SUMMARY`].
#[instrument(level = "info", skip_all, fields(link = %entry.link))]
pub async fn translate_entry<T: Translate>(translator: &T, entry: &mut NewsEntry) {
    entry.translated_title = Some(translate_content(translator, &entry.title).await);

    let summary = if entry.summary.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        let text = truncate_with_ellipsis(&entry.summary, SUMMARY_CHAR_LIMIT);
        translate_content(translator, &text).await
    };
    entry.translated_summary = Some(summary);
}
