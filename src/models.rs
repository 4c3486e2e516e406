//! Data models shared across the pipeline.
//!
//! - [`NewsEntry`]: one item produced by a source adapter for this run
//! - [`HistoryRecord`]: one persisted entry of the processed-link history

use serde::{Deserialize, Serialize};

/// Title used when a feed item carries no usable `<title>`.
pub const NO_TITLE: &str = "No Title";

/// Translated summary used when the entry had no summary to translate.
pub const NO_SUMMARY: &str = "No Summary";

/// A news item as produced by a source adapter.
///
/// Entries are created fresh on every run. Only the ones that pass the
/// history gate get their `translated_*` fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEntry {
    /// Human-readable source label, e.g. `"OpenAI News"`.
    pub source: String,
    /// Original title. Never empty; falls back to [`NO_TITLE`].
    pub title: String,
    /// Article URL and the dedup key. Empty when nothing could be extracted.
    pub link: String,
    /// Publication time as given by the source, or the fetch time.
    pub published: String,
    /// Plain-text summary, possibly empty.
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_summary: Option<String>,
}

impl NewsEntry {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            link: link.into(),
            published: published.into(),
            summary: summary.into(),
            translated_title: None,
            translated_summary: None,
        }
    }

    /// Text for the message body: the translated summary if there is one,
    /// otherwise the original summary.
    pub fn description(&self) -> &str {
        match self.translated_summary.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => &self.summary,
        }
    }
}

/// One processed item in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub link: String,
    /// Original (untranslated) title, kept for auditing.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub processed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_prefers_translation() {
        let mut entry = NewsEntry::new("OpenAI News", "T", "https://a", "", "original");
        assert_eq!(entry.description(), "original");

        entry.translated_summary = Some("번역된 요약".to_string());
        assert_eq!(entry.description(), "번역된 요약");

        entry.translated_summary = Some(String::new());
        assert_eq!(entry.description(), "original");
    }

    #[test]
    fn test_history_record_tolerates_missing_fields() {
        let json = r#"[{"link": "https://a"}]"#;
        let records: Vec<HistoryRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://a");
        assert!(records[0].title.is_empty());
    }

    #[test]
    fn test_history_record_serialization_keeps_korean() {
        let record = HistoryRecord {
            link: "https://a".to_string(),
            title: "새 모델".to_string(),
            processed_at: "2025-05-06T08:00:00+09:00".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("새 모델"));
        assert!(json.contains("processed_at"));
    }

    #[test]
    fn test_untranslated_fields_skipped() {
        let entry = NewsEntry::new("Anthropic", "Title", "https://a", "now", "");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("translated_title"));
    }
}
