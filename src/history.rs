//! Persisted history of processed links, and the dedup gate built on it.
//!
//! The history is a JSON array of [`HistoryRecord`]s. It is read once at
//! startup and rewritten in full after every processed item, so a crash
//! between recording and delivery loses at most one notification instead of
//! sending a duplicate on the next run.
//!
//! Records are only ever appended; nothing is pruned or deduplicated on
//! write. Concurrent runs against the same file are not supported.

use crate::error::Result;
use crate::models::{HistoryRecord, NewsEntry};
use crate::utils::{ensure_parent_dir, now_iso};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
    links: HashSet<String>,
}

impl HistoryStore {
    /// Load the history at `path`. A missing file is an empty history; an
    /// unreadable or corrupt one is an error.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records: Vec<HistoryRecord> = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No history file yet; starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        let links = records.iter().map(|r| r.link.clone()).collect();
        info!(records = records.len(), "Loaded history");
        Ok(Self {
            path,
            records,
            links,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Entries whose link is not in the history, in their original order.
    ///
    /// Membership is checked against the history as it is now; two entries
    /// sharing a new link in the same batch both pass.
    pub fn filter_new(&self, entries: Vec<NewsEntry>) -> Vec<NewsEntry> {
        entries
            .into_iter()
            .filter(|entry| !self.contains(&entry.link))
            .collect()
    }

    /// Append a record for `entry` and rewrite the file.
    #[instrument(level = "debug", skip_all, fields(link = %entry.link))]
    pub async fn record(&mut self, entry: &NewsEntry) -> Result<()> {
        self.records.push(HistoryRecord {
            link: entry.link.clone(),
            title: entry.title.clone(),
            processed_at: now_iso(),
        });
        self.links.insert(entry.link.clone());
        self.save().await
    }

    async fn save(&self) -> Result<()> {
        ensure_parent_dir(&self.path).await?;
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json).await?;
        debug!(records = self.records.len(), "History saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(link: &str) -> NewsEntry {
        NewsEntry::new("Test", format!("Title for {link}"), link, "now", "")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(tmp.path().join("history.json")).await.unwrap();
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(HistoryStore::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_new_against_history() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        std::fs::write(&path, r#"[{"link": "https://a"}]"#).unwrap();

        let store = HistoryStore::load(&path).await.unwrap();
        let fresh = store.filter_new(vec![entry("https://a"), entry("https://b")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].link, "https://b");
    }

    #[tokio::test]
    async fn test_filter_new_keeps_same_batch_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(tmp.path().join("h.json")).await.unwrap();
        let fresh = store.filter_new(vec![entry("https://x"), entry("https://x")]);
        assert_eq!(fresh.len(), 2);
    }

    #[tokio::test]
    async fn test_record_appends_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data/history.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"[{"link": "https://a", "title": "A", "processed_at": "t"}]"#)
            .unwrap();

        let mut store = HistoryStore::load(&path).await.unwrap();
        store.record(&entry("https://b")).await.unwrap();

        let on_disk: Vec<HistoryRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0].link, "https://a");
        assert_eq!(on_disk[1].link, "https://b");
        assert_eq!(on_disk[1].title, "Title for https://b");
        assert!(store.contains("https://b"));
    }

    #[tokio::test]
    async fn test_record_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/history.json");

        let mut store = HistoryStore::load(&path).await.unwrap();
        store.record(&entry("https://new")).await.unwrap();

        assert!(path.exists());
        let reloaded = HistoryStore::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("https://new"));
    }

    #[tokio::test]
    async fn test_saved_file_keeps_non_ascii() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.json");
        let mut store = HistoryStore::load(&path).await.unwrap();
        store
            .record(&NewsEntry::new("Test", "새로운 모델", "https://k", "now", ""))
            .await
            .unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("새로운 모델"));
    }
}
