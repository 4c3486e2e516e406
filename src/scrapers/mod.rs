//! News sources and the aggregator that runs them.
//!
//! Each [`Source`] binds one outlet to one of the generic extractors:
//!
//! | Source | Kind | Notes |
//! |--------|------|-------|
//! | Google AI Blog | RSS feed | |
//! | Google DeepMind | unsupported | page is rendered by script |
//! | OpenAI News | RSS feed | |
//! | ChatGPT Release Notes | unsupported | help center answers 403 to non-browsers |
//! | Anthropic | news cards | `/news/` and `/research/` links on the index page |
//!
//! Every source contributes at most [`MAX_ENTRIES_PER_SOURCE`] entries per
//! run. A failing source is logged and contributes nothing; it never stops
//! the sources after it.

pub mod cards;
pub mod feed;
pub mod fetch;

use crate::error::{NewsError, Result};
use crate::models::NewsEntry;
use crate::utils::now_iso;
use fetch::PageFetcher;
use tracing::{error, info, instrument, warn};
use url::Url;

pub const MAX_ENTRIES_PER_SOURCE: usize = 5;

/// How a source's page is turned into entries.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// RSS or Atom feed, parsed by [`feed::parse_feed`].
    Feed,
    /// HTML index page, scraped by [`cards::extract_news_cards`].
    NewsCards {
        origin: &'static str,
        sections: &'static [&'static str],
    },
    /// Known source that cannot be fetched; never hits the network.
    Unsupported { reason: &'static str },
}

/// One configured news source.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub label: &'static str,
    pub url: &'static str,
    pub kind: SourceKind,
    pub limit: usize,
}

/// What a single source produced on this run.
#[derive(Debug)]
pub enum SourceOutcome {
    Entries(Vec<NewsEntry>),
    Unsupported(&'static str),
    Failed(NewsError),
}

impl SourceOutcome {
    pub fn into_entries(self) -> Vec<NewsEntry> {
        match self {
            SourceOutcome::Entries(entries) => entries,
            SourceOutcome::Unsupported(_) | SourceOutcome::Failed(_) => Vec::new(),
        }
    }
}

impl Source {
    /// Fetch and extract this source's entries.
    pub async fn fetch<F: PageFetcher>(&self, fetcher: &F) -> SourceOutcome {
        let result = match &self.kind {
            SourceKind::Unsupported { reason } => return SourceOutcome::Unsupported(*reason),
            SourceKind::Feed => self.fetch_feed(fetcher).await,
            SourceKind::NewsCards { origin, sections } => {
                self.fetch_cards(fetcher, origin, sections).await
            }
        };
        match result {
            Ok(entries) => SourceOutcome::Entries(entries),
            Err(e) => SourceOutcome::Failed(e),
        }
    }

    async fn fetch_feed<F: PageFetcher>(&self, fetcher: &F) -> Result<Vec<NewsEntry>> {
        let body = fetcher.fetch(self.url).await?;
        let entries = feed::parse_feed(&body)?
            .into_iter()
            .take(self.limit)
            .map(|entry| entry.into_news_entry(self.label))
            .collect();
        Ok(entries)
    }

    async fn fetch_cards<F: PageFetcher>(
        &self,
        fetcher: &F,
        origin: &str,
        sections: &[&str],
    ) -> Result<Vec<NewsEntry>> {
        let origin = Url::parse(origin)?;
        let body = fetcher.fetch(self.url).await?;
        let html = String::from_utf8_lossy(&body);
        let entries = cards::extract_news_cards(&html, &origin, sections, self.limit)
            .into_iter()
            .map(|card| NewsEntry::new(self.label, card.title, card.link, now_iso(), ""))
            .collect();
        Ok(entries)
    }
}

/// The fixed source registry, in collection order.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source {
            label: "Google AI Blog",
            url: "https://blog.google/technology/ai/rss/",
            kind: SourceKind::Feed,
            limit: MAX_ENTRIES_PER_SOURCE,
        },
        Source {
            label: "Google DeepMind",
            url: "https://deepmind.google/discover/blog/",
            kind: SourceKind::Unsupported {
                reason: "blog index is rendered client-side by script",
            },
            limit: MAX_ENTRIES_PER_SOURCE,
        },
        Source {
            label: "OpenAI News",
            url: "https://openai.com/news/rss.xml",
            kind: SourceKind::Feed,
            limit: MAX_ENTRIES_PER_SOURCE,
        },
        Source {
            label: "ChatGPT Release Notes",
            url: "https://help.openai.com/en/articles/6825453-chatgpt-release-notes",
            kind: SourceKind::Unsupported {
                reason: "help center answers 403 to non-browser clients and has no per-release links",
            },
            limit: MAX_ENTRIES_PER_SOURCE,
        },
        Source {
            label: "Anthropic",
            url: "https://www.anthropic.com/news",
            kind: SourceKind::NewsCards {
                origin: "https://www.anthropic.com",
                sections: &["/news/", "/research/"],
            },
            limit: MAX_ENTRIES_PER_SOURCE,
        },
    ]
}

/// Run every source in order and concatenate the results.
///
/// No reordering and no cross-source deduplication happens here.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn collect_all<F: PageFetcher>(fetcher: &F, sources: &[Source]) -> Vec<NewsEntry> {
    let mut all = Vec::new();
    for source in sources {
        let outcome = source.fetch(fetcher).await;
        match &outcome {
            SourceOutcome::Entries(entries) => {
                info!(source = source.label, count = entries.len(), "Collected entries");
            }
            SourceOutcome::Unsupported(reason) => {
                warn!(source = source.label, reason = *reason, "Source unsupported; skipping");
            }
            SourceOutcome::Failed(e) => {
                error!(source = source.label, url = source.url, error = %e, "Source failed; skipping");
            }
        }
        all.extend(outcome.into_entries());
    }
    info!(count = all.len(), "Collected entries from all sources");
    all
}
