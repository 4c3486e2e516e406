//! One end-to-end run: collect, gate on history, translate, record, deliver.
//!
//! Items are handled strictly one after another. For each new item the
//! history is written *before* delivery is attempted, so a crash or a failed
//! send means a missed notification rather than a duplicate one next run.
//!
//! Source, translation and delivery failures are logged and absorbed here or
//! below; only history I/O errors are returned.

use crate::cli::Config;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::outputs::{Delivery, Notify};
use crate::scrapers::fetch::PageFetcher;
use crate::scrapers::{Source, collect_all};
use crate::translate::{Translate, translate_entry};
use tracing::{error, info, instrument};

/// Counters for one run, logged at the end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub new: usize,
    pub delivered: usize,
    pub skipped_deliveries: usize,
    pub failed_deliveries: usize,
}

#[instrument(level = "info", skip_all, fields(history = %config.history_file.display(), dry_run = config.dry_run))]
pub async fn run<F, T, N>(
    config: &Config,
    fetcher: &F,
    sources: &[Source],
    translator: &T,
    notifier: &N,
) -> Result<RunSummary>
where
    F: PageFetcher,
    T: Translate,
    N: Notify,
{
    let mut history = HistoryStore::load(&config.history_file).await?;
    info!(known_links = history.len(), "History ready");

    let entries = collect_all(fetcher, sources).await;
    let mut summary = RunSummary {
        fetched: entries.len(),
        ..RunSummary::default()
    };
    info!(count = summary.fetched, "Fetched items");

    let new_entries = history.filter_new(entries);
    summary.new = new_entries.len();
    if new_entries.is_empty() {
        info!("No new items found");
        return Ok(summary);
    }

    if config.dry_run {
        for entry in &new_entries {
            info!(source = %entry.source, title = %entry.title, link = %entry.link, "New item (dry run)");
        }
        return Ok(summary);
    }

    for mut entry in new_entries {
        info!(source = %entry.source, title = %entry.title, published = %entry.published, "Processing new item");

        translate_entry(translator, &mut entry).await;

        history.record(&entry).await?;

        match notifier.send(&entry).await {
            Ok(Delivery::Sent) => summary.delivered += 1,
            Ok(Delivery::Skipped) => summary.skipped_deliveries += 1,
            Err(e) => {
                error!(link = %entry.link, error = %e, "Failed to deliver item; it stays recorded");
                summary.failed_deliveries += 1;
            }
        }
    }

    info!(
        fetched = summary.fetched,
        new = summary.new,
        delivered = summary.delivered,
        skipped = summary.skipped_deliveries,
        failed = summary.failed_deliveries,
        "News check completed"
    );
    Ok(summary)
}
