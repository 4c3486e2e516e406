//! Delivery of processed entries.
//!
//! - [`discord`]: posts each entry as an embed to a Discord webhook

pub mod discord;

use crate::error::Result;
use crate::models::NewsEntry;

/// What became of one send that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No destination configured; nothing left the process.
    Skipped,
}

/// Something that can deliver one processed entry.
pub trait Notify {
    async fn send(&self, entry: &NewsEntry) -> Result<Delivery>;
}
