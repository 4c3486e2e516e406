//! Heuristic "news card" extraction for sources without a usable feed.
//!
//! News index pages render each story as an anchor wrapping a date, a
//! category badge, the headline and sometimes a teaser. Flattening the
//! anchor's text nodes with a `|` separator gives something like
//! `"Jan 5, 2024|Research|New Model Release|We trained..."`; dropping the
//! date and category noise leaves the headline as the first fragment.
//!
//! This is a heuristic: nothing guarantees the headline precedes the teaser,
//! and any markup change on the source side can break it.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// `Jan 5, 2024`, `Sept 12, 2025` etc. Matched anywhere in a fragment.
static DATE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]{3}\s+\d{1,2},\s+\d{4}").expect("static regex is valid")
});

/// Category badges and navigation labels, compared case-insensitively.
const CATEGORY_LABELS: &[&str] = &[
    "announcements",
    "research",
    "news",
    "policy",
    "product",
    "company",
    "company news",
    "learning",
];

const FRAGMENT_SEPARATOR: &str = "|";

/// Shorter fragments are icon glyphs or stray punctuation.
const MIN_FRAGMENT_CHARS: usize = 3;

/// A headline and its absolute link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsCard {
    pub title: String,
    pub link: String,
}

/// Extract up to `limit` news cards from an index page.
///
/// Only anchors whose `href` contains one of `sections` (e.g. `/news/`) are
/// considered. Relative links are resolved against `origin`. The first
/// occurrence of a link wins.
#[instrument(level = "debug", skip_all, fields(bytes = html.len(), %origin, limit))]
pub fn extract_news_cards(
    html: &str,
    origin: &Url,
    sections: &[&str],
    limit: usize,
) -> Vec<NewsCard> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !sections.iter().any(|section| href.contains(section)) {
            continue;
        }

        let flattened = anchor.text().collect::<Vec<_>>().join(FRAGMENT_SEPARATOR);
        let Some(title) = pick_title(&flattened) else {
            continue;
        };

        let link = match origin.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!(%href, error = %e, "Skipping unresolvable href");
                continue;
            }
        };

        if seen.insert(link.clone()) {
            cards.push(NewsCard { title, link });
        }
    }

    debug!(total = cards.len(), limit, "Extracted news cards");
    cards.truncate(limit);
    cards
}

/// First fragment of flattened anchor text that is not a date, a category
/// label or too short to be a headline.
pub fn pick_title(flattened: &str) -> Option<String> {
    flattened
        .split(FRAGMENT_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .find(|part| !is_noise(part))
        .map(str::to_string)
}

fn is_noise(fragment: &str) -> bool {
    if DATE_NOISE.is_match(fragment) {
        return true;
    }
    let lower = fragment.to_lowercase();
    if CATEGORY_LABELS.contains(&lower.as_str()) {
        return true;
    }
    fragment.chars().count() < MIN_FRAGMENT_CHARS
}
