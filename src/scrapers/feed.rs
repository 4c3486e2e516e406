//! Lenient RSS / Atom feed parser.
//!
//! Real-world feeds mix RSS and Atom conventions and are not always
//! well-formed, so instead of mapping onto a strict schema this module
//! builds a small forgiving element tree with `quick-xml` and then looks
//! entries up by tag name:
//!
//! - mismatched or stray end tags are tolerated; an end tag closes the
//!   nearest open element with the same name, anything left open is closed
//!   at end of input
//! - tag names are compared case-insensitively (`pubDate` == `pubdate`)
//! - a bare `&` or a `<` that cannot start markup is escaped before parsing,
//!   outside CDATA sections and comments
//! - ill-formed markup the reader can step over is skipped
//! - nesting deeper than [`MAX_DEPTH`] is flattened
//! - XML and HTML named entities are resolved
//! - every field of an entry degrades on its own to a default
//!
//! | Field | Looked up in | Default |
//! |-------|--------------|---------|
//! | title | `title` | `"No Title"` |
//! | link | `link[href]`, `link` text, `guid` text | `""` |
//! | published | `pubdate`, `published`, `updated`, `dc:date` | now |
//! | summary | `description`, `summary`, `content`, `content:encoded` | `""` |

use crate::error::Result;
use crate::models::{NO_TITLE, NewsEntry};
use crate::utils::{collapse_whitespace, now_iso};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use regex::bytes::Regex;
use scraper::Html;
use tracing::{debug, instrument};

/// Elements opened below this depth are attached flat to their parent.
pub const MAX_DEPTH: usize = 256;

/// Body of a well-formed reference, right after its `&`.
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("valid reference regex")
});
const MAX_REFERENCE_LEN: usize = 40;

/// Sections copied through untouched by [`escape_stray_markup`].
const VERBATIM: &[(&[u8], &[u8])] = &[(b"<![CDATA[", b"]]>"), (b"<!--", b"-->")];

const ENTRY_TAGS: &[&str] = &["item", "entry"];
const DATE_TAGS: &[&str] = &["pubdate", "published", "updated", "dc:date"];
const SUMMARY_TAGS: &[&str] = &["description", "summary", "content", "content:encoded"];

/// One entry of a parsed feed, before it is tagged with a source label.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
}

impl FeedEntry {
    pub fn into_news_entry(self, source: &str) -> NewsEntry {
        NewsEntry::new(source, self.title, self.link, self.published, self.summary)
    }
}

/// Parse raw feed bytes into entries, in document order.
///
/// Returns an error only when the XML reader gives up entirely; missing
/// fields never fail an entry.
#[instrument(level = "debug", skip_all, fields(bytes = raw.len()))]
pub fn parse_feed(raw: &[u8]) -> Result<Vec<FeedEntry>> {
    let root = build_tree(raw)?;

    let mut items = Vec::new();
    root.find_all(ENTRY_TAGS, &mut items);

    let entries: Vec<FeedEntry> = items.into_iter().map(entry_from_node).collect();
    debug!(count = entries.len(), "Parsed feed entries");
    Ok(entries)
}

fn entry_from_node(item: &Node) -> FeedEntry {
    let title = item
        .find(&["title"])
        .map(|t| collapse_whitespace(&t.text("")))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let mut link = match item.find(&["link"]) {
        Some(node) => match node.attr("href") {
            Some(href) if !href.trim().is_empty() => href.trim().to_string(),
            _ => node.text(""),
        },
        None => String::new(),
    };
    if link.is_empty() {
        if let Some(guid) = item.find(&["guid"]) {
            link = guid.text("");
        }
    }

    let published = item
        .find(DATE_TAGS)
        .map(|p| p.text(""))
        .unwrap_or_else(now_iso);

    let summary = item
        .find(SUMMARY_TAGS)
        .map(|s| plain_text(&s.text(" ")))
        .unwrap_or_default();

    FeedEntry {
        title,
        link,
        published,
        summary,
    }
}

/// Summaries often carry escaped or CDATA-wrapped HTML; flatten it to text.
fn plain_text(text: &str) -> String {
    if !text.contains('<') {
        return collapse_whitespace(text);
    }
    let fragment = Html::parse_fragment(text);
    let flattened = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&flattened)
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
}

#[derive(Debug)]
enum Child {
    Element(Node),
    Text(String),
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_lowercase();
        let attrs = start
            .attributes()
            .with_checks(false)
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
                let value = attr
                    .unescape_value_with(resolve_predefined_entity)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append text, merging with a directly preceding text child so that
    /// entity references do not split a string in two.
    fn push_text(&mut self, text: &str) {
        if let Some(Child::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Child::Text(text.to_string()));
        }
    }

    /// First descendant (pre-order) whose name is one of `names`.
    fn find(&self, names: &[&str]) -> Option<&Node> {
        for child in &self.children {
            if let Child::Element(node) = child {
                if names.contains(&node.name.as_str()) {
                    return Some(node);
                }
                if let Some(found) = node.find(names) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All descendants (pre-order) whose name is one of `names`.
    fn find_all<'a>(&'a self, names: &[&str], out: &mut Vec<&'a Node>) {
        for child in &self.children {
            if let Child::Element(node) = child {
                if names.contains(&node.name.as_str()) {
                    out.push(node);
                }
                node.find_all(names, out);
            }
        }
    }

    /// Every descendant string, trimmed, empties dropped, joined by `sep`.
    fn text(&self, sep: &str) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(sep)
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        for child in &self.children {
            match child {
                Child::Text(t) => {
                    let t = t.trim();
                    if !t.is_empty() {
                        out.push(t);
                    }
                }
                Child::Element(node) => node.collect_text(out),
            }
        }
    }
}

/// Stack of open elements; index 0 is the synthetic document root.
struct TreeBuilder {
    stack: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::default()],
        }
    }

    fn top(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, node: Node) {
        if self.stack.len() > MAX_DEPTH {
            self.leaf(node);
        } else {
            self.stack.push(node);
        }
    }

    fn leaf(&mut self, node: Node) {
        self.top().children.push(Child::Element(node));
    }

    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.top().push_text(text);
        }
    }

    /// Close the nearest open element named `name`, together with anything
    /// still open inside it. Unknown end tags are ignored.
    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|n| n.name == name) else {
            return;
        };
        if pos == 0 {
            return;
        }
        while self.stack.len() > pos {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(node) = self.stack.pop() {
            self.top().children.push(Child::Element(node));
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack.pop().unwrap_or_default()
    }
}

fn build_tree(raw: &[u8]) -> Result<Node> {
    let cleaned = escape_stray_markup(raw);
    let mut reader = Reader::from_reader(cleaned.as_slice());
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut builder = TreeBuilder::new();
    let mut buf = Vec::new();
    let mut last_error_at = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => builder.open(Node::from_start(&e)),
            Ok(Event::Empty(e)) => builder.leaf(Node::from_start(&e)),
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                builder.close(&name);
            }
            Ok(Event::Text(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::CData(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => builder.text(&resolve_reference(&e)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(quick_xml::Error::IllFormed(e)) => {
                let at = reader.buffer_position();
                debug!(error = %e, position = at, "Skipping ill-formed markup");
                if last_error_at.replace(at) == Some(at) {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(builder.finish())
}

/// Escape every `&` that does not start a reference and every `<` that
/// cannot start markup. CDATA sections and comments are copied as is.
fn escape_stray_markup(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    'scan: while i < raw.len() {
        let rest = &raw[i..];
        for (open, close) in VERBATIM {
            if rest.starts_with(open) {
                let body = &rest[open.len()..];
                let end = body
                    .windows(close.len())
                    .position(|w| w == *close)
                    .map_or(rest.len(), |at| open.len() + at + close.len());
                out.extend_from_slice(&rest[..end]);
                i += end;
                continue 'scan;
            }
        }
        match rest[0] {
            b'&' if !REFERENCE.is_match(&rest[1..rest.len().min(MAX_REFERENCE_LEN)]) => {
                out.extend_from_slice(b"&amp;");
            }
            b'<' if !rest.get(1).is_some_and(|&b| starts_markup(b)) => {
                out.extend_from_slice(b"&lt;");
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

fn starts_markup(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?' | b'_' | b':') || !b.is_ascii()
}

/// Character references first, then XML and HTML named entities. Anything
/// unknown is kept verbatim.
fn resolve_reference(reference: &BytesRef<'_>) -> String {
    match reference.resolve_char_ref() {
        Ok(Some(c)) => return c.to_string(),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "Invalid character reference"),
    }
    let name = String::from_utf8_lossy(reference);
    match resolve_predefined_entity(&name) {
        Some(text) => text.to_string(),
        None => format!("&{name};"),
    }
}
