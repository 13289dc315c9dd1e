//! Feed fetching and parsing.
//!
//! Handles RSS 2.0, RSS 1.0 (RDF) and Atom documents with a single
//! streaming `quick-xml` pass. Only the per-item fields the pipeline needs
//! are captured into [`FeedEntry`]; channel-level metadata is ignored.

use crate::error::{DigestError, Result};
use crate::http::get_text;
use crate::models::FeedEntry;
use crate::utils::truncate_for_log;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};
use tracing::{debug, info, instrument, warn};
use url::Url;

const ROOTS: [&str; 3] = ["rss", "feed", "rdf:RDF"];

/// Item-level elements the parser captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
    PubDate,
    Updated,
    DcDate,
    Content,
    Summary,
    Description,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "title" => Field::Title,
            "link" => Field::Link,
            "published" => Field::Published,
            "pubDate" => Field::PubDate,
            "updated" => Field::Updated,
            "dc:date" => Field::DcDate,
            "content:encoded" | "content" => Field::Content,
            "summary" => Field::Summary,
            "description" => Field::Description,
            _ => return None,
        })
    }

    /// Store `value` unless the slot already holds something; the first
    /// occurrence of a field within an item wins.
    fn assign(self, entry: &mut FeedEntry, value: &str) {
        if value.is_empty() {
            return;
        }
        let slot = match self {
            Field::Title => &mut entry.title,
            Field::Link => &mut entry.link,
            Field::Published => &mut entry.published,
            Field::PubDate => &mut entry.pub_date,
            Field::Updated => &mut entry.updated,
            Field::DcDate => &mut entry.dc_date,
            Field::Content => &mut entry.content,
            Field::Summary => &mut entry.summary,
            Field::Description => &mut entry.description,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn text_of(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        // Undeclared HTML entities such as `&nbsp;`; the normalizer decodes them later.
        Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
    }
}

/// The `href` of an Atom `<link>` if it points at the article itself.
fn alternate_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().ok()?.into_owned();
        match attr.key.as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href,
        _ => None,
    }
}

/// Parse a feed document into its entries, in document order.
///
/// # Errors
///
/// Returns [`DigestError::Xml`] for XML syntax errors and
/// [`DigestError::MalformedFeed`] when the document is not a feed or ends
/// inside an item.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_root = false;
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut nested = 0usize;
    let mut buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                if !saw_root {
                    if !ROOTS.contains(&name.as_str()) {
                        return Err(DigestError::MalformedFeed(format!(
                            "unexpected root element <{name}>"
                        )));
                    }
                    saw_root = true;
                    continue;
                }
                if field.is_some() {
                    // Markup inside a captured field (e.g. Atom xhtml content).
                    nested += 1;
                    buf.push(' ');
                    continue;
                }
                if name == "item" || name == "entry" {
                    current = Some(FeedEntry::default());
                    continue;
                }
                if let Some(entry) = current.as_mut() {
                    if name == "link" {
                        if let Some(href) = alternate_href(&e) {
                            Field::Link.assign(entry, href.trim());
                        }
                    }
                    field = Field::from_name(&name);
                    buf.clear();
                }
            }
            Event::Empty(e) => {
                if field.is_some() {
                    continue;
                }
                if let Some(entry) = current.as_mut() {
                    if element_name(&e) == "link" {
                        if let Some(href) = alternate_href(&e) {
                            Field::Link.assign(entry, href.trim());
                        }
                    }
                }
            }
            Event::Text(e) => {
                if field.is_some() {
                    buf.push_str(&text_of(&e));
                }
            }
            Event::CData(e) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::End(e) => {
                if let Some(f) = field {
                    if nested > 0 {
                        nested -= 1;
                        buf.push(' ');
                        continue;
                    }
                    if let Some(entry) = current.as_mut() {
                        f.assign(entry, buf.trim());
                    }
                    field = None;
                    continue;
                }
                let name = e.name();
                if matches!(name.as_ref(), b"item" | b"entry") {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(DigestError::MalformedFeed("document has no root element".into()));
    }
    if current.is_some() {
        return Err(DigestError::MalformedFeed(
            "document ends inside an item".into(),
        ));
    }
    Ok(entries)
}

/// Resolve relative entry links against the feed URL.
fn resolve_links(feed_url: &str, entries: &mut [FeedEntry]) {
    let Ok(base) = Url::parse(feed_url) else {
        return;
    };
    for entry in entries.iter_mut() {
        let Some(link) = entry.link.as_deref() else {
            continue;
        };
        if Url::parse(link).is_ok() {
            continue;
        }
        let resolved = match base.join(link) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(%link, error = %e, "Could not resolve relative entry link");
                continue;
            }
        };
        entry.link = Some(resolved);
    }
}

/// Fetch and parse one feed.
///
/// # Errors
///
/// Any network failure, non-2xx status, or malformed document. The caller
/// skips the feed.
#[instrument(level = "info", skip_all, fields(feed_url = %feed_url))]
pub async fn fetch_feed(client: &reqwest::Client, feed_url: &str) -> Result<Vec<FeedEntry>> {
    let body = get_text(client, feed_url).await?;
    debug!(bytes = body.len(), "Fetched feed document");
    let mut entries = parse_feed(&body).inspect_err(|_| {
        debug!(preview = %truncate_for_log(&body, 200), "Feed body could not be parsed");
    })?;
    resolve_links(feed_url, &mut entries);
    info!(count = entries.len(), "Parsed feed entries");
    Ok(entries)
}
