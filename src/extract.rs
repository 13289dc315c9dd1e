//! Article body recovery.
//!
//! The extractor fetches an entry's page and looks for the article body
//! using an ordered table of [`Strategy`] rules. The first rule that locates
//! an element decides the outcome: if that element holds enough text it is
//! used, otherwise the page is abandoned. When the page yields nothing, the
//! feed's own content, summary or description is used instead.
//!
//! # Default strategy table
//!
//! | Tag | Match | Provenance |
//! |-----|-------|------------|
//! | `div` | class `article-content` | page-primary |
//! | `div` | class `post-content` | page-primary |
//! | `div` | class `entry-content` | page-primary |
//! | `div` | class contains `article__body` | page-primary |
//! | `div` | class contains `article-text` | page-primary |
//! | `main` | any | page-fallback-selector |
//! | `article` | any | page-fallback-selector |

use crate::http::get_text;
use crate::models::{ExtractionResult, FeedEntry, Provenance};
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// How a strategy recognises its element, beyond the tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Any element with the tag.
    Any,
    /// One of the element's classes equals the value.
    ClassEquals(String),
    /// The raw `class` attribute contains the value as a substring.
    ClassContains(String),
    IdEquals(String),
}

/// One row of the content-location table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub tag: String,
    pub locator: Locator,
    /// Generic containers are reported as `page-fallback-selector`.
    #[serde(default)]
    pub fallback: bool,
}

impl Strategy {
    pub fn new(tag: &str, locator: Locator) -> Self {
        Self {
            tag: tag.to_string(),
            locator,
            fallback: false,
        }
    }

    pub fn generic(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            locator: Locator::Any,
            fallback: true,
        }
    }

    pub fn matches(&self, el: ElementRef<'_>) -> bool {
        let element = el.value();
        if element.name() != self.tag {
            return false;
        }
        match &self.locator {
            Locator::Any => true,
            Locator::ClassEquals(v) => element.classes().any(|c| c == v),
            Locator::ClassContains(v) => element.attr("class").is_some_and(|c| c.contains(v.as_str())),
            Locator::IdEquals(v) => element.id() == Some(v.as_str()),
        }
    }

    /// First matching element in document order.
    pub fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| self.matches(*el))
    }

    fn provenance(&self) -> Provenance {
        if self.fallback {
            Provenance::PageFallbackSelector
        } else {
            Provenance::PagePrimary
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Everything the extractor needs to know about page structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub strategies: Vec<Strategy>,
    /// Subtrees with these tags are never read.
    pub pruned_tags: Vec<String>,
    /// Subtrees whose `class` contains any of these are never read.
    pub pruned_class_fragments: Vec<String>,
    /// Elements whose own text is collected.
    pub block_tags: Vec<String>,
    /// Blocks with this many characters or fewer are ignored.
    pub min_block_chars: usize,
    /// Page text with fewer words is rejected.
    pub min_words: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            strategies: vec![
                Strategy::new("div", Locator::ClassEquals("article-content".into())),
                Strategy::new("div", Locator::ClassEquals("post-content".into())),
                Strategy::new("div", Locator::ClassEquals("entry-content".into())),
                Strategy::new("div", Locator::ClassContains("article__body".into())),
                Strategy::new("div", Locator::ClassContains("article-text".into())),
                Strategy::generic("main"),
                Strategy::generic("article"),
            ],
            pruned_tags: strings(&[
                "script", "style", "noscript", "nav", "header", "footer", "aside", "form",
                "button", "input", "select", "textarea", "iframe",
            ]),
            pruned_class_fragments: strings(&[
                "advertisement",
                "social-share",
                "related-articles",
                "comments",
                "sidebar",
                "category-list",
            ]),
            block_tags: strings(&["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "div"]),
            min_block_chars: 20,
            min_words: 50,
        }
    }
}

impl ExtractionRules {
    fn is_pruned(&self, el: ElementRef<'_>) -> bool {
        let element = el.value();
        if self.pruned_tags.iter().any(|t| t == element.name()) {
            return true;
        }
        element.attr("class").is_some_and(|class| {
            self.pruned_class_fragments
                .iter()
                .any(|f| class.contains(f.as_str()))
        })
    }

    fn is_block(&self, el: ElementRef<'_>) -> bool {
        self.block_tags.iter().any(|t| t == el.value().name())
    }

    /// Text of `el` that is not inside a nested block or a pruned subtree.
    fn own_text(&self, el: ElementRef<'_>, buf: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => buf.push_str(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_pruned(child) || self.is_block(child) {
                        buf.push(' ');
                    } else {
                        self.own_text(child, buf);
                    }
                }
                _ => {}
            }
        }
    }

    fn push_block_text(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        if !self.is_block(el) {
            return;
        }
        let mut buf = String::new();
        self.own_text(el, &mut buf);
        let text = buf.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.chars().count() > self.min_block_chars {
            out.push(text);
        }
    }

    fn collect_blocks(&self, el: ElementRef<'_>, out: &mut Vec<String>) {
        if self.is_pruned(el) {
            return;
        }
        self.push_block_text(el, out);
        for child in el.children().filter_map(ElementRef::wrap) {
            self.collect_blocks(child, out);
        }
    }

    /// Block text under a located element. Pruning applies to its
    /// descendants only; the element's own classes never discard it.
    fn collect_content(&self, root: ElementRef<'_>) -> Vec<String> {
        let mut blocks = Vec::new();
        self.push_block_text(root, &mut blocks);
        for child in root.children().filter_map(ElementRef::wrap) {
            self.collect_blocks(child, &mut blocks);
        }
        blocks
    }

    /// Run the strategy table against a page.
    ///
    /// Returns `None` when no strategy locates an element, or when the
    /// located element holds fewer than `min_words` words.
    pub fn extract_from_html(&self, html: &str) -> Option<ExtractionResult> {
        let document = Html::parse_document(html);
        let (index, strategy, root) = self
            .strategies
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.locate(&document).map(|el| (i, s, el)))?;

        let text = self.collect_content(root).join(" ");
        let words = text.split_whitespace().count();
        if words < self.min_words {
            debug!(
                strategy = index,
                tag = %strategy.tag,
                words,
                min = self.min_words,
                "Located element is not substantive"
            );
            return None;
        }
        debug!(strategy = index, tag = %strategy.tag, words, "Extracted page text");
        Some(ExtractionResult {
            text,
            provenance: strategy.provenance(),
        })
    }
}

/// The entry's own copy of the article: content, then summary, then
/// description.
pub fn from_feed(entry: &FeedEntry) -> ExtractionResult {
    match entry.embedded_content() {
        Some((field, text)) => {
            debug!(field, "Using feed-embedded content");
            ExtractionResult {
                text: text.to_string(),
                provenance: Provenance::FeedEmbedded,
            }
        }
        None => ExtractionResult::empty(),
    }
}

/// Recovers article text for feed entries.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    client: reqwest::Client,
    rules: ExtractionRules,
}

impl ContentExtractor {
    pub fn new(client: reqwest::Client, rules: ExtractionRules) -> Self {
        Self { client, rules }
    }

    /// Recover the article text for a feed entry.
    ///
    /// Fetches the entry's link and runs the strategy table against the
    /// page. When there is no link, the fetch fails, or the page has no
    /// substantive body, the entry's own content, summary or description is
    /// used instead.
    ///
    /// # Arguments
    ///
    /// * `entry` - The feed entry to recover text for
    ///
    /// # Returns
    ///
    /// The raw (not yet normalized) text and its provenance. Never fails;
    /// when nothing is found the result is empty with provenance `empty`.
    #[instrument(level = "info", skip_all, fields(link = entry.link().unwrap_or("")))]
    pub async fn extract(&self, entry: &FeedEntry) -> ExtractionResult {
        match entry.link() {
            Some(link) => match get_text(&self.client, link).await {
                Ok(html) => match self.rules.extract_from_html(&html) {
                    Some(result) => return result,
                    None => debug!("No substantive page text; using feed content"),
                },
                Err(e) => warn!(error = %e, "Page fetch failed; using feed content"),
            },
            None => debug!("Entry has no link; using feed content"),
        }
        from_feed(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn words(n: usize, stem: &str) -> String {
        (0..n)
            .map(|i| format!("{stem}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn paragraphs(total_words: usize, stem: &str) -> String {
        let text = words(total_words, stem);
        let ws: Vec<&str> = text.split(' ').collect();
        ws.chunks(10)
            .map(|c| format!("<p>{}</p>", c.join(" ")))
            .collect()
    }

    fn page(body: &str) -> String {
        format!("<html><head><title>t</title><script>var x;</script></head><body>{body}</body></html>")
    }

    fn extractor() -> ContentExtractor {
        let client = build_client(Duration::from_secs(5)).unwrap();
        ContentExtractor::new(client, ExtractionRules::default())
    }

    #[test]
    fn primary_strategy_extracts_and_prunes() {
        let html = page(&format!(
            r#"<nav><p>Home Nieuws Sport Weer Verkeer Contact</p></nav>
            <div class="article-content">
              <h1>Grote brand in schuur bij Assen</h1>
              {}
              <div class="social-share"><p>Deel dit artikel op sociale media nu</p></div>
              <script>tracking()</script>
              <p>kort</p>
            </div>
            <footer><p>Copyright RTV Drenthe alle rechten voorbehouden</p></footer>"#,
            paragraphs(60, "woord")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.provenance, Provenance::PagePrimary);
        assert!(result.text.starts_with("Grote brand in schuur bij Assen woord0"));
        assert!(result.text.contains("woord59"));
        assert!(!result.text.contains("Deel dit"));
        assert!(!result.text.contains("tracking"));
        assert!(!result.text.contains("Copyright"));
        assert!(!result.text.contains("kort"));
    }

    #[test]
    fn class_equals_matches_one_of_many_classes() {
        let html = page(&format!(
            r#"<div class="wrapper post-content large">{}</div>"#,
            paragraphs(55, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.provenance, Provenance::PagePrimary);
    }

    #[test]
    fn generic_container_is_fallback_selector() {
        let html = page(&format!("<main>{}</main>", paragraphs(50, "w")));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.provenance, Provenance::PageFallbackSelector);
        assert_eq!(result.text.split_whitespace().count(), 50);
    }

    #[test]
    fn first_located_strategy_wins_even_if_thin() {
        let html = page(&format!(
            r#"<div class="article-content"><p>Alleen een korte inleiding hier.</p></div>
            <main>{}</main>"#,
            paragraphs(200, "w")
        ));
        assert!(ExtractionRules::default().extract_from_html(&html).is_none());
    }

    #[test]
    fn no_strategy_matches() {
        let html = page(&format!("<section>{}</section>", paragraphs(80, "w")));
        assert!(ExtractionRules::default().extract_from_html(&html).is_none());
    }

    #[test]
    fn nested_blocks_are_not_duplicated() {
        let html = page(&format!(
            r#"<article><div>Inleidende tekst van het artikel staat hier<p>{}</p></div></article>"#,
            words(50, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.text.matches("w49").count(), 1);
        assert!(result.text.starts_with("Inleidende tekst van het artikel staat hier w0"));
    }

    #[test]
    fn inline_markup_is_kept_in_block_text() {
        let html = page(&format!(
            r#"<article><p>Dit is <b>vetgedrukt</b> en <a href="/x">een link</a> in de zin.</p>{}</article>"#,
            paragraphs(50, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert!(result.text.starts_with("Dit is vetgedrukt en een link in de zin."));
    }

    #[test]
    fn located_element_class_does_not_prune_it() {
        let html = page(&format!(
            r#"<article class="story has-comments">{}</article>"#,
            paragraphs(80, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.provenance, Provenance::PageFallbackSelector);
        assert_eq!(result.text.split_whitespace().count(), 80);
    }

    #[test]
    fn descendants_of_pruned_looking_root_are_still_pruned() {
        let html = page(&format!(
            r#"<main class="layout-with-sidebar">{}
            <div class="comments"><p>Reactie van een lezer onder het artikel</p></div></main>"#,
            paragraphs(60, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert_eq!(result.text.split_whitespace().count(), 60);
        assert!(!result.text.contains("Reactie"));
    }

    #[test]
    fn block_root_contributes_its_own_text() {
        let html = page(&format!(
            r#"<div class="article-content sidebar-aware">Inleiding die direct in de container staat{}</div>"#,
            paragraphs(50, "w")
        ));
        let result = ExtractionRules::default().extract_from_html(&html).unwrap();
        assert!(result.text.starts_with("Inleiding die direct in de container staat w0"));
    }

    #[test]
    fn custom_strategy_by_id() {
        let mut rules = ExtractionRules::default();
        rules.strategies.insert(
            0,
            Strategy::new("section", Locator::IdEquals("story".into())),
        );
        let html = page(&format!(r#"<section id="story">{}</section>"#, paragraphs(50, "w")));
        let result = rules.extract_from_html(&html).unwrap();
        assert_eq!(result.provenance, Provenance::PagePrimary);
    }

    #[test]
    fn feed_fallback_priority() {
        let mut entry = FeedEntry::default();
        assert_eq!(from_feed(&entry), ExtractionResult::empty());

        entry.description = Some("description".into());
        assert_eq!(from_feed(&entry).text, "description");

        entry.summary = Some("summary".into());
        assert_eq!(from_feed(&entry).text, "summary");

        entry.content = Some("content".into());
        let result = from_feed(&entry);
        assert_eq!(result.text, "content");
        assert_eq!(result.provenance, Provenance::FeedEmbedded);
    }

    #[tokio::test]
    async fn server_error_falls_back_to_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let entry = FeedEntry {
            link: Some(format!("{}/a", server.uri())),
            summary: Some("Samenvatting uit de feed".into()),
            description: Some("Beschrijving".into()),
            ..FeedEntry::default()
        };
        let result = extractor().extract(&entry).await;
        assert_eq!(result.provenance, Provenance::FeedEmbedded);
        assert_eq!(result.text, "Samenvatting uit de feed");
    }

    #[tokio::test]
    async fn thin_page_falls_back_to_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page("<article><p>Te weinig tekst op deze pagina.</p></article>")),
            )
            .mount(&server)
            .await;

        let entry = FeedEntry {
            link: Some(format!("{}/thin", server.uri())),
            content: Some("<p>Rijke inhoud</p>".into()),
            summary: Some("Samenvatting".into()),
            ..FeedEntry::default()
        };
        let result = extractor().extract(&entry).await;
        assert_eq!(result.text, "<p>Rijke inhoud</p>");
    }

    #[tokio::test]
    async fn fetched_page_wins_over_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/full"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page(&format!(
                        r#"<div class="entry-content">{}</div>"#,
                        paragraphs(70, "w")
                    ))),
            )
            .mount(&server)
            .await;

        let entry = FeedEntry {
            link: Some(format!("{}/full", server.uri())),
            summary: Some("Samenvatting".into()),
            ..FeedEntry::default()
        };
        let result = extractor().extract(&entry).await;
        assert_eq!(result.provenance, Provenance::PagePrimary);
        assert_eq!(result.text.split_whitespace().count(), 70);
    }

    #[tokio::test]
    async fn missing_link_and_content_is_empty() {
        let result = extractor().extract(&FeedEntry::default()).await;
        assert!(result.is_empty());
        assert_eq!(result.provenance, Provenance::Empty);
    }

    #[tokio::test]
    async fn unreachable_host_falls_back() {
        let entry = FeedEntry {
            link: Some("http://127.0.0.1:9/nowhere".into()),
            description: Some("Beschrijving".into()),
            ..FeedEntry::default()
        };
        let result = extractor().extract(&entry).await;
        assert_eq!(result.text, "Beschrijving");
    }
}
