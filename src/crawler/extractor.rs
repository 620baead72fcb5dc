//! HTML extraction: clean text and child links
//!
//! A fetched page yields two things: the visible text (stored and handed to
//! the downstream extraction pipeline) and the list of same-domain child
//! links (fed back into the frontier). Links that fail canonicalization are
//! dropped silently; keyword matches mark a link for in-level priority but
//! never exclude it.

use crate::url::{canonicalize, DomainScope};
use scraper::node::Node;
use scraper::{Html, Selector};
use url::Url;

/// Tags whose subtrees carry no useful visible text
const BOILERPLATE_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// A same-domain link discovered on a page
#[derive(Debug, Clone)]
pub struct ChildLink {
    /// Canonical in-scope URL
    pub url: Url,

    /// Whether a configured keyword matched the anchor text or URL path
    pub keyword_hit: bool,
}

/// Extracted content of one fetched page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// Page title, empty when the document has none
    pub title: String,

    /// Visible text with boilerplate removed and whitespace collapsed
    pub text: String,

    /// Child links in document order
    pub links: Vec<ChildLink>,
}

/// Parses HTML and extracts title, clean text, and child links
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - The URL the body was fetched from (base for relative hrefs)
/// * `scope` - The job's domain scope
/// * `keywords` - Lowercased keywords for link prioritization (may be empty)
pub fn extract_page(
    html: &str,
    page_url: &Url,
    scope: &DomainScope,
    keywords: &[String],
) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        links: extract_links(&document, page_url, scope, keywords),
    }
}

/// Extracts the page title from the <title> tag
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects visible text, skipping boilerplate subtrees
///
/// Walks the parse tree in document order with an explicit stack; whole
/// subtrees under boilerplate tags are pruned, then whitespace is collapsed
/// to single spaces.
fn extract_text(document: &Html) -> String {
    let mut raw = String::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                raw.push_str(text);
                raw.push(' ');
            }
            Node::Element(element) => {
                if BOILERPLATE_TAGS.contains(&element.name()) {
                    continue;
                }
            }
            _ => {}
        }

        // Push children reversed so they pop in document order
        let mut children: Vec<_> = node.children().collect();
        children.reverse();
        stack.extend(children);
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts canonical same-domain links from <a href> tags
///
/// Skipped outright: `download` links, `javascript:`/`mailto:`/`tel:`/
/// `data:` hrefs, and fragment-only hrefs (same-page anchors). Everything
/// else goes through the canonicalizer, which drops malformed and
/// out-of-scope targets.
fn extract_links(
    document: &Html,
    page_url: &Url,
    scope: &DomainScope,
    keywords: &[String],
) -> Vec<ChildLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            continue;
        }

        let Some(url) = canonicalize(href, page_url, scope) else {
            continue;
        };

        let anchor_text = element.text().collect::<String>();
        let keyword_hit = matches_keyword(&anchor_text, &url, keywords);

        links.push(ChildLink { url, keyword_hit });
    }

    links
}

/// Checks whether any keyword occurs in the anchor text or URL path
fn matches_keyword(anchor_text: &str, url: &Url, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }

    let anchor = anchor_text.to_lowercase();
    let path = url.path().to_lowercase();

    keywords
        .iter()
        .any(|keyword| anchor.contains(keyword) || path.contains(keyword))
}
