use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ExtractError;

/// Content wrapper selectors, most specific first. Skins before 2023 put
/// `mw-content-ltr` on the outer `#mw-content-text` div instead, so the bare
/// `mw-parser-output` token is the fallback.
const CONTAINER_SELECTORS: &[&str] = &[
    "div.mw-content-ltr.mw-parser-output",
    "div#mw-content-text > div.mw-parser-output",
    "div.mw-parser-output",
];

static CONTAINERS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .map(|s| (*s, Selector::parse(s).unwrap()))
        .collect()
});

/// Locate the article body wrapper.
pub fn find_container(document: &Html) -> Result<ElementRef<'_>, ExtractError> {
    for (raw, selector) in CONTAINERS.iter() {
        if let Some(el) = document.select(selector).next() {
            debug!("[container] matched {}", raw);
            return Ok(el);
        }
    }
    Err(ExtractError::ContainerNotFound)
}

/// Direct element children of the content container, in document order.
/// Top-level text and comment nodes are dropped.
pub fn content_children(document: &Html) -> Result<Vec<ElementRef<'_>>, ExtractError> {
    let container = find_container(document)?;
    let children: Vec<_> = container.children().filter_map(ElementRef::wrap).collect();
    debug!("[container] {} child elements", children.len());
    Ok(children)
}
