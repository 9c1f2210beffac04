use std::sync::LazyLock;

use scraper::node::Element;
use scraper::{ElementRef, Selector};

static HEADLINE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.mw-headline").unwrap());

const EMPTY_MARKER: &str = "mw-empty-elt";
const EDIT_SECTION: &str = "mw-editsection";

/// One direct child of the content container, reduced to what the section
/// scan cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Unclassed `<p>`.
    Paragraph { html: String },
    /// `<p class="mw-empty-elt">`.
    EmptyPlaceholder { html: String },
    /// `<h2>`/`<h3>`, bare or wrapped in a `div.mw-heading`.
    Heading { level: u8, text: String, html: String },
    /// Tables, lists, figures, navboxes, deeper headings.
    Other { html: String },
}

impl Block {
    pub fn html(&self) -> &str {
        match self {
            Block::Paragraph { html }
            | Block::EmptyPlaceholder { html }
            | Block::Heading { html, .. }
            | Block::Other { html } => html,
        }
    }
}

pub fn classify_elements<'a>(children: impl IntoIterator<Item = ElementRef<'a>>) -> Vec<Block> {
    children.into_iter().map(classify).collect()
}

/// Map a single child element to its `Block` kind.
///
/// Handles both heading shapes MediaWiki has emitted over the years:
/// the legacy bare `<h2><span class="mw-headline">..</span></h2>` and the
/// current `<div class="mw-heading mw-heading2"><h2>..</h2></div>` wrapper.
pub fn classify(el: ElementRef<'_>) -> Block {
    let value = el.value();

    if value.name() == "p" {
        if has_class(value, EMPTY_MARKER) {
            return Block::EmptyPlaceholder { html: el.html() };
        }
        if is_unclassed(value) {
            return Block::Paragraph { html: el.html() };
        }
        return Block::Other { html: el.html() };
    }

    if let Some(level) = heading_level(el) {
        return Block::Heading {
            level,
            text: heading_text(el),
            html: el.html(),
        };
    }

    Block::Other { html: el.html() }
}

/// Level 2 or 3 for anything that acts as a section heading, `None` otherwise.
fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    let value = el.value();
    if let Some(level) = tag_level(value.name()) {
        return Some(level);
    }
    if value.name() != "div" {
        return None;
    }

    // Wrapper class carries the level directly
    let by_class = value.classes().find_map(|c| match c {
        "mw-heading2" => Some(2),
        "mw-heading3" => Some(3),
        _ => None,
    });
    if by_class.is_some() {
        return by_class;
    }

    // Bare `mw-heading` wrapper without a level class: ask the inner tag
    if has_class(value, "mw-heading") {
        return el
            .children()
            .filter_map(ElementRef::wrap)
            .find_map(|c| tag_level(c.value().name()));
    }

    None
}

fn tag_level(name: &str) -> Option<u8> {
    match name {
        "h2" => Some(2),
        "h3" => Some(3),
        _ => None,
    }
}

/// Visible heading label with edit links and whitespace noise removed.
/// Returns an empty string when the heading has no text at all.
pub fn heading_text(el: ElementRef<'_>) -> String {
    let target = el
        .select(&HEADLINE_SEL)
        .next()
        .or_else(|| {
            el.children()
                .filter_map(ElementRef::wrap)
                .find(|c| tag_level(c.value().name()).is_some())
        })
        .unwrap_or(el);

    let mut raw = String::new();
    for node in target.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_edit_link = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| has_class(a.value(), EDIT_SECTION));
        if !in_edit_link {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_class(el: &Element, class: &str) -> bool {
    el.classes().any(|c| c == class)
}

fn is_unclassed(el: &Element) -> bool {
    el.attr("class").is_none_or(|c| c.trim().is_empty())
}
