use std::collections::BTreeMap;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::fetch::Fetcher;

pub const DEFAULT_CATEGORY_URL: &str = "https://en.wikipedia.org/wiki/Category:Mexican_Grand_Prix";

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static WIKI_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href^='/wiki/']").unwrap());

const SKIPPED_NAMESPACES: &[&str] = &["/wiki/Talk:", "/wiki/Category:", "/wiki/File:", "/wiki/Help:"];

/// Fetch a category listing and return `{year -> article url}`.
pub async fn fetch_year_links(fetcher: &Fetcher, category_url: &str) -> Result<BTreeMap<i32, String>> {
    let base = Url::parse(category_url).with_context(|| format!("Invalid category URL {}", category_url))?;

    info!("Fetching category page: {}", category_url);
    let html = fetcher
        .fetch(category_url)
        .await
        .context("Failed to fetch category page")?;

    let links = parse_year_links(&html, &base);
    info!("Year pages discovered: {}", links.len());
    debug!(
        "[category] years: {}",
        links.keys().map(|y| y.to_string()).collect::<Vec<_>>().join(", ")
    );
    Ok(links)
}

/// Pick Grand Prix year articles out of a category page. The first link seen
/// for a year wins.
pub fn parse_year_links(html: &str, base: &Url) -> BTreeMap<i32, String> {
    let document = Html::parse_document(html);
    let mut links = BTreeMap::new();

    for a in document.select(&WIKI_LINK_SEL) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let text = a.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let Some(year) = YEAR_RE
            .find(text)
            .and_then(|m| m.as_str().parse::<i32>().ok())
        else {
            continue;
        };

        // Link text is sometimes shortened, the href still names the race
        if !text.contains("Grand Prix") && !href.contains("Grand_Prix") {
            continue;
        }
        if SKIPPED_NAMESPACES.iter().any(|ns| href.starts_with(ns)) {
            continue;
        }

        if let Ok(url) = base.join(href) {
            links.entry(year).or_insert_with(|| url.to_string());
        }
    }

    links
}

/// Which discovered years get crawled.
#[derive(Debug, Clone, Copy)]
pub struct YearFilter {
    pub current_year: i32,
    pub only_year: Option<i32>,
    pub exclude_current_year: bool,
}

impl YearFilter {
    pub fn keeps(&self, year: i32) -> bool {
        if year > self.current_year {
            return false;
        }
        if self.exclude_current_year && year == self.current_year {
            return false;
        }
        self.only_year.is_none_or(|only| only == year)
    }

    pub fn apply(&self, links: BTreeMap<i32, String>) -> BTreeMap<i32, String> {
        links.into_iter().filter(|(y, _)| self.keeps(*y)).collect()
    }
}
