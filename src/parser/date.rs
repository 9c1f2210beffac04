use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static DATETIME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime], span[datetime]").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[title]").unwrap());

/// First `YYYY-MM-DD` found in a `datetime` attribute, then in any `title`
/// attribute (infobox date spans carry one or the other).
pub fn find_iso_date(document: &Html) -> Option<NaiveDate> {
    let by_datetime = document
        .select(&DATETIME_SEL)
        .filter_map(|el| el.value().attr("datetime"))
        .find_map(parse_iso);
    by_datetime.or_else(|| {
        document
            .select(&TITLE_SEL)
            .filter_map(|el| el.value().attr("title"))
            .find_map(parse_iso)
    })
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !ISO_DATE_RE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// "November 1, 2015"
pub fn pretty(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
