pub mod blocks;
pub mod date;
pub mod document;
pub mod sections;

use scraper::Html;
use tracing::debug;

use crate::error::ExtractError;

/// Everything pulled out of one year's article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub date: Option<String>,
    pub lead_html: String,
    pub race_html: String,
    pub lead_count: usize,
    pub race_count: usize,
}

impl PageSummary {
    /// Lead then Race section, blank line between, empty parts dropped.
    pub fn race_summary(&self) -> String {
        [self.lead_html.trim(), self.race_html.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Four-pass pipeline: markup → container children → blocks → sections.
pub fn process_page(html: &str) -> Result<PageSummary, ExtractError> {
    let doc = Html::parse_document(html);
    let children = document::content_children(&doc)?;
    let blocks = blocks::classify_elements(children);
    let sections = sections::extract_sections(&blocks);

    let date = date::find_iso_date(&doc).map(date::pretty);
    debug!("[date] {:?}", date);

    Ok(PageSummary {
        date,
        lead_html: sections.lead_html(),
        race_html: sections.race_html(),
        lead_count: sections.lead_count,
        race_count: sections.race_count,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn modern_page() {
        let s = process_page(&fixture("mexican_gp_2015")).unwrap();
        assert_eq!(s.date.as_deref(), Some("November 1, 2015"));
        assert_eq!(s.lead_count, 2);
        assert_eq!(s.race_count, 2);
        assert!(s.lead_html.contains("2015 Mexican Grand Prix"));
        assert!(!s.lead_html.contains("mw-empty-elt"));
        assert!(!s.lead_html.contains("infobox"));
        assert!(s.race_html.starts_with(r#"<div class="mw-heading mw-heading2"><h2 id="Race">Race</h2>"#));
        assert!(s.race_html.contains("wikitable"));
        assert!(s.race_html.contains("Lap 1"));
        assert!(!s.race_html.contains("pole position"));
        assert!(!s.race_html.contains("Post-race"));
    }

    #[test]
    fn legacy_page() {
        let s = process_page(&fixture("mexican_gp_1990")).unwrap();
        assert_eq!(s.date.as_deref(), Some("June 24, 1990"));
        assert_eq!(s.lead_count, 1);
        assert_eq!(s.race_count, 3);
        assert!(s.race_html.starts_with("<h2>"));
        assert!(s.race_html.contains("Prost"));
        assert!(!s.race_html.contains("Classification"));
    }

    #[test]
    fn nested_race_report() {
        let s = process_page(&fixture("race_report_h3")).unwrap();
        assert_eq!(s.lead_count, 1);
        assert_eq!(s.race_count, 2);
        assert!(s.race_html.contains("Race report"));
        assert!(!s.race_html.contains("Lap-by-lap"));
        assert!(!s.race_html.contains("Background"));
    }

    #[test]
    fn page_without_lead_or_race() {
        let s = process_page(&fixture("no_race")).unwrap();
        assert_eq!(s.lead_html, "");
        assert_eq!(s.race_html, "");
        assert_eq!(s.lead_count, 0);
        assert_eq!(s.race_count, 0);
        assert_eq!(s.race_summary(), "");
    }

    #[test]
    fn page_without_container() {
        let err = process_page("<html><body><p>Not an article</p></body></html>").unwrap_err();
        assert_eq!(err, ExtractError::ContainerNotFound);
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = fixture("mexican_gp_2015");
        assert_eq!(process_page(&html).unwrap(), process_page(&html).unwrap());
    }

    #[test]
    fn attributes_keep_source_order() {
        let s = process_page(&fixture("mexican_gp_2015")).unwrap();
        assert!(s.lead_html.contains(r#"<a href="/wiki/Formula_One" title="Formula One">"#));
        assert!(s
            .race_html
            .contains(r#"<table class="wikitable" style="font-size: 95%;">"#));
    }

    #[test]
    fn summary_joins_non_empty_parts() {
        let mut s = PageSummary {
            date: None,
            lead_html: "<p>a</p>\n".into(),
            race_html: "<h2>Race</h2>".into(),
            lead_count: 1,
            race_count: 0,
        };
        assert_eq!(s.race_summary(), "<p>a</p>\n\n<h2>Race</h2>");
        s.race_html.clear();
        assert_eq!(s.race_summary(), "<p>a</p>");
        s.lead_html.clear();
        s.race_html = "<h2>Race</h2>".into();
        assert_eq!(s.race_summary(), "<h2>Race</h2>");
    }
}
