use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::parser::PageSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphCount {
    pub intro: usize,
    pub race_detail: usize,
}

/// One year's record in the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub date: Option<String>,
    pub race_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_paragraph_count: Option<ParagraphCount>,
}

impl YearEntry {
    pub fn from_summary(summary: &PageSummary, with_counts: bool) -> Self {
        let counts = with_counts.then(|| ParagraphCount {
            intro: summary.lead_count,
            race_detail: summary.race_count,
        });
        Self {
            date: summary.date.clone(),
            race_summary: summary.race_summary(),
            summary_paragraph_count: counts,
        }
    }
}

/// `{year -> entry}`, serialized oldest year first.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Summaries(BTreeMap<i32, YearEntry>);

impl Summaries {
    pub fn insert(&mut self, year: i32, entry: YearEntry) {
        self.0.insert(year, entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize summaries")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(summary: &str) -> YearEntry {
        YearEntry {
            date: None,
            race_summary: summary.to_string(),
            summary_paragraph_count: None,
        }
    }

    #[test]
    fn years_ascending() {
        let mut out = Summaries::default();
        out.insert(2017, entry("c"));
        out.insert(2015, entry("a"));
        out.insert(1990, entry("old"));
        out.insert(2016, entry("b"));
        let json = out.to_json().unwrap();
        let pos = |k: &str| json.find(&format!("\"{}\"", k)).unwrap();
        assert!(pos("1990") < pos("2015"));
        assert!(pos("2015") < pos("2016"));
        assert!(pos("2016") < pos("2017"));
    }

    #[test]
    fn counts_only_when_requested() {
        let summary = PageSummary {
            date: Some("November 1, 2015".into()),
            lead_html: "<p>lead</p>".into(),
            race_html: "<h2>Race</h2>\n\n<p>r</p>".into(),
            lead_count: 1,
            race_count: 1,
        };

        let plain = serde_json::to_value(YearEntry::from_summary(&summary, false)).unwrap();
        assert_eq!(
            plain,
            serde_json::json!({
                "date": "November 1, 2015",
                "race_summary": "<p>lead</p>\n\n<h2>Race</h2>\n\n<p>r</p>",
            })
        );

        let diag = serde_json::to_value(YearEntry::from_summary(&summary, true)).unwrap();
        assert_eq!(
            diag["summary_paragraph_count"],
            serde_json::json!({ "intro": 1, "race_detail": 1 })
        );
    }

    #[test]
    fn missing_date_is_null() {
        let mut out = Summaries::default();
        out.insert(1962, entry(""));
        let v: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert!(v["1962"]["date"].is_null());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("mexico.json");
        let mut out = Summaries::default();
        out.insert(2015, entry("Autódromo Hermanos Rodríguez"));
        out.write(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII stays unescaped
        assert!(written.contains("Autódromo Hermanos Rodríguez"));
        assert_eq!(out.len(), 1);
        assert!(!out.is_empty());
    }
}
