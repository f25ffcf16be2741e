//! Stage 1: scrape the listing page for papers published on the target date.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use scraper::{Html, Selector};
use tracing::info;

use crate::config::{Config, LISTING_HOST, LISTING_URL};
use crate::model::Paper;

/// Fetch the listing page and return candidates for `target`. A failure here
/// is fatal to the whole run; there is nothing to do without the listing.
pub async fn fetch_candidates(
    http: &reqwest::Client,
    cfg: &Config,
    target: NaiveDate,
) -> Result<Vec<Paper>> {
    info!("Fetching listing: {}", LISTING_URL);
    let html = http
        .get(LISTING_URL)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("failed to fetch papers listing")?;

    Ok(parse_listing(&html, target, cfg.max_listing_entries))
}

/// Pull candidates out of the listing HTML. Entries missing a title or link
/// are skipped without error; entries whose `time[datetime]` does not match
/// `target` are skipped; entries with no timestamp at all are kept.
pub fn parse_listing(html: &str, target: NaiveDate, max_entries: usize) -> Vec<Paper> {
    let doc = Html::parse_document(html);
    let article_sel = Selector::parse("article").unwrap();
    let title_sel = Selector::parse("h3").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();
    let time_sel = Selector::parse("time[datetime]").unwrap();

    let target_str = target.format("%Y-%m-%d").to_string();
    let mut papers = Vec::new();

    for article in doc.select(&article_sel).take(max_entries) {
        let Some(title) = article
            .select(&title_sel)
            .next()
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let Some(href) = article
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let link = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{LISTING_HOST}{href}")
        };

        if let Some(datetime) = article
            .select(&time_sel)
            .next()
            .and_then(|t| t.value().attr("datetime"))
        {
            if datetime.get(..10) != Some(target_str.as_str()) {
                continue;
            }
        }

        papers.push(Paper::new(title, link, target));
    }

    papers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, href: &str, datetime: Option<&str>) -> String {
        let time = datetime
            .map(|d| format!("<time datetime=\"{d}\">posted</time>"))
            .unwrap_or_default();
        format!("<article><h3>{title}</h3><a href=\"{href}\">view</a>{time}</article>")
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn keeps_only_entries_dated_to_target() {
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            article("Paper A", "/papers/1111.0001", Some("2025-06-10T08:00:00Z")),
            article("Paper B", "/papers/1111.0002", Some("2025-06-09T08:00:00Z")),
            article("Paper C", "/papers/1111.0003", Some("2025-06-11T08:00:00Z")),
        );
        let papers = parse_listing(&html, target(), 50);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Paper A");
        assert_eq!(papers[0].source_link, "https://huggingface.co/papers/1111.0001");
    }

    #[test]
    fn entry_without_title_or_link_is_skipped() {
        let html = format!(
            "<html><body><article><a href=\"/papers/x\">no heading</a></article>\
             <article><h3>No Link</h3></article>{}</body></html>",
            article("Good", "/papers/1111.0009", Some("2025-06-10T00:00:00Z")),
        );
        let papers = parse_listing(&html, target(), 50);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Good");
    }

    #[test]
    fn entry_without_timestamp_is_kept() {
        let html = format!("<html><body>{}</body></html>", article("Undated", "/papers/2", None));
        let papers = parse_listing(&html, target(), 50);
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].published, target());
    }

    #[test]
    fn listing_cap_limits_entries_examined() {
        let articles: String = (0..6)
            .map(|i| article(&format!("P{i}"), &format!("/papers/{i}"), Some("2025-06-10T00:00:00Z")))
            .collect();
        let html = format!("<html><body>{articles}</body></html>");
        let papers = parse_listing(&html, target(), 3);
        assert_eq!(papers.len(), 3);
    }

    #[test]
    fn absolute_hrefs_are_left_alone() {
        let html = format!(
            "<html><body>{}</body></html>",
            article("Abs", "https://example.org/p/1", Some("2025-06-10T00:00:00Z")),
        );
        let papers = parse_listing(&html, target(), 50);
        assert_eq!(papers[0].source_link, "https://example.org/p/1");
    }
}
