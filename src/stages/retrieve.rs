//! Stage 3: resolve arXiv ids from detail pages, download PDFs, rasterize
//! the leading pages.

use std::fs;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use crate::config::{arxiv_pdf_url, Config, RENDER_TARGET_WIDTH};
use crate::model::{Paper, RasterPage};
use crate::pdf;
use crate::throttle::Throttle;
use crate::workdir::WorkDir;

const PDF_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// ArXiv abstract href; the capture stops at the version suffix ("v2" etc.).
static ARXIV_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"arxiv\.org/abs/([^v/?#]+)").unwrap());

/// Enrich each surviving paper with its arXiv id and rasterized pages.
/// Every failure is per-paper: the paper just stays without pages.
pub async fn retrieve_documents(
    http: &reqwest::Client,
    cfg: &Config,
    work: &WorkDir,
    papers: &mut [Paper],
) {
    let throttle = Throttle::new(cfg.retrieve_delay);

    for paper in papers.iter_mut() {
        if let Err(e) = retrieve_one(http, cfg, work, paper).await {
            warn!("retrieval failed for {}: {e}", paper.title);
        }
        throttle.pause().await;
    }
}

async fn retrieve_one(
    http: &reqwest::Client,
    cfg: &Config,
    work: &WorkDir,
    paper: &mut Paper,
) -> Result<()> {
    let html = http
        .get(&paper.source_link)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let arxiv_id = find_arxiv_id(&html)
        .ok_or_else(|| anyhow!("no arXiv abstract link on detail page"))?;
    paper.arxiv_id = Some(arxiv_id.clone());

    let bytes = http
        .get(arxiv_pdf_url(&arxiv_id))
        .timeout(PDF_DOWNLOAD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let pdf_path = work.pdf_path(&arxiv_id);
    fs::write(&pdf_path, &bytes)
        .with_context(|| format!("failed to write {}", pdf_path.display()))?;

    let rendered = pdf::render_leading_pages(&bytes, cfg.max_raster_pages, RENDER_TARGET_WIDTH)?;

    let mut pages = Vec::with_capacity(rendered.len());
    for page in rendered {
        let path = work.page_path(&arxiv_id, page.page_no);
        fs::write(&path, &page.png_data)
            .with_context(|| format!("failed to write {}", path.display()))?;
        pages.push(RasterPage {
            page_no: page.page_no,
            path,
        });
    }
    paper.pages = pages;

    Ok(())
}

/// First anchor on the detail page whose href holds an arXiv abstract link
/// wins; the id is the path segment after the pattern with any version
/// suffix stripped. First-match is the documented behavior when several
/// abstract links exist.
pub fn find_arxiv_id(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").unwrap();

    doc.select(&link_sel)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| {
            let caps = ARXIV_ID_RE.captures(href)?;
            Some(caps[1].to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_and_strips_version() {
        let html = r#"<html><body>
            <a href="/papers">back</a>
            <a href="https://arxiv.org/abs/2501.01234v2">arXiv</a>
        </body></html>"#;
        assert_eq!(find_arxiv_id(html).as_deref(), Some("2501.01234"));
    }

    #[test]
    fn unversioned_id_passes_through() {
        let html = r#"<a href="https://arxiv.org/abs/2406.00001">x</a>"#;
        assert_eq!(find_arxiv_id(html).as_deref(), Some("2406.00001"));
    }

    #[test]
    fn first_matching_link_wins() {
        let html = r#"
            <a href="https://arxiv.org/abs/1111.11111">first</a>
            <a href="https://arxiv.org/abs/2222.22222">second</a>
        "#;
        assert_eq!(find_arxiv_id(html).as_deref(), Some("1111.11111"));
    }

    #[test]
    fn page_without_abstract_link_yields_none() {
        let html = r#"<a href="https://arxiv.org/pdf/2501.01234.pdf">pdf only</a>"#;
        assert_eq!(find_arxiv_id(html), None);
    }
}
