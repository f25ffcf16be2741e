//! Stage 7a: assemble the dated markdown report and its image tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use crate::model::Paper;

/// Where the report and copied images landed on disk.
pub struct ReportOutput {
    pub markdown_path: PathBuf,
    pub images_dir: PathBuf,
}

/// Relative image path embedded in the markdown, present only when the paper
/// has both a cropped diagram and an arXiv id to name it by.
fn embedded_image(paper: &Paper) -> Option<String> {
    let id = paper.arxiv_id.as_deref()?;
    paper.cropped.as_ref()?;
    Some(format!("images/{id}_main.png"))
}

/// Render the report for `date`. Papers appear in the order given, which is
/// their classification order; a stable pass, never re-sorted.
pub fn render(date: NaiveDate, papers: &[Paper]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# AI Agent Papers - {date}\n\n"));
    out.push_str("*Daily curated collection of cutting-edge research in AI agents*\n\n");
    out.push_str(&format!(
        "**📊 {} verified agent papers** (strict filtering applied)\n\n---\n\n",
        papers.len()
    ));

    for (i, paper) in papers.iter().enumerate() {
        out.push_str(&format!("## {}. {}\n\n", i + 1, paper.title));

        if let Some(n) = &paper.narrative {
            if let Some(subtitle) = &n.subtitle {
                out.push_str(&format!("*{subtitle}*\n\n"));
            }
            if let Some(summary) = &n.summary {
                out.push_str(&format!("**Summary**\n\n{summary}\n\n"));
            }
            if let Some(intuition) = &n.intuition {
                out.push_str(&format!("### 💡 Intuition\n\n{intuition}\n\n"));
            }
            if let Some(problem) = &n.problem {
                out.push_str(&format!("### 🎯 Problem\n\n{problem}\n\n"));
            }
            if let Some(solution) = &n.solution {
                out.push_str(&format!("### 🛠️ Solution\n\n{solution}\n\n"));
            }
        }

        if let Some(image) = embedded_image(paper) {
            out.push_str("### 📊 Architecture Diagram\n\n");
            out.push_str(&format!("![{} - Main Diagram]({image})\n\n", paper.title));
        }

        out.push_str("**📄 Read More:**\n");
        out.push_str(&format!("- [HuggingFace Paper]({})\n", paper.source_link));
        if let Some(id) = &paper.arxiv_id {
            out.push_str(&format!("- [arXiv]({})\n", crate::config::arxiv_abs_url(id)));
        }

        if let Some(c) = &paper.classification {
            out.push_str(&format!("\n**Category:** {}\n", c.category));
        }

        out.push_str("\n---\n\n");
    }

    out
}

/// Write `<base>/<year>/<month>/<date>.md` and copy each cropped diagram into
/// the sibling `images/` directory.
pub fn write_output(
    base: impl AsRef<Path>,
    date: NaiveDate,
    papers: &[Paper],
) -> Result<ReportOutput> {
    let month_dir = base
        .as_ref()
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()));
    let images_dir = month_dir.join("images");
    fs::create_dir_all(&images_dir)
        .with_context(|| format!("failed to create {}", images_dir.display()))?;

    for paper in papers {
        if let (Some(cropped), Some(id)) = (&paper.cropped, &paper.arxiv_id) {
            let dest = images_dir.join(format!("{id}_main.png"));
            fs::copy(cropped, &dest)
                .with_context(|| format!("failed to copy {}", cropped.display()))?;
        }
    }

    let markdown_path = month_dir.join(format!("{date}.md"));
    fs::write(&markdown_path, render(date, papers))
        .with_context(|| format!("failed to write {}", markdown_path.display()))?;

    Ok(ReportOutput {
        markdown_path,
        images_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Classification, Narrative, Paper, RasterPage};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn full_paper() -> Paper {
        let mut p = Paper::new(
            "Planner-Worker Agents".into(),
            "https://huggingface.co/papers/2501.01234".into(),
            date(),
        );
        p.classification = Some(Classification {
            category: Category::AgentSystem,
            confidence: 0.9,
        });
        p.arxiv_id = Some("2501.01234".into());
        p.pages = vec![RasterPage {
            page_no: 1,
            path: "pages/2501.01234_page1.png".into(),
        }];
        p.main_diagram = Some(0);
        p.cropped = Some("cropped/2501.01234_main.png".into());
        p.narrative = Some(Narrative {
            subtitle: Some("Agents that plan and delegate".into()),
            summary: Some("A planner-worker split.".into()),
            intuition: Some("Divide and conquer.".into()),
            problem: Some("Monolithic agents stall.".into()),
            solution: Some("Split planning from acting.".into()),
        });
        p
    }

    #[test]
    fn full_paper_renders_every_section() {
        let md = render(date(), &[full_paper()]);
        assert!(md.contains("# AI Agent Papers - 2025-06-10"));
        assert!(md.contains("**📊 1 verified agent papers**"));
        assert!(md.contains("## 1. Planner-Worker Agents"));
        assert!(md.contains("*Agents that plan and delegate*"));
        assert!(md.contains("**Summary**\n\nA planner-worker split."));
        assert!(md.contains("### 💡 Intuition"));
        assert!(md.contains("### 🎯 Problem"));
        assert!(md.contains("### 🛠️ Solution"));
        assert!(md.contains("![Planner-Worker Agents - Main Diagram](images/2501.01234_main.png)"));
        assert!(md.contains("- [HuggingFace Paper](https://huggingface.co/papers/2501.01234)"));
        assert!(md.contains("- [arXiv](https://arxiv.org/abs/2501.01234)"));
        assert!(md.contains("**Category:** Agent System"));
    }

    #[test]
    fn paper_without_crop_has_no_image_section() {
        let mut p = full_paper();
        p.main_diagram = None;
        p.cropped = None;
        let md = render(date(), &[p]);
        assert!(!md.contains("Architecture Diagram"));
        assert!(!md.contains("images/"));
    }

    #[test]
    fn paper_without_arxiv_id_skips_arxiv_link_and_image() {
        let mut p = full_paper();
        p.arxiv_id = None;
        p.pages.clear();
        p.main_diagram = None;
        p.cropped = None;
        let md = render(date(), &[p]);
        assert!(md.contains("- [HuggingFace Paper]"));
        assert!(!md.contains("- [arXiv]"));
        assert!(!md.contains("Architecture Diagram"));
        // Narrative still renders even when retrieval failed.
        assert!(md.contains("### 💡 Intuition"));
    }

    #[test]
    fn sections_keep_classification_order() {
        let mut a = full_paper();
        a.title = "First".into();
        let mut b = full_paper();
        b.title = "Second".into();
        let md = render(date(), &[a, b]);
        let first = md.find("## 1. First").unwrap();
        let second = md.find("## 2. Second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn write_output_copies_images_and_writes_markdown() {
        let base = std::env::temp_dir().join(format!("agent_papers_report_{}", std::process::id()));
        let work = base.join("cropped");
        fs::create_dir_all(&work).unwrap();
        let crop_file = work.join("2501.01234_main.png");
        fs::write(&crop_file, b"png-bytes").unwrap();

        let mut p = full_paper();
        p.cropped = Some(crop_file);

        let out = write_output(base.join("out"), date(), &[p]).unwrap();
        assert!(out.markdown_path.ends_with("2025/06/2025-06-10.md"));
        assert!(out.images_dir.join("2501.01234_main.png").is_file());
        let md = fs::read_to_string(&out.markdown_path).unwrap();
        assert!(md.contains("## 1. Planner-Worker Agents"));

        fs::remove_dir_all(&base).unwrap();
    }
}
