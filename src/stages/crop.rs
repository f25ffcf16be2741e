//! Stage 6: ask the vision model for the diagram's bounding box, pad it,
//! crop the page image and write the result.

use std::fs;

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;
use serde::Deserialize;
use tracing::warn;

use crate::config::VISION_MODEL;
use crate::llm::{ExtractRequest, LlmClient};
use crate::model::Paper;
use crate::workdir::WorkDir;

/// Margin pulled off the top/left edge before cropping.
const EDGE_MARGIN: i64 = 10;
/// Padding added to the box width/height before cropping.
const SIZE_PADDING: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct CropReply {
    #[serde(default)]
    pub has_diagram: bool,
    #[serde(default)]
    pub top_percent: f64,
    #[serde(default)]
    pub left_percent: f64,
    #[serde(default)]
    pub width_percent: f64,
    #[serde(default)]
    pub height_percent: f64,
}

/// Crop the located diagram out of each paper's main-diagram page.
/// Failures and `has_diagram: false` leave `cropped` unset.
pub async fn crop_diagrams(llm: &LlmClient, work: &WorkDir, papers: &mut [Paper]) {
    for paper in papers.iter_mut() {
        if paper.main_diagram.is_none() {
            continue;
        }
        if let Err(e) = crop_one(llm, work, paper).await {
            warn!("diagram crop failed for {}: {e}", paper.title);
        }
    }
}

async fn crop_one(llm: &LlmClient, work: &WorkDir, paper: &mut Paper) -> Result<()> {
    let page_path = paper
        .main_diagram_path()
        .ok_or_else(|| anyhow!("main diagram index out of range"))?
        .clone();
    let arxiv_id = paper
        .arxiv_id
        .clone()
        .ok_or_else(|| anyhow!("paper has no arXiv id"))?;

    let png = fs::read(&page_path)
        .with_context(|| format!("failed to read {}", page_path.display()))?;
    let img = image::load_from_memory(&png).context("failed to decode page image")?;
    let (width, height) = img.dimensions();

    let req = ExtractRequest {
        model: VISION_MODEL,
        prompt: crop_prompt(width, height),
        image_png: Some(&png),
        temperature: 0.1,
        max_tokens: 200,
    };

    let reply: CropReply = llm.extract(&req).await?;
    if !reply.has_diagram {
        return Ok(());
    }

    let (x, y, w, h) = crop_box(&reply, width, height);
    if w == 0 || h == 0 {
        return Ok(());
    }

    let out_path = work.cropped_path(&arxiv_id);
    img.crop_imm(x, y, w, h)
        .save(&out_path)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    paper.cropped = Some(out_path);

    Ok(())
}

/// Convert the returned percentages to a pixel box, expand by the fixed
/// margins, and clamp so the box never leaves the image — whatever the
/// service returned.
pub fn crop_box(reply: &CropReply, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let width = i64::from(width);
    let height = i64::from(height);

    let x = (reply.left_percent / 100.0 * width as f64) as i64;
    let y = (reply.top_percent / 100.0 * height as f64) as i64;
    let w = (reply.width_percent / 100.0 * width as f64) as i64;
    let h = (reply.height_percent / 100.0 * height as f64) as i64;

    let x = (x - EDGE_MARGIN).clamp(0, width);
    let y = (y - EDGE_MARGIN).clamp(0, height);
    let w = (w + SIZE_PADDING).clamp(0, width - x);
    let h = (h + SIZE_PADDING).clamp(0, height - y);

    (x as u32, y as u32, w as u32, h as u32)
}

fn crop_prompt(width: u32, height: u32) -> String {
    format!(
        "Locate the MAIN ARCHITECTURE/FRAMEWORK DIAGRAM (not tables/text).\n\n\
         Image: {width}x{height} pixels\n\n\
         JSON: {{\"has_diagram\": boolean, \"top_percent\": float, \"left_percent\": float, \
         \"width_percent\": float, \"height_percent\": float}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(top: f64, left: f64, w: f64, h: f64) -> CropReply {
        CropReply {
            has_diagram: true,
            top_percent: top,
            left_percent: left,
            width_percent: w,
            height_percent: h,
        }
    }

    #[test]
    fn interior_box_gets_margin_and_padding() {
        // 1000x1000: box at (200,200) size 400x400 -> (190,190) 420x420
        let (x, y, w, h) = crop_box(&reply(20.0, 20.0, 40.0, 40.0), 1000, 1000);
        assert_eq!((x, y, w, h), (190, 190, 420, 420));
    }

    #[test]
    fn box_near_origin_clamps_to_zero() {
        let (x, y, ..) = crop_box(&reply(0.0, 0.0, 50.0, 50.0), 1000, 1000);
        assert_eq!((x, y), (0, 0));
    }

    #[test]
    fn box_never_leaves_the_image() {
        let cases = [
            reply(90.0, 90.0, 50.0, 50.0),
            reply(0.0, 0.0, 100.0, 100.0),
            reply(150.0, 150.0, 300.0, 300.0),
            reply(-40.0, -40.0, 10.0, 10.0),
        ];
        for r in &cases {
            let (x, y, w, h) = crop_box(r, 1275, 1650);
            assert!(x + w <= 1275, "x={x} w={w}");
            assert!(y + h <= 1650, "y={y} h={h}");
        }
    }

    #[test]
    fn garbage_percentages_yield_empty_box() {
        let (_, _, w, h) = crop_box(&reply(500.0, 500.0, -50.0, -50.0), 800, 600);
        assert_eq!((w, h), (0, 0));
    }

    #[test]
    fn reply_defaults_to_no_diagram() {
        let r: CropReply = serde_json::from_str("{}").unwrap();
        assert!(!r.has_diagram);
    }
}
