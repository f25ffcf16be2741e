//! Stage 4: find the raster page holding the main architecture diagram.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, VISION_MODEL};
use crate::llm::{ExtractRequest, LlmClient};
use crate::model::{Paper, StageOutcome};
use crate::throttle::Throttle;

const LOCATE_PROMPT: &str = "Does this page contain a MAIN ARCHITECTURE or FRAMEWORK DIAGRAM? \
                             JSON: {\"has_main_diagram\": boolean, \"confidence\": float}";

#[derive(Debug, Deserialize)]
pub struct DiagramReply {
    #[serde(default)]
    pub has_main_diagram: bool,
    #[serde(default)]
    pub confidence: f64,
}

/// Probe the first candidate pages of each paper; the first qualifying page
/// becomes the paper's main diagram. Per-page failures count as non-matches.
pub async fn locate_diagrams(llm: &LlmClient, cfg: &Config, papers: &mut [Paper]) {
    let throttle = Throttle::new(cfg.locate_delay);

    for paper in papers.iter_mut() {
        for index in 0..paper.pages.len().min(cfg.max_diagram_candidates) {
            match probe_page(llm, &paper.pages[index].path).await {
                StageOutcome::Hit(reply) if qualifies(&reply, cfg.diagram_confidence) => {
                    debug!(
                        "main diagram for {}: page {}",
                        paper.title, paper.pages[index].page_no
                    );
                    paper.main_diagram = Some(index);
                    break;
                }
                StageOutcome::Failed(reason) => {
                    debug!("diagram probe failed for {}: {reason}", paper.title);
                }
                _ => {}
            }
        }
        throttle.pause().await;
    }
}

async fn probe_page(llm: &LlmClient, path: &Path) -> StageOutcome<DiagramReply> {
    let png = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return StageOutcome::Failed(e.to_string()),
    };

    let req = ExtractRequest {
        model: VISION_MODEL,
        prompt: LOCATE_PROMPT.to_string(),
        image_png: Some(&png),
        temperature: 0.2,
        max_tokens: 100,
    };

    match llm.extract(&req).await {
        Ok(reply) => StageOutcome::Hit(reply),
        Err(e) => StageOutcome::Failed(e.to_string()),
    }
}

pub fn qualifies(reply: &DiagramReply, min_confidence: f64) -> bool {
    reply.has_main_diagram && reply.confidence >= min_confidence
}
