//! Stage 5: generate Medium-style copy for each surviving paper.

use tracing::debug;

use crate::config::{Config, TEXT_MODEL};
use crate::llm::{ExtractRequest, LlmClient};
use crate::model::{Narrative, Paper};
use crate::throttle::Throttle;

/// Attach generated narrative text to each paper; a failed call simply
/// leaves the narrative unset.
pub async fn generate_narratives(llm: &LlmClient, cfg: &Config, papers: &mut [Paper]) {
    let throttle = Throttle::new(cfg.narrative_delay);

    for paper in papers.iter_mut() {
        let req = ExtractRequest {
            model: TEXT_MODEL,
            prompt: narrative_prompt(&paper.title),
            image_png: None,
            temperature: 0.4,
            max_tokens: 800,
        };

        match llm.extract::<Narrative>(&req).await {
            Ok(narrative) => paper.narrative = Some(narrative),
            Err(e) => debug!("narrative generation failed for {}: {e}", paper.title),
        }
        throttle.pause().await;
    }
}

fn narrative_prompt(title: &str) -> String {
    format!(
        "Create Medium-style content for: {title}\n\n\
         Generate JSON with: subtitle (10-15 words), summary (2-3 sentences), \
         intuition (2-3 simple sentences), problem (2-3 sentences), \
         solution (2-3 sentences)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_title() {
        assert!(narrative_prompt("Voyager 2.0").contains("Create Medium-style content for: Voyager 2.0"));
    }
}
