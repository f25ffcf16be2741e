//! Stage 2: strict agent-only filtering via the text model.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, TEXT_MODEL};
use crate::llm::{ExtractRequest, LlmClient};
use crate::model::{Classification, Paper, StageOutcome};
use crate::throttle::Throttle;

#[derive(Debug, Deserialize)]
pub struct ClassifyReply {
    pub is_agent_paper: bool,
    pub category: crate::model::Category,
    pub confidence: f64,
}

/// Classify every candidate and keep the verified agent papers, preserving
/// input order. Any per-paper failure drops that paper silently.
pub async fn classify_papers(
    llm: &LlmClient,
    cfg: &Config,
    papers: Vec<Paper>,
) -> Vec<Paper> {
    let throttle = Throttle::new(cfg.classify_delay);
    let pb = ProgressBar::new(papers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} classified")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut kept = Vec::new();
    for mut paper in papers {
        match classify_one(llm, cfg, &paper.title).await {
            StageOutcome::Hit(classification) => {
                paper.classification = Some(classification);
                kept.push(paper);
            }
            StageOutcome::Miss => debug!("rejected: {}", paper.title),
            StageOutcome::Failed(reason) => debug!("classify failed for {}: {reason}", paper.title),
        }
        throttle.pause().await;
        pb.inc(1);
    }

    pb.finish_and_clear();
    kept
}

async fn classify_one(llm: &LlmClient, cfg: &Config, title: &str) -> StageOutcome<Classification> {
    let req = ExtractRequest {
        model: TEXT_MODEL,
        prompt: classify_prompt(title),
        image_png: None,
        temperature: 0.2,
        max_tokens: 200,
    };

    let reply: ClassifyReply = match llm.extract(&req).await {
        Ok(r) => r,
        Err(e) => return StageOutcome::Failed(e.to_string()),
    };

    if accept(&reply, cfg.classify_confidence) {
        StageOutcome::Hit(Classification {
            category: reply.category,
            confidence: reply.confidence,
        })
    } else {
        StageOutcome::Miss
    }
}

/// A paper survives only when the model says yes with enough confidence.
pub fn accept(reply: &ClassifyReply, min_confidence: f64) -> bool {
    reply.is_agent_paper && reply.confidence >= min_confidence
}

fn classify_prompt(title: &str) -> String {
    format!(
        "Is this paper STRICTLY about AI agents?\n\n\
         Title: {title}\n\n\
         STRICT CRITERIA - Must be about:\n\
         - Autonomous agents, Multi-agent systems, Agent architectures\n\
         - Agent planning/reasoning, Agent tool use, Agent evaluation\n\
         - Agent memory/learning, Agent safety/robustness\n\n\
         REJECT: General LLM/VLLM, General reasoning, General RAG, General training\n\n\
         JSON: {{\"is_agent_paper\": boolean, \"category\": \
         \"agent_evaluation|agent_safety|agent_learning|agent_system|multi_agent|not_agent\", \
         \"confidence\": float}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn reply(is_agent: bool, confidence: f64) -> ClassifyReply {
        ClassifyReply {
            is_agent_paper: is_agent,
            category: Category::AgentSystem,
            confidence,
        }
    }

    #[test]
    fn accepts_confident_agent_paper() {
        assert!(accept(&reply(true, 0.9), 0.85));
        assert!(accept(&reply(true, 0.85), 0.85));
    }

    #[test]
    fn rejects_below_threshold_or_non_agent() {
        assert!(!accept(&reply(true, 0.84), 0.85));
        assert!(!accept(&reply(false, 0.99), 0.85));
    }

    #[test]
    fn reply_parses_from_model_json() {
        let r: ClassifyReply = serde_json::from_str(
            r#"{"is_agent_paper": true, "category": "multi_agent", "confidence": 0.92}"#,
        )
        .unwrap();
        assert!(r.is_agent_paper);
        assert_eq!(r.category, Category::MultiAgent);
    }

    #[test]
    fn prompt_embeds_title() {
        assert!(classify_prompt("AgentBench Redux").contains("Title: AgentBench Redux"));
    }
}
