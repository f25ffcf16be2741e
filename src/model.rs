use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

/// One candidate paper moving through the pipeline. Created by the fetch
/// stage, enriched in place by stages 2-6, read-only in the publisher.
#[derive(Debug, Clone)]
pub struct Paper {
    pub title: String,
    pub source_link: String,
    pub published: NaiveDate,
    pub classification: Option<Classification>,
    pub arxiv_id: Option<String>,
    /// Rasterized PDF pages, in page order, capped at 3.
    pub pages: Vec<RasterPage>,
    /// Index into `pages` of the page holding the main diagram.
    pub main_diagram: Option<usize>,
    /// Cropped diagram image, derived from `main_diagram`.
    pub cropped: Option<PathBuf>,
    pub narrative: Option<Narrative>,
}

impl Paper {
    pub fn new(title: String, source_link: String, published: NaiveDate) -> Self {
        Self {
            title,
            source_link,
            published,
            classification: None,
            arxiv_id: None,
            pages: Vec::new(),
            main_diagram: None,
            cropped: None,
            narrative: None,
        }
    }

    pub fn main_diagram_path(&self) -> Option<&PathBuf> {
        self.main_diagram.and_then(|i| self.pages.get(i)).map(|p| &p.path)
    }
}

/// One rasterized page image on disk.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number within the source PDF.
    pub page_no: u32,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub category: Category,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AgentEvaluation,
    AgentSafety,
    AgentLearning,
    AgentSystem,
    MultiAgent,
    NotAgent,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::AgentEvaluation => "Agent Evaluation",
            Category::AgentSafety => "Agent Safety",
            Category::AgentLearning => "Agent Learning",
            Category::AgentSystem => "Agent System",
            Category::MultiAgent => "Multi Agent",
            Category::NotAgent => "Not Agent",
        };
        f.write_str(label)
    }
}

/// Medium-style generated copy. Every field is optional; the renderer emits
/// only what is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Narrative {
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub intuition: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
}

/// Result of one external call for a single paper. Control flow treats `Miss`
/// and `Failed` identically (the paper just does not gain the field), but
/// keeping them apart lets tests tell "service said no" from "call broke".
#[derive(Debug)]
pub enum StageOutcome<T> {
    Hit(T),
    Miss,
    Failed(String),
}
