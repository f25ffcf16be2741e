use std::time::Duration;

/// Listing page scanned for new papers.
pub const LISTING_URL: &str = "https://huggingface.co/papers";
/// Host prepended to relative detail-page hrefs.
pub const LISTING_HOST: &str = "https://huggingface.co";

pub const TEXT_MODEL: &str = "gpt-4.1-mini";
pub const VISION_MODEL: &str = "gemini-2.5-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const GITHUB_USERNAME: &str = "dixonhuinVancouver";
pub const GITHUB_REPO: &str = "manus_research";
pub const PUBLISH_BRANCH: &str = "master";

/// Local base directory for per-run working dirs and the generated output tree.
pub const DATA_DIR: &str = "data";
pub const OUTPUT_BASE: &str = "data/output/agent-papers";

/// Raster target width in pixels: 150 dpi on US-letter width.
pub const RENDER_TARGET_WIDTH: u32 = 1275;

pub fn arxiv_pdf_url(arxiv_id: &str) -> String {
    format!("https://arxiv.org/pdf/{arxiv_id}.pdf")
}

pub fn arxiv_abs_url(arxiv_id: &str) -> String {
    format!("https://arxiv.org/abs/{arxiv_id}")
}

/// Tunable pipeline parameters. `Default` is production; tests build
/// zero-delay variants.
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum classifier confidence to keep a paper.
    pub classify_confidence: f64,
    /// Minimum vision confidence to accept a page as the main diagram.
    pub diagram_confidence: f64,
    pub classify_delay: Duration,
    pub retrieve_delay: Duration,
    pub locate_delay: Duration,
    pub narrative_delay: Duration,
    /// Listing entries examined, from the top of the page.
    pub max_listing_entries: usize,
    /// PDF pages rasterized per paper.
    pub max_raster_pages: usize,
    /// Raster pages probed for the main diagram.
    pub max_diagram_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classify_confidence: 0.85,
            diagram_confidence: 0.7,
            classify_delay: Duration::from_millis(500),
            retrieve_delay: Duration::from_secs(1),
            locate_delay: Duration::from_millis(500),
            narrative_delay: Duration::from_millis(500),
            max_listing_entries: 50,
            max_raster_pages: 3,
            max_diagram_candidates: 2,
        }
    }
}
