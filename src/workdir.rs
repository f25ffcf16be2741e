use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Per-run scratch directory handle, threaded through the stages explicitly
/// so no stage touches the process working directory.
///
/// Layout: `<base>/daily_YYYYMMDD/{pdfs,pages,cropped}`.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn create(base: impl AsRef<Path>, date: NaiveDate) -> Result<Self> {
        let root = base
            .as_ref()
            .join(format!("daily_{}", date.format("%Y%m%d")));
        for sub in ["pdfs", "pages", "cropped"] {
            fs::create_dir_all(root.join(sub))
                .with_context(|| format!("failed to create work dir {}", root.display()))?;
        }
        Ok(Self { root })
    }

    pub fn pdf_path(&self, arxiv_id: &str) -> PathBuf {
        self.root.join("pdfs").join(format!("{arxiv_id}.pdf"))
    }

    pub fn page_path(&self, arxiv_id: &str, page_no: u32) -> PathBuf {
        self.root
            .join("pages")
            .join(format!("{arxiv_id}_page{page_no}.png"))
    }

    pub fn cropped_path(&self, arxiv_id: &str) -> PathBuf {
        self.root.join("cropped").join(format!("{arxiv_id}_main.png"))
    }
}
