//! Pdfium-backed rasterization of the leading pages of a PDF.

use std::env;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use pdfium_render::prelude::{PdfRenderConfig, Pdfium, PdfiumError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfRenderError {
    #[error("failed to load Pdfium runtime: {0}")]
    Library(#[from] PdfiumError),

    #[error("failed to load PDF document: {0}")]
    Document(#[source] PdfiumError),

    #[error("failed to render page {page_no}: {source}")]
    PageRender {
        page_no: u32,
        #[source]
        source: PdfiumError,
    },

    #[error("failed to encode page {page_no} as PNG: {source}")]
    Encode {
        page_no: u32,
        #[source]
        source: image::ImageError,
    },
}

/// One rendered page held in memory before it is written out.
pub struct RenderedPage {
    /// 1-based page number.
    pub page_no: u32,
    pub png_data: Vec<u8>,
}

/// Render up to `max_pages` leading pages of `bytes` to PNG at the given
/// target width.
pub fn render_leading_pages(
    bytes: &[u8],
    max_pages: usize,
    target_width: u32,
) -> Result<Vec<RenderedPage>, PdfRenderError> {
    let pdfium = load_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(PdfRenderError::Document)?;

    let mut pages = Vec::with_capacity(max_pages);
    let render_config = PdfRenderConfig::new().set_target_width(target_width as i32);

    for (index, page) in document.pages().iter().take(max_pages).enumerate() {
        let page_no = index as u32 + 1;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|source| PdfRenderError::PageRender { page_no, source })?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();

        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded)
            .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
            .map_err(|source| PdfRenderError::Encode { page_no, source })?;

        pages.push(RenderedPage {
            page_no,
            png_data: encoded,
        });
    }

    Ok(pages)
}

fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(dir) = env::var_os("PDFIUM_LIB_DIR") {
        let lib = Pdfium::pdfium_platform_library_name_at_path(Path::new(&dir));
        if let Ok(bindings) = Pdfium::bind_to_library(lib) {
            return Ok(Pdfium::new(bindings));
        }
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
}
