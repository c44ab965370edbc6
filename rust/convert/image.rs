use std::path::PathBuf;

use tracing::debug;

use crate::{
    assemble::write_image_pdf,
    convert::{Conversion, Job},
    error::ConversionResult,
    imaging::{self, ColorMode, ImageFormat},
};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "tiff", "tif"];

/// Re-encodes an image, optionally to grayscale or black and white. Every
/// page of a TIFF input becomes its own numbered file.
#[derive(Debug, Clone, Copy)]
pub struct ImageToImage {
    pub format: ImageFormat,
    pub color: ColorMode,
}

impl Conversion for ImageToImage {
    fn name(&self) -> &'static str {
        "image-to-image"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        IMAGE_EXTENSIONS
    }

    fn output_extension(&self) -> &str {
        self.format.extension()
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let pages = imaging::load_pages(job.input)?;
        let indexed = imaging::is_tiff(job.input);
        debug!(pages = pages.len(), format = %self.format, color = %self.color, "re-encoding");

        let mut staged = Vec::with_capacity(pages.len());
        for (index, page) in (1..).zip(&pages) {
            let path = if indexed {
                job.staged_page(index)?
            } else {
                job.staged_file()
            };
            imaging::save_as(&imaging::apply_color_mode(page, self.color), &path, self.format)?;
            staged.push(path);
        }
        Ok(staged)
    }
}

/// Places each image (each TIFF page) on its own PDF page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageToPdf;

impl Conversion for ImageToPdf {
    fn name(&self) -> &'static str {
        "image-to-pdf"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        IMAGE_EXTENSIONS
    }

    fn output_extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let pages = imaging::load_pages(job.input)?;
        let path = job.staged_file();
        write_image_pdf(&pages, &path)?;
        Ok(vec![path])
    }
}
