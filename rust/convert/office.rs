use std::{fs, path::PathBuf};

use crate::{
    clients::office::OfficeSession,
    convert::{Conversion, Job, pdf::export_pages},
    error::ConversionResult,
    imaging::{ColorMode, ImageFormat},
};

const DOCX: &[&str] = &["docx"];
const PPTX: &[&str] = &["pptx"];

fn office_to_pdf(job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
    let scratch = job.scratch()?;
    let session = OfficeSession::start(job.config)?;
    let produced = session.convert(job.input, "pdf", scratch.path())?;
    let path = job.staged_file();
    fs::copy(&produced, &path)?;
    Ok(vec![path])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxToPdf;

impl Conversion for DocxToPdf {
    fn name(&self) -> &'static str {
        "docx-to-pdf"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        DOCX
    }

    fn output_extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        office_to_pdf(job)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PptxToPdf;

impl Conversion for PptxToPdf {
    fn name(&self) -> &'static str {
        "pptx-to-pdf"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PPTX
    }

    fn output_extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        office_to_pdf(job)
    }
}

/// Exports every slide as a numbered image, via an intermediate PDF.
#[derive(Debug, Clone, Copy)]
pub struct PptxToImage {
    pub format: ImageFormat,
}

impl Conversion for PptxToImage {
    fn name(&self) -> &'static str {
        "pptx-to-image"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PPTX
    }

    fn output_extension(&self) -> &str {
        self.format.extension()
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let scratch = job.scratch()?;
        let pdf = OfficeSession::start(job.config)?.convert(job.input, "pdf", scratch.path())?;
        let (_pages_dir, pages) = job.rasterize(&pdf)?;
        export_pages(job, &pages, self.format, ColorMode::Color)
    }
}
