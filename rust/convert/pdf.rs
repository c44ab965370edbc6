use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::ValueEnum;
use gag::Gag;
use serde::Serialize;
use tracing::debug;

use crate::{
    assemble::SlideDeck,
    clients::{office::OfficeSession, poppler::Poppler},
    convert::{Conversion, Job},
    error::{ConversionError, ConversionResult},
    imaging::{self, ColorMode, ImageFormat},
};

const PDF: &[&str] = &["pdf"];
const DOCX_FILTER: &str = "docx:MS Word 2007 XML";

/// Opens the PDF in LibreOffice Writer and saves it as DOCX.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfToDocx;

impl Conversion for PdfToDocx {
    fn name(&self) -> &'static str {
        "pdf-to-docx"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PDF
    }

    fn output_extension(&self) -> &str {
        "docx"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let scratch = job.scratch()?;
        let session = OfficeSession::start(job.config)?;
        let produced = session.import_pdf(job.input, DOCX_FILTER, scratch.path())?;
        let path = job.staged_file();
        fs::copy(&produced, &path)?;
        Ok(vec![path])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlMethod {
    /// Text only.
    #[default]
    Html,
    /// Page layout with embedded images.
    Image,
}

impl fmt::Display for HtmlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Image => "image",
        })
    }
}

impl FromStr for HtmlMethod {
    type Err = ConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "image" => Ok(Self::Image),
            other => Err(ConversionError::invalid(format!(
                "unsupported conversion method: {other} (expected html or image)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfToHtml {
    pub method: HtmlMethod,
}

impl Conversion for PdfToHtml {
    fn name(&self) -> &'static str {
        "pdf-to-html"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PDF
    }

    fn output_extension(&self) -> &str {
        "html"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let path = job.staged_file();
        match self.method {
            HtmlMethod::Html => {
                let text = extract_text_quiet(job.input)?;
                fs::write(&path, text_to_html(&text, job.target.base_name()))?;
            }
            HtmlMethod::Image => {
                let scratch = job.scratch()?;
                let produced = Poppler::new(job.config).to_html(
                    job.input,
                    scratch.path(),
                    job.target.base_name(),
                )?;
                fs::copy(&produced, &path)?;
            }
        }
        Ok(vec![path])
    }
}

/// One image file per page.
#[derive(Debug, Clone, Copy)]
pub struct PdfToImage {
    pub format: ImageFormat,
    pub color: ColorMode,
}

impl Conversion for PdfToImage {
    fn name(&self) -> &'static str {
        "pdf-to-image"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PDF
    }

    fn output_extension(&self) -> &str {
        self.format.extension()
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let (_scratch, pages) = job.rasterize(job.input)?;
        export_pages(job, &pages, self.format, self.color)
    }
}

/// Writes rendered pages as numbered images in the requested format.
pub(crate) fn export_pages(
    job: &Job<'_>,
    pages: &[PathBuf],
    format: ImageFormat,
    color: ColorMode,
) -> ConversionResult<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(pages.len());
    for (index, page) in (1..).zip(pages) {
        let image = imaging::apply_color_mode(&imaging::open(page)?, color);
        let path = job.staged_page(index)?;
        imaging::save_as(&image, &path, format)?;
        staged.push(path);
    }
    debug!(pages = staged.len(), %format, %color, "pages exported");
    Ok(staged)
}

/// Renders each page and places it on a 1920x1080 slide.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfToPptx;

impl Conversion for PdfToPptx {
    fn name(&self) -> &'static str {
        "pdf-to-pptx"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        PDF
    }

    fn output_extension(&self) -> &str {
        "pptx"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let (_scratch, pages) = job.rasterize(job.input)?;
        let mut deck = SlideDeck::new();
        for page in &pages {
            deck.push_image(&imaging::open(page)?)?;
        }
        if deck.is_empty() {
            return Err(ConversionError::library("PDF has no pages"));
        }

        let path = job.staged_file();
        deck.write(&path)?;
        debug!(slides = deck.len(), "slide deck written");
        Ok(vec![path])
    }
}

fn extract_text_quiet(path: &Path) -> ConversionResult<String> {
    // pdf-extract prints parser diagnostics straight to stdout/stderr.
    let _gag_out = Gag::stdout().ok();
    let _gag_err = Gag::stderr().ok();
    pdf_extract::extract_text(path).map_err(ConversionError::library)
}

/// Wraps extracted text in a standalone HTML page: one section per PDF page
/// (form feed), one paragraph per blank-line separated block.
fn text_to_html(text: &str, title: &str) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
        escape(title)
    );

    let text = text.replace("\r\n", "\n");
    for page in text.split('\x0c') {
        if page.trim().is_empty() {
            continue;
        }
        html.push_str("<div class=\"page\">\n");
        for block in page.split("\n\n") {
            let lines: Vec<String> = block
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty())
                .map(escape)
                .collect();
            if !lines.is_empty() {
                html.push_str(&format!("<p>{}</p>\n", lines.join("<br>\n")));
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
