//! poppler-utils: `pdftoppm` for rasterizing, `pdftohtml` for HTML export.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::debug;

use crate::{
    clients::run_tool,
    config::Config,
    error::{ConversionError, ConversionResult},
};

const PAGE_PREFIX: &str = "page";

pub struct Poppler {
    pdftoppm: PathBuf,
    pdftohtml: PathBuf,
}

impl Poppler {
    pub fn new(config: &Config) -> Self {
        Self {
            pdftoppm: config.pdftoppm.clone(),
            pdftohtml: config.pdftohtml.clone(),
        }
    }

    /// Renders every page of `pdf` to PNG inside `out_dir` and returns the
    /// files ordered by page number.
    pub fn render_pages(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> ConversionResult<Vec<PathBuf>> {
        let mut command = Command::new(&self.pdftoppm);
        command
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(PAGE_PREFIX));
        run_tool(command, "pdftoppm")?;

        let pages = collect_pages(out_dir)?;
        if pages.is_empty() {
            return Err(ConversionError::library(format!(
                "pdftoppm rendered no pages from {}",
                pdf.display()
            )));
        }
        debug!(pdf = %pdf.display(), pages = pages.len(), dpi, "pages rendered");
        Ok(pages)
    }

    /// Exports `pdf` as one self-contained HTML file (images inlined as data URLs).
    pub fn to_html(&self, pdf: &Path, out_dir: &Path, stem: &str) -> ConversionResult<PathBuf> {
        let mut command = Command::new(&self.pdftohtml);
        command
            .args(["-s", "-noframes", "-dataurls", "-q"])
            .arg(pdf)
            .arg(out_dir.join(stem));
        run_tool(command, "pdftohtml")?;

        find_html(out_dir, stem)?.ok_or_else(|| {
            ConversionError::library(format!("pdftohtml produced no HTML for {}", pdf.display()))
        })
    }
}

/// `pdftoppm` pads page numbers to the width of the page count, so names
/// are sorted by the parsed number rather than lexically.
fn collect_pages(dir: &Path) -> ConversionResult<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let number = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(page_number);
        if let Some(number) = number {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

fn find_html(dir: &Path, stem: &str) -> ConversionResult<Option<PathBuf>> {
    let exact = dir.join(format!("{stem}.html"));
    if exact.is_file() {
        return Ok(Some(exact));
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "html") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
