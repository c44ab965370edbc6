//! The conversion driver and the operations built on it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::{
    clients::poppler::Poppler,
    config::Config,
    error::{ConversionError, ConversionResult},
    output_path::{OutputTarget, PathRequest, input_extension},
    workspace::Workspace,
};

pub mod image;
pub mod office;
pub mod pdf;
pub mod sheet;

pub use self::image::{ImageToImage, ImageToPdf};
pub use office::{DocxToPdf, PptxToImage, PptxToPdf};
pub use pdf::{HtmlMethod, PdfToDocx, PdfToHtml, PdfToImage, PdfToPptx};
pub use sheet::XlsxToCsv;

/// One source-to-target operation. Implementations write their results into
/// the job's staging directory using the final file names.
pub trait Conversion {
    fn name(&self) -> &'static str;

    /// Accepted input extensions, lower case, without the dot.
    fn input_extensions(&self) -> &'static [&'static str];

    fn output_extension(&self) -> &str;

    /// Produces the staged outputs in order.
    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>>;
}

pub struct Job<'a> {
    pub input: &'a Path,
    pub target: &'a OutputTarget,
    pub staging: &'a Workspace,
    pub config: &'a Config,
}

impl Job<'_> {
    /// Staging path of the single output file.
    pub fn staged_file(&self) -> PathBuf {
        self.staging.join(self.target.file_name())
    }

    /// Staging path of the 1-based page `index`.
    pub fn staged_page(&self, index: u32) -> ConversionResult<PathBuf> {
        Ok(self.staging.join(self.target.page_file_name(index)?))
    }

    /// Fresh scratch space for intermediate files.
    pub fn scratch(&self) -> ConversionResult<Workspace> {
        Workspace::create(self.config)
    }

    /// Renders every page of `pdf` to PNG in a scratch workspace. The
    /// workspace is returned so the pages live as long as the caller needs.
    pub fn rasterize(&self, pdf: &Path) -> ConversionResult<(Workspace, Vec<PathBuf>)> {
        let scratch = self.scratch()?;
        let pages = Poppler::new(self.config).render_pages(pdf, scratch.path(), self.config.render_dpi)?;
        Ok((scratch, pages))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: String,
    pub output_dir: Option<String>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<String>, output_dir: Option<String>) -> Self {
        Self {
            input: input.into(),
            output_dir,
        }
    }
}

/// Paths written by a conversion, in page order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutput {
    pub paths: Vec<PathBuf>,
}

impl ConversionOutput {
    /// The representative result: the only file, or the first page.
    pub fn primary(&self) -> &Path {
        &self.paths[0]
    }
}

/// Validates the request, renders into a staging directory beside the final
/// outputs and publishes them only once every output was produced.
pub fn execute(
    conversion: &dyn Conversion,
    request: &ConversionRequest,
    config: &Config,
) -> ConversionResult<ConversionOutput> {
    let input = validate_input(conversion, &request.input)?;
    let target = OutputTarget::prepare(&PathRequest::new(
        &request.input,
        request.output_dir.as_deref(),
        conversion.output_extension(),
    ))?;

    info!(
        operation = conversion.name(),
        input = %request.input,
        output_dir = %target.dir_path().display(),
        "conversion started"
    );

    let staging = Workspace::staging_in(&target.dir_path())?;
    let job = Job {
        input: &input,
        target: &target,
        staging: &staging,
        config,
    };
    let staged = conversion.render(&job)?;
    if staged.is_empty() {
        return Err(ConversionError::library(format!(
            "{} produced no output",
            conversion.name()
        )));
    }

    let paths = staging.publish(&staged, &target)?;
    info!(
        operation = conversion.name(),
        outputs = paths.len(),
        primary = %paths[0].display(),
        "conversion finished"
    );
    Ok(ConversionOutput { paths })
}

fn validate_input(conversion: &dyn Conversion, input: &str) -> ConversionResult<PathBuf> {
    if input.trim().is_empty() {
        return Err(ConversionError::invalid(
            "Please select a valid file for processing.",
        ));
    }

    let supported = input_extension(input)
        .is_some_and(|ext| conversion.input_extensions().contains(&ext.as_str()));
    if !supported {
        return Err(ConversionError::invalid(
            "Please select a supported file to continue",
        ));
    }

    let path = PathBuf::from(input);
    if !path.is_file() {
        return Err(ConversionError::invalid(format!("input not found: {input}")));
    }
    Ok(path)
}
