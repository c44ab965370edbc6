use clap::{Args, Parser, Subcommand};

use crate::{
    convert::HtmlMethod,
    imaging::{ColorMode, ImageFormat},
};

#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert documents and images between office, PDF and raster formats"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Convert a Word document to PDF")]
    DocxToPdf(ConvertArgs),
    #[command(about = "Convert a PDF to an editable Word document")]
    PdfToDocx(ConvertArgs),
    #[command(about = "Convert a PDF to a single HTML file")]
    PdfToHtml(PdfToHtmlArgs),
    #[command(about = "Export every PDF page as an image")]
    PdfToImage(RasterArgs),
    #[command(about = "Turn every PDF page into a picture slide")]
    PdfToPptx(ConvertArgs),
    #[command(about = "Re-encode an image, optionally in grayscale or black and white")]
    ImageToImage(RasterArgs),
    #[command(about = "Place an image (every TIFF page) into a PDF")]
    ImageToPdf(ConvertArgs),
    #[command(about = "Convert a PowerPoint deck to PDF")]
    PptxToPdf(ConvertArgs),
    #[command(about = "Export every slide as an image")]
    PptxToImage(PptxToImageArgs),
    #[command(about = "Write the first worksheet of a workbook as CSV")]
    XlsxToCsv(ConvertArgs),
    #[command(about = "Show the external programs and settings in use")]
    Tools(ToolsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(long, required = true, value_name = "PATH", help = "File to convert")]
    pub input: String,

    #[arg(
        long,
        value_name = "DIR",
        help = "Destination directory (defaults to the input's directory)"
    )]
    pub output_dir: Option<String>,
}

#[derive(Args, Debug)]
pub struct PdfToHtmlArgs {
    #[command(flatten)]
    pub convert: ConvertArgs,

    #[arg(long, value_enum, default_value_t = HtmlMethod::Html, help = "Text only (html) or page layout with images (image)")]
    pub method: HtmlMethod,
}

#[derive(Args, Debug)]
pub struct RasterArgs {
    #[command(flatten)]
    pub convert: ConvertArgs,

    #[arg(long, value_enum, required = true, help = "Output image format")]
    pub format: ImageFormat,

    #[arg(long, value_enum, default_value_t = ColorMode::Color, help = "Color, grayscale or black and white")]
    pub color: ColorMode,
}

#[derive(Args, Debug)]
pub struct PptxToImageArgs {
    #[command(flatten)]
    pub convert: ConvertArgs,

    #[arg(long, value_enum, required = true, help = "Output image format")]
    pub format: ImageFormat,
}

#[derive(Args, Debug)]
pub struct ToolsArgs {}
