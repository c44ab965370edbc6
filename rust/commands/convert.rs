use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::info;

use crate::{
    cli::{Command, ConvertArgs},
    convert::{
        Conversion, ConversionOutput, ConversionRequest, DocxToPdf, ImageToImage, ImageToPdf,
        PdfToDocx, PdfToHtml, PdfToImage, PdfToPptx, PptxToImage, PptxToPdf, XlsxToCsv, execute,
    },
};

use super::CommandContext;

pub fn handle(command: Command, ctx: &CommandContext) -> Result<()> {
    let (conversion, args) = select(command)?;
    let request = ConversionRequest::new(args.input.clone(), args.output_dir.clone());

    let output = execute(conversion.as_ref(), &request, &ctx.config)
        .with_context(|| format!("{} failed for {}", conversion.name(), args.input))?;

    info!(
        operation = conversion.name(),
        outputs = output.paths.len(),
        "command completed"
    );
    report(&output, ctx.json)
}

fn select(command: Command) -> Result<(Box<dyn Conversion>, ConvertArgs)> {
    let selected: (Box<dyn Conversion>, ConvertArgs) = match command {
        Command::DocxToPdf(args) => (Box::new(DocxToPdf), args),
        Command::PdfToDocx(args) => (Box::new(PdfToDocx), args),
        Command::PdfToHtml(args) => (Box::new(PdfToHtml { method: args.method }), args.convert),
        Command::PdfToImage(args) => (
            Box::new(PdfToImage {
                format: args.format,
                color: args.color,
            }),
            args.convert,
        ),
        Command::PdfToPptx(args) => (Box::new(PdfToPptx), args),
        Command::ImageToImage(args) => (
            Box::new(ImageToImage {
                format: args.format,
                color: args.color,
            }),
            args.convert,
        ),
        Command::ImageToPdf(args) => (Box::new(ImageToPdf), args),
        Command::PptxToPdf(args) => (Box::new(PptxToPdf), args),
        Command::PptxToImage(args) => (Box::new(PptxToImage { format: args.format }), args.convert),
        Command::XlsxToCsv(args) => (Box::new(XlsxToCsv), args),
        Command::Tools(_) => bail!("tools is not a conversion"),
    };
    Ok(selected)
}

fn report(output: &ConversionOutput, json: bool) -> Result<()> {
    if json {
        let body = serde_json::to_string_pretty(&json!({ "paths": output.paths }))
            .context("Failed to serialize conversion result")?;
        println!("{body}");
    } else {
        for path in &output.paths {
            println!("{}", path.display());
        }
    }
    Ok(())
}
