use clap::Parser;
use fileconv::{
    cli::{Cli, Command},
    convert::HtmlMethod,
    imaging::{ColorMode, ImageFormat},
};

#[test]
fn parses_conversion_with_output_dir() {
    let cli = Cli::try_parse_from([
        "fileconv",
        "docx-to-pdf",
        "--input",
        "C:\\docs\\Report.docx",
        "--output-dir",
        "D:\\out",
    ])
    .unwrap();

    let Command::DocxToPdf(args) = cli.command else {
        panic!("unexpected command");
    };
    assert_eq!(args.input, "C:\\docs\\Report.docx");
    assert_eq!(args.output_dir.as_deref(), Some("D:\\out"));
}

#[test]
fn raster_options_use_enum_names() {
    let cli = Cli::try_parse_from([
        "fileconv",
        "pdf-to-image",
        "--input",
        "a.pdf",
        "--format",
        "tiff",
        "--color",
        "blackandwhite",
        "-vv",
        "--json",
    ])
    .unwrap();

    assert_eq!(cli.global.verbose, 2);
    assert!(cli.global.json);
    let Command::PdfToImage(args) = cli.command else {
        panic!("unexpected command");
    };
    assert_eq!(args.format, ImageFormat::Tiff);
    assert_eq!(args.color, ColorMode::BlackAndWhite);
    assert!(args.convert.output_dir.is_none());
}

#[test]
fn defaults_apply_to_optional_settings() {
    let cli = Cli::try_parse_from(["fileconv", "pdf-to-html", "--input", "a.pdf"]).unwrap();
    let Command::PdfToHtml(args) = cli.command else {
        panic!("unexpected command");
    };
    assert_eq!(args.method, HtmlMethod::Html);

    let cli = Cli::try_parse_from([
        "fileconv",
        "image-to-image",
        "--input",
        "a.png",
        "--format",
        "jpg",
    ])
    .unwrap();
    let Command::ImageToImage(args) = cli.command else {
        panic!("unexpected command");
    };
    assert_eq!(args.color, ColorMode::Color);
}

#[test]
fn rejects_unknown_formats_and_missing_input() {
    assert!(
        Cli::try_parse_from(["fileconv", "pptx-to-image", "--input", "a.pptx", "--format", "bmp"])
            .is_err()
    );
    assert!(Cli::try_parse_from(["fileconv", "xlsx-to-csv"]).is_err());
    assert!(Cli::try_parse_from(["fileconv", "tools"]).is_ok());
}
