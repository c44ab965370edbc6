//! Conversions backed by LibreOffice or poppler. Each test returns early when
//! the program it needs is not installed.

use std::path::Path;

use fileconv::{
    ConversionRequest,
    clients::is_available,
    config::Config,
    convert::{
        DocxToPdf, HtmlMethod, ImageToPdf, PdfToDocx, PdfToHtml, PdfToImage, PdfToPptx, PptxToImage,
        execute,
    },
    imaging::{ColorMode, ImageFormat},
};
use image::{Rgb, RgbImage};

fn sample_pdf(dir: &Path) -> std::path::PathBuf {
    let png = dir.join("sample.png");
    RgbImage::from_pixel(120, 80, Rgb([40, 80, 160])).save(&png).unwrap();
    let request = ConversionRequest::new(png.to_string_lossy(), None);
    execute(&ImageToPdf, &request, &Config::default())
        .unwrap()
        .primary()
        .to_path_buf()
}

fn request(input: &Path, out: &Path) -> ConversionRequest {
    ConversionRequest::new(input.to_string_lossy(), Some(out.to_string_lossy().into_owned()))
}

#[test]
fn pdf_pages_render_to_images() {
    let config = Config::from_env();
    if !is_available(&config.pdftoppm) {
        eprintln!("skipping: pdftoppm not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = sample_pdf(dir.path());
    let out = dir.path().join("pages");

    let conversion = PdfToImage {
        format: ImageFormat::Jpg,
        color: ColorMode::Grayscale,
    };
    let output = execute(&conversion, &request(&pdf, &out), &config).unwrap();

    assert_eq!(output.paths, vec![out.join("sample-00001.jpg")]);
    assert!(output.primary().is_file());
}

#[test]
fn pdf_pages_become_slides() {
    let config = Config::from_env();
    if !is_available(&config.pdftoppm) {
        eprintln!("skipping: pdftoppm not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = sample_pdf(dir.path());

    let output = execute(&PdfToPptx, &request(&pdf, dir.path()), &config).unwrap();

    let archive = zip::ZipArchive::new(std::fs::File::open(output.primary()).unwrap()).unwrap();
    assert!(archive.file_names().any(|name| name == "ppt/slides/slide1.xml"));
}

#[test]
fn pdf_exports_to_single_html_file() {
    let config = Config::from_env();
    if !is_available(&config.pdftohtml) {
        eprintln!("skipping: pdftohtml not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = sample_pdf(dir.path());
    let out = dir.path().join("html");

    let conversion = PdfToHtml {
        method: HtmlMethod::Image,
    };
    let output = execute(&conversion, &request(&pdf, &out), &config).unwrap();

    assert_eq!(output.paths, vec![out.join("sample.html")]);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
}

#[test]
fn office_round_trip() {
    let config = Config::from_env();
    if !is_available(&config.soffice) {
        eprintln!("skipping: soffice not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = sample_pdf(dir.path());
    let docs = dir.path().join("docs");

    let docx = execute(&PdfToDocx, &request(&pdf, &docs), &config).unwrap();
    assert_eq!(docx.primary(), docs.join("sample.docx"));

    let back = execute(&DocxToPdf, &request(docx.primary(), &docs), &config).unwrap();
    assert_eq!(back.primary(), docs.join("sample.pdf"));
    assert!(back.primary().is_file());
}

#[test]
fn slides_export_as_numbered_images() {
    let config = Config::from_env();
    if !is_available(&config.soffice) || !is_available(&config.pdftoppm) {
        eprintln!("skipping: soffice or pdftoppm not found");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let pdf = sample_pdf(dir.path());
    let deck = execute(&PdfToPptx, &request(&pdf, dir.path()), &config).unwrap();
    let out = dir.path().join("slides");

    let conversion = PptxToImage {
        format: ImageFormat::Png,
    };
    let output = execute(&conversion, &request(deck.primary(), &out), &config).unwrap();

    assert_eq!(output.paths, vec![out.join("sample-00001.png")]);
    let slide = image::open(output.primary()).unwrap();
    assert!(slide.width() > slide.height());
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
}
