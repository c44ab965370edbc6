use pyo3::{
    exceptions::{PyRuntimeError, PyValueError},
    prelude::*,
};

use crate::{
    config::Config,
    convert::{
        Conversion, ConversionOutput, ConversionRequest, DocxToPdf, HtmlMethod, ImageToImage,
        ImageToPdf, PdfToDocx, PdfToHtml, PdfToImage, PdfToPptx, PptxToImage, PptxToPdf,
        XlsxToCsv, execute,
    },
    error::ConversionError,
    imaging::{ColorMode, ImageFormat},
};

fn to_py_err(err: ConversionError) -> PyErr {
    if err.is_invalid_input() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

fn run(
    conversion: &dyn Conversion,
    input: String,
    output_dir: Option<String>,
) -> PyResult<ConversionOutput> {
    let _ = dotenvy::dotenv();
    let request = ConversionRequest::new(input, output_dir);
    execute(conversion, &request, &Config::from_env()).map_err(to_py_err)
}

fn primary(output: ConversionOutput) -> String {
    output.primary().to_string_lossy().into_owned()
}

fn all_paths(output: ConversionOutput) -> Vec<String> {
    output
        .paths
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect()
}

fn parse<T: std::str::FromStr<Err = ConversionError>>(value: &str) -> PyResult<T> {
    value.parse().map_err(to_py_err)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn docx_to_pdf(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&DocxToPdf, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn pdf_to_docx(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&PdfToDocx, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, method="html", output_dir=None))]
fn pdf_to_html(input: String, method: &str, output_dir: Option<String>) -> PyResult<String> {
    let method: HtmlMethod = parse(method)?;
    run(&PdfToHtml { method }, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, format, color="color", output_dir=None))]
fn pdf_to_image(
    input: String,
    format: &str,
    color: &str,
    output_dir: Option<String>,
) -> PyResult<Vec<String>> {
    let conversion = PdfToImage {
        format: parse::<ImageFormat>(format)?,
        color: parse::<ColorMode>(color)?,
    };
    run(&conversion, input, output_dir).map(all_paths)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn pdf_to_pptx(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&PdfToPptx, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, format, color="color", output_dir=None))]
fn image_to_image(
    input: String,
    format: &str,
    color: &str,
    output_dir: Option<String>,
) -> PyResult<Vec<String>> {
    let conversion = ImageToImage {
        format: parse::<ImageFormat>(format)?,
        color: parse::<ColorMode>(color)?,
    };
    run(&conversion, input, output_dir).map(all_paths)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn image_to_pdf(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&ImageToPdf, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn pptx_to_pdf(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&PptxToPdf, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input, format, output_dir=None))]
fn pptx_to_image(input: String, format: &str, output_dir: Option<String>) -> PyResult<Vec<String>> {
    let conversion = PptxToImage {
        format: parse::<ImageFormat>(format)?,
    };
    run(&conversion, input, output_dir).map(all_paths)
}

#[pyfunction]
#[pyo3(signature = (input, output_dir=None))]
fn xlsx_to_csv(input: String, output_dir: Option<String>) -> PyResult<String> {
    run(&XlsxToCsv, input, output_dir).map(primary)
}

#[pyfunction]
#[pyo3(signature = (input_path, target_extension, output_dir=None, page_index=None))]
fn resolve_output_path(
    input_path: &str,
    target_extension: &str,
    output_dir: Option<&str>,
    page_index: Option<u32>,
) -> PyResult<String> {
    let path = match page_index {
        Some(index) => crate::output_path::resolve_page(input_path, output_dir, target_extension, index),
        None => crate::output_path::resolve(input_path, output_dir, target_extension),
    }
    .map_err(to_py_err)?;
    Ok(path.to_string_lossy().into_owned())
}

#[pymodule]
fn fileconv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(docx_to_pdf, m)?)?;
    m.add_function(wrap_pyfunction!(pdf_to_docx, m)?)?;
    m.add_function(wrap_pyfunction!(pdf_to_html, m)?)?;
    m.add_function(wrap_pyfunction!(pdf_to_image, m)?)?;
    m.add_function(wrap_pyfunction!(pdf_to_pptx, m)?)?;
    m.add_function(wrap_pyfunction!(image_to_image, m)?)?;
    m.add_function(wrap_pyfunction!(image_to_pdf, m)?)?;
    m.add_function(wrap_pyfunction!(pptx_to_pdf, m)?)?;
    m.add_function(wrap_pyfunction!(pptx_to_image, m)?)?;
    m.add_function(wrap_pyfunction!(xlsx_to_csv, m)?)?;
    m.add_function(wrap_pyfunction!(resolve_output_path, m)?)?;
    Ok(())
}
