//! Headless LibreOffice conversions.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::debug;

use crate::{
    clients::run_tool,
    config::Config,
    error::{ConversionError, ConversionResult},
    workspace::Workspace,
};

const PDF_IMPORT_FILTER: &str = "writer_pdf_import";

/// One LibreOffice instance with its own user profile, so concurrent
/// sessions never share lock files. The profile is removed on drop.
pub struct OfficeSession {
    program: PathBuf,
    profile: Workspace,
}

impl OfficeSession {
    pub fn start(config: &Config) -> ConversionResult<Self> {
        let profile = Workspace::create(config)?;
        debug!(
            program = %config.soffice.display(),
            profile = %profile.path().display(),
            "office session started"
        );
        Ok(Self {
            program: config.soffice.clone(),
            profile,
        })
    }

    /// Converts `input` into `out_dir`. `target` is a `--convert-to` value such
    /// as `pdf` or `docx:MS Word 2007 XML`. Returns the produced file.
    pub fn convert(&self, input: &Path, target: &str, out_dir: &Path) -> ConversionResult<PathBuf> {
        self.run(input, target, None, out_dir)
    }

    /// Like [`convert`](Self::convert), but opens a PDF with the Writer import
    /// filter so it can be saved as an editable document.
    pub fn import_pdf(&self, input: &Path, target: &str, out_dir: &Path) -> ConversionResult<PathBuf> {
        self.run(input, target, Some(PDF_IMPORT_FILTER), out_dir)
    }

    fn run(
        &self,
        input: &Path,
        target: &str,
        infilter: Option<&str>,
        out_dir: &Path,
    ) -> ConversionResult<PathBuf> {
        let mut command = Command::new(&self.program);
        command
            .arg(format!("-env:UserInstallation={}", profile_url(self.profile.path())))
            .args(["--headless", "--norestore", "--nolockcheck"]);
        if let Some(filter) = infilter {
            command.arg(format!("--infilter={filter}"));
        }
        command
            .arg("--convert-to")
            .arg(target)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);

        run_tool(command, "soffice")?;

        let produced = out_dir.join(produced_name(input, target)?);
        if !produced.is_file() {
            return Err(ConversionError::library(format!(
                "soffice did not produce {}",
                produced.display()
            )));
        }
        Ok(produced)
    }
}

/// LibreOffice names its output after the input stem and the filter's extension.
fn produced_name(input: &Path, target: &str) -> ConversionResult<OsString> {
    let stem = input.file_stem().ok_or_else(|| {
        ConversionError::invalid(format!("input has no file name: {}", input.display()))
    })?;
    let extension = target.split(':').next().unwrap_or(target);
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    Ok(name)
}

fn profile_url(dir: &Path) -> String {
    let path = dir.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_follows_input_stem_and_filter() {
        assert_eq!(
            produced_name(Path::new("/in/report.v2.docx"), "pdf").unwrap(),
            OsString::from("report.v2.pdf")
        );
        assert_eq!(
            produced_name(Path::new("scan.PDF"), "docx:MS Word 2007 XML").unwrap(),
            OsString::from("scan.docx")
        );
    }

    #[test]
    fn profile_urls_are_absolute_file_urls() {
        assert_eq!(profile_url(Path::new("/tmp/fileconv-ab")), "file:///tmp/fileconv-ab");
        assert_eq!(
            profile_url(Path::new(r"C:\Temp\fileconv-ab")),
            "file:///C:/Temp/fileconv-ab"
        );
    }

    #[test]
    fn missing_binary_fails_as_library_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            soffice: PathBuf::from("fileconv-missing-soffice"),
            ..Config::default()
        };
        let session = OfficeSession::start(&config).unwrap();
        let err = session
            .convert(&dir.path().join("a.docx"), "pdf", dir.path())
            .unwrap_err();
        assert!(matches!(err, ConversionError::ConversionLibrary(_)));
    }
}
