//! Output path resolution shared by every conversion.
//!
//! Paths are handled as strings: the input may use `/` or `\` separators no
//! matter which platform runs the conversion, and the separator style found in
//! a caller-supplied output directory is preserved.

use std::{
    fs,
    path::PathBuf,
};

use tracing::debug;

use crate::error::{ConversionError, ConversionResult};

const PAGE_INDEX_WIDTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequest<'a> {
    pub input_path: &'a str,
    pub output_dir: Option<&'a str>,
    pub target_extension: &'a str,
}

impl<'a> PathRequest<'a> {
    pub fn new(input_path: &'a str, output_dir: Option<&'a str>, target_extension: &'a str) -> Self {
        Self {
            input_path,
            output_dir,
            target_extension,
        }
    }
}

/// Where the files of one conversion end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    dir: String,
    base_name: String,
    extension: String,
}

impl OutputTarget {
    /// Computes the target without touching the filesystem.
    pub fn plan(request: &PathRequest<'_>) -> ConversionResult<Self> {
        if request.input_path.trim().is_empty() {
            return Err(ConversionError::invalid(
                "Please select a valid file for processing.",
            ));
        }

        let extension = request.target_extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConversionError::invalid("target extension is empty"));
        }

        let (parent, file_name) = split_file_name(request.input_path);
        let base_name = strip_extension(file_name).ok_or_else(|| {
            ConversionError::invalid(format!(
                "input path has no file extension: {}",
                request.input_path
            ))
        })?;

        let dir = match request.output_dir.filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => normalize_dir(dir),
            None => parent.to_string(),
        };

        Ok(Self {
            dir,
            base_name: base_name.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Plans the target and makes sure its directory exists.
    pub fn prepare(request: &PathRequest<'_>) -> ConversionResult<Self> {
        let target = Self::plan(request)?;
        target.ensure_dir()?;
        Ok(target)
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Directory as a filesystem path; an input without a directory part maps to `.`.
    pub fn dir_path(&self) -> PathBuf {
        if self.dir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.dir)
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name, self.extension)
    }

    pub fn page_file_name(&self, page_index: u32) -> ConversionResult<String> {
        if page_index == 0 {
            return Err(ConversionError::invalid("page index is 1-based"));
        }
        Ok(format!(
            "{}-{:0width$}.{}",
            self.base_name,
            page_index,
            self.extension,
            width = PAGE_INDEX_WIDTH
        ))
    }

    /// Places `file_name` in the target directory, keeping its separator style.
    pub fn join(&self, file_name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.dir, file_name))
    }

    pub fn path(&self) -> PathBuf {
        self.join(&self.file_name())
    }

    pub fn page_path(&self, page_index: u32) -> ConversionResult<PathBuf> {
        Ok(self.join(&self.page_file_name(page_index)?))
    }

    fn ensure_dir(&self) -> ConversionResult<()> {
        if self.dir.is_empty() {
            return Ok(());
        }
        debug!(dir = %self.dir, "ensuring output directory");
        fs::create_dir_all(&self.dir).map_err(|source| ConversionError::DirectoryCreation {
            path: PathBuf::from(&self.dir),
            source,
        })
    }
}

/// Resolves the single output path of a conversion, creating its directory.
pub fn resolve(
    input_path: &str,
    output_dir: Option<&str>,
    target_extension: &str,
) -> ConversionResult<PathBuf> {
    let target = OutputTarget::prepare(&PathRequest::new(input_path, output_dir, target_extension))?;
    Ok(target.path())
}

/// Resolves the path of one page of a multi-output conversion.
pub fn resolve_page(
    input_path: &str,
    output_dir: Option<&str>,
    target_extension: &str,
    page_index: u32,
) -> ConversionResult<PathBuf> {
    let target = OutputTarget::prepare(&PathRequest::new(input_path, output_dir, target_extension))?;
    target.page_path(page_index)
}

/// Lower-cased extension of the file name component, if any.
pub fn input_extension(input_path: &str) -> Option<String> {
    let (_, file_name) = split_file_name(input_path);
    let base = strip_extension(file_name)?;
    Some(file_name[base.len() + 1..].to_ascii_lowercase())
}

/// Splits at the last `/` or `\`; the parent keeps its trailing separator.
fn split_file_name(input: &str) -> (&str, &str) {
    match input.rfind(['/', '\\']) {
        Some(idx) => input.split_at(idx + 1),
        None => ("", input),
    }
}

/// Removes exactly one trailing extension.
fn strip_extension(file_name: &str) -> Option<&str> {
    let dot = file_name.rfind('.')?;
    if dot == 0 || dot + 1 == file_name.len() {
        return None;
    }
    Some(&file_name[..dot])
}

/// Ends `dir` with one separator in its own style. A directory without any
/// separator is returned unchanged.
fn normalize_dir(dir: &str) -> String {
    let separator = if dir.contains('\\') {
        '\\'
    } else if dir.contains('/') {
        '/'
    } else {
        return dir.to_string();
    };
    let trimmed = dir.trim_end_matches(separator);
    format!("{trimmed}{separator}")
}
