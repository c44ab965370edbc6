use std::{fmt::Display, io, path::PathBuf};

use thiserror::Error;

pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("failed to create output directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error occurred during file conversion: {0}")]
    ConversionLibrary(String),
}

impl ConversionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wraps a converter failure, keeping its message verbatim.
    pub fn library(cause: impl Display) -> Self {
        Self::ConversionLibrary(cause.to_string())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<io::Error> for ConversionError {
    fn from(err: io::Error) -> Self {
        Self::library(err)
    }
}

impl From<image::ImageError> for ConversionError {
    fn from(err: image::ImageError) -> Self {
        Self::library(err)
    }
}

impl From<tiff::TiffError> for ConversionError {
    fn from(err: tiff::TiffError) -> Self {
        Self::library(err)
    }
}

impl From<lopdf::Error> for ConversionError {
    fn from(err: lopdf::Error) -> Self {
        Self::library(err)
    }
}

impl From<calamine::XlsxError> for ConversionError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::library(err)
    }
}

impl From<csv::Error> for ConversionError {
    fn from(err: csv::Error) -> Self {
        Self::library(err)
    }
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::library(err)
    }
}
