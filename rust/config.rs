use std::{env, path::PathBuf};

use serde::Serialize;
use tracing::warn;

const SOFFICE_ENV_VAR: &str = "FILECONV_SOFFICE";
const PDFTOPPM_ENV_VAR: &str = "FILECONV_PDFTOPPM";
const PDFTOHTML_ENV_VAR: &str = "FILECONV_PDFTOHTML";
const RENDER_DPI_ENV_VAR: &str = "FILECONV_RENDER_DPI";
const TEMP_DIR_ENV_VAR: &str = "FILECONV_TEMP_DIR";

const DEFAULT_SOFFICE: &str = "soffice";
const DEFAULT_PDFTOPPM: &str = "pdftoppm";
const DEFAULT_PDFTOHTML: &str = "pdftohtml";
pub const DEFAULT_RENDER_DPI: u32 = 300;

/// External programs and rendering knobs, read from the environment.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub soffice: PathBuf,
    pub pdftoppm: PathBuf,
    pub pdftohtml: PathBuf,
    pub render_dpi: u32,
    pub temp_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            soffice: PathBuf::from(DEFAULT_SOFFICE),
            pdftoppm: PathBuf::from(DEFAULT_PDFTOPPM),
            pdftohtml: PathBuf::from(DEFAULT_PDFTOHTML),
            render_dpi: DEFAULT_RENDER_DPI,
            temp_root: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            soffice: program(SOFFICE_ENV_VAR, DEFAULT_SOFFICE),
            pdftoppm: program(PDFTOPPM_ENV_VAR, DEFAULT_PDFTOPPM),
            pdftohtml: program(PDFTOHTML_ENV_VAR, DEFAULT_PDFTOHTML),
            render_dpi: render_dpi(env::var(RENDER_DPI_ENV_VAR).ok().as_deref()),
            temp_root: env::var(TEMP_DIR_ENV_VAR)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

fn program(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn render_dpi(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_RENDER_DPI;
    };
    match raw.trim().parse::<u32>() {
        Ok(dpi) if (36..=1200).contains(&dpi) => dpi,
        _ => {
            warn!(value = raw, "ignoring invalid {RENDER_DPI_ENV_VAR}");
            DEFAULT_RENDER_DPI
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_dpi_falls_back_on_garbage() {
        assert_eq!(render_dpi(None), DEFAULT_RENDER_DPI);
        assert_eq!(render_dpi(Some("150")), 150);
        assert_eq!(render_dpi(Some(" 600 ")), 600);
        assert_eq!(render_dpi(Some("0")), DEFAULT_RENDER_DPI);
        assert_eq!(render_dpi(Some("lots")), DEFAULT_RENDER_DPI);
    }

    #[test]
    fn default_points_at_path_programs() {
        let config = Config::default();
        assert_eq!(config.soffice, PathBuf::from("soffice"));
        assert_eq!(config.render_dpi, 300);
        assert!(config.temp_root.is_none());
    }
}
