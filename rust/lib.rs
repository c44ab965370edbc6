pub mod assemble;
pub mod cli;
pub mod clients;
mod commands;
pub mod config;
pub mod convert;
pub mod error;
pub mod imaging;
pub mod output_path;
#[cfg(feature = "python-bindings")]
mod python;
pub mod workspace;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt;

use crate::{
    cli::Cli,
    commands::{CommandContext, run_command},
    config::Config,
};

pub use crate::{
    convert::{Conversion, ConversionOutput, ConversionRequest, execute},
    error::{ConversionError, ConversionResult},
    output_path::{resolve, resolve_page},
};

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let max = match cli.global.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    fmt()
        .with_max_level(max)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .ok();

    let context = CommandContext {
        config: Config::from_env(),
        json: cli.global.json,
    };

    run_command(cli.command, context)
}
