use anyhow::{Context, Result};
use serde_json::json;

use crate::{cli::ToolsArgs, clients::is_available};

use super::CommandContext;

pub fn handle(_args: ToolsArgs, ctx: &CommandContext) -> Result<()> {
    let config = &ctx.config;
    let programs = [
        ("soffice", &config.soffice),
        ("pdftoppm", &config.pdftoppm),
        ("pdftohtml", &config.pdftohtml),
    ];

    if ctx.json {
        let available: serde_json::Map<String, serde_json::Value> = programs
            .iter()
            .map(|(name, path)| (name.to_string(), json!(is_available(path))))
            .collect();
        let body = serde_json::to_string_pretty(&json!({
            "config": config,
            "available": available,
        }))
        .context("Failed to serialize tool report")?;
        println!("{body}");
        return Ok(());
    }

    println!("External programs:");
    for (name, path) in programs {
        let status = if is_available(path) { "found" } else { "missing" };
        println!("- {name}: {} ({status})", path.display());
    }
    println!("Render DPI: {}", config.render_dpi);
    match &config.temp_root {
        Some(root) => println!("Temp root: {}", root.display()),
        None => println!("Temp root: system default"),
    }
    Ok(())
}
