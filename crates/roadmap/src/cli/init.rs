//! `roadmap init` command implementation.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use roadmap::config;

use super::display::{OutputMode, print_json};

/// Run the init command.
pub fn run(directory: &Path, database: Option<&str>, mode: OutputMode) -> Result<ExitCode> {
    let result = config::init(directory, database)?;

    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "roadmap_dir": result.roadmap_dir.display().to_string(),
            "config_file": result.config_file.display().to_string(),
            "database": result.database_file.display().to_string(),
        }))?,
        OutputMode::Text => {
            println!(
                "{} roadmap in {}",
                "Initialized".green().bold(),
                result.roadmap_dir.display()
            );
            println!("  Config:   {}", result.config_file.display());
            println!("  Database: {}", result.database_file.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
