//! Common display utilities for CLI commands.

use std::io::{self, Write};
use std::process::ExitCode;

use colored::Colorize;
use roadmap::{Dependency, Response};
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Print a service response and map it to an exit code.
///
/// In JSON mode the whole response is printed, failures included. In text
/// mode `render` prints the payload, and failures go to stderr.
pub fn finish<T: Serialize>(
    response: Response<T>,
    mode: OutputMode,
    render: impl FnOnce(&T),
) -> anyhow::Result<ExitCode> {
    if mode == OutputMode::Json {
        print_json(&response)?;
    } else if let Some(data) = response.data() {
        render(data);
    } else {
        for message in &response.errors {
            eprintln!("{}: {message}", "error".red().bold());
        }
    }

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// One-line summary: `dep-abc123  project:a → task:b  FS +2d  note`
pub fn format_dependency(dep: &Dependency) -> String {
    let mut line = format!(
        "{}  {} {} {}  {}",
        dep.id.as_str().cyan(),
        dep.from,
        "→".dimmed(),
        dep.to,
        dep.kind.as_str().yellow()
    );
    if dep.lag_days != 0 {
        line.push_str(&format!(" {:+}d", dep.lag_days));
    }
    if let Some(note) = &dep.note {
        line.push_str(&format!("  {}", note.dimmed()));
    }
    line
}

/// Print dependencies one per line, or `empty_message` when there are none.
pub fn print_dependencies(deps: &[Dependency], empty_message: &str) {
    if deps.is_empty() {
        println!("  {}", empty_message.dimmed());
        return;
    }

    for dep in deps {
        println!("  {} {}", "•".dimmed(), format_dependency(dep));
    }
}
