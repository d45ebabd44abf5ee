//! `roadmap project` and `roadmap task` command implementations.
//!
//! Entities are the graph's nodes. Removing one leaves its dependencies in
//! place as orphans; `roadmap dep orphans --prune` cleans them up.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use roadmap::{Entity, EntityKind, EntityRef};

use super::display::{OutputMode, print_json};
use super::open_store;

fn print_entity(entity: &Entity) {
    let owner = entity
        .project_id
        .as_deref()
        .map(|project| format!("  (project:{project})"))
        .unwrap_or_default();
    println!(
        "  {} {}  {}{}",
        "•".dimmed(),
        entity.entity_ref().to_string().cyan(),
        entity.name,
        owner.dimmed()
    );
}

/// Add a project or task.
pub fn add(
    directory: &Path,
    kind: EntityKind,
    name: &str,
    id: Option<&str>,
    project: Option<&str>,
    mode: OutputMode,
) -> Result<ExitCode> {
    let store = open_store(directory)?;

    let entity = match id {
        Some(id) => store.insert_entity(kind, id, name, project)?,
        None => store.create_entity(kind, name, project)?,
    };

    match mode {
        OutputMode::Json => print_json(&entity)?,
        OutputMode::Text => {
            println!("{} {kind}:", "Added".green().bold());
            print_entity(&entity);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Remove a project or task.
pub fn remove(directory: &Path, entity: EntityRef, mode: OutputMode) -> Result<ExitCode> {
    let store = open_store(directory)?;
    let removed = store.delete_entity(&entity)?;

    match mode {
        OutputMode::Json => print_json(&removed)?,
        OutputMode::Text => {
            println!("{} {}:", "Removed".green().bold(), entity.kind);
            print_entity(&removed);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// List projects or tasks.
pub fn list(directory: &Path, kind: EntityKind, mode: OutputMode) -> Result<ExitCode> {
    let store = open_store(directory)?;
    let entities = store.list_entities(kind)?;

    match mode {
        OutputMode::Json => print_json(&entities)?,
        OutputMode::Text if entities.is_empty() => {
            println!("{}", format!("No {kind}s.").dimmed());
        }
        OutputMode::Text => {
            println!("{} {kind}s:", entities.len().to_string().bold());
            for entity in &entities {
                print_entity(entity);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
