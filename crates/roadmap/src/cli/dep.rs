//! `roadmap dep` command implementations.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use roadmap::{DependencyId, DependencyKind, DependencyUpdate, EntityRef, NewDependency};

use super::display::{OutputMode, finish, format_dependency, print_dependencies};
use super::open_service;

/// Add a dependency.
pub fn add(
    directory: &Path,
    from: EntityRef,
    to: EntityRef,
    kind: DependencyKind,
    lag_days: i32,
    note: Option<String>,
    mode: OutputMode,
) -> Result<ExitCode> {
    let service = open_service(directory)?;

    let request = NewDependency {
        from,
        to,
        kind,
        lag_days,
        note,
    };

    finish(service.create_dependency(request), mode, |dep| {
        println!("{} dependency:", "Added".green().bold());
        println!("  {}", format_dependency(dep));
    })
}

/// Remove a dependency.
pub fn remove(directory: &Path, id: &str, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;

    finish(
        service.delete_dependency(&DependencyId::from(id)),
        mode,
        |dep| {
            println!("{} dependency:", "Removed".green().bold());
            println!("  {}", format_dependency(dep));
        },
    )
}

/// Update the metadata of a dependency.
pub fn update(
    directory: &Path,
    id: &str,
    kind: Option<DependencyKind>,
    lag_days: Option<i32>,
    note: Option<String>,
    clear_note: bool,
    mode: OutputMode,
) -> Result<ExitCode> {
    let service = open_service(directory)?;

    let update = DependencyUpdate {
        kind,
        lag_days,
        note: if clear_note { Some(None) } else { note.map(Some) },
    };

    finish(
        service.update_dependency(&DependencyId::from(id), update),
        mode,
        |dep| {
            println!("{} dependency:", "Updated".green().bold());
            println!("  {}", format_dependency(dep));
        },
    )
}

/// Show incoming and outgoing dependencies of one entity.
pub fn show(directory: &Path, entity: &EntityRef, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;

    finish(service.get_dependencies_for_entity(entity), mode, |deps| {
        println!("{}", entity.to_string().cyan().bold());
        println!();
        println!("{} ({}):", "Depends on".white().bold(), deps.incoming.len());
        print_dependencies(&deps.incoming, "nothing");
        println!();
        println!("{} ({}):", "Blocks".white().bold(), deps.outgoing.len());
        print_dependencies(&deps.outgoing, "nothing");
    })
}

/// List every dependency.
pub fn list(directory: &Path, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;

    finish(service.get_all_dependencies(), mode, |deps| {
        if !deps.is_empty() {
            println!("{} dependencies:", deps.len().to_string().bold());
        }
        print_dependencies(deps, "No dependencies.");
    })
}

/// Show counts by kind.
pub fn stats(directory: &Path, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;

    finish(service.get_dependency_stats(), mode, |stats| {
        println!("{}", "Dependency Statistics".cyan().bold());
        println!();
        println!(
            "  {}: {}",
            "Total".white().bold(),
            stats.total.to_string().green()
        );
        for kind in DependencyKind::ALL {
            println!(
                "    {} ({}): {}",
                kind.as_str(),
                kind.description().dimmed(),
                stats.count(kind)
            );
        }
    })
}

/// Dry-run validation of a dependency.
pub fn check(
    directory: &Path,
    from: EntityRef,
    to: EntityRef,
    kind: DependencyKind,
    mode: OutputMode,
) -> Result<ExitCode> {
    let service = open_service(directory)?;

    finish(
        service.check_dependency(NewDependency::new(from, to, kind)),
        mode,
        |request| {
            println!(
                "{} {} {} {} ({}) can be added",
                "OK".green().bold(),
                request.from,
                "→".dimmed(),
                request.to,
                request.kind
            );
        },
    )
}

/// Scan the stored graph for cycles.
pub fn cycles(directory: &Path, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;
    let response = service.find_cycles();

    // Finding cycles is a successful scan, but the graph is unhealthy
    let has_cycles = response.data().is_some_and(|cycles| !cycles.is_empty());

    let code = finish(response, mode, |cycles| {
        if cycles.is_empty() {
            println!("{}", "No circular dependencies detected.".green());
            return;
        }

        println!(
            "Found {} circular dependencies:",
            cycles.len().to_string().red().bold()
        );
        println!();
        for (i, cycle) in cycles.iter().enumerate() {
            println!("  {} {}:", "Cycle".yellow().bold(), i + 1);
            println!("    {}", cycle.to_string().dimmed());
        }
    })?;

    Ok(if has_cycles { ExitCode::FAILURE } else { code })
}

/// List, and optionally delete, orphaned dependencies.
pub fn orphans(directory: &Path, prune: bool, mode: OutputMode) -> Result<ExitCode> {
    let service = open_service(directory)?;

    if prune {
        return finish(service.prune_orphaned_dependencies(), mode, |removed| {
            println!(
                "{} {} orphaned dependencies",
                "Removed".green().bold(),
                removed.len()
            );
            print_dependencies(removed, "Nothing to remove.");
        });
    }

    finish(service.get_orphaned_dependencies(), mode, |orphans| {
        if !orphans.is_empty() {
            println!(
                "{} orphaned dependencies:",
                orphans.len().to_string().yellow().bold()
            );
        }
        print_dependencies(orphans, "No orphaned dependencies.");
    })
}
