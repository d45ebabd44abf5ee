//! Helper functions for database row conversion and parsing.
//!
//! These utilities convert between database representations and domain types.
//! Also provides SQL column list constants so every query selects columns in
//! the order the row converters expect.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::types::{Dependency, DependencyId, DependencyKind, Entity, EntityKind, EntityRef};

/// SQL column list for the dependencies table.
///
/// Use with `row_to_dependency` for consistent column ordering.
pub(crate) const DEPENDENCY_COLUMNS: &str =
    "id, from_type, from_id, to_type, to_id, kind, lag_days, note, created_at";

/// Ordering shared by every multi-row dependency query.
///
/// `rowid` breaks ties between edges created within the same microsecond.
pub(crate) const DEPENDENCY_ORDER: &str = "ORDER BY created_at, rowid";

/// SQL column list for an entity table.
///
/// Projects have no owning project, so the column is selected as `NULL`.
pub(crate) fn entity_columns(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Project => "id, name, NULL, created_at",
        EntityKind::Task => "id, name, project_id, created_at",
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

/// Parse an entity kind string from the database.
///
/// Returns an error for unrecognized values, indicating possible database corruption.
pub(crate) fn parse_entity_kind(column: usize, s: &str) -> rusqlite::Result<EntityKind> {
    match s {
        "project" => Ok(EntityKind::Project),
        "task" => Ok(EntityKind::Task),
        unknown => Err(conversion_error(
            column,
            format!("Unknown entity kind '{unknown}' in database. Database may be corrupted or from a newer version."),
        )),
    }
}

/// Parse a dependency kind code from the database.
///
/// Returns an error for unrecognized values, indicating possible database corruption.
pub(crate) fn parse_dependency_kind(column: usize, s: &str) -> rusqlite::Result<DependencyKind> {
    match s {
        "FS" => Ok(DependencyKind::FinishToStart),
        "SS" => Ok(DependencyKind::StartToStart),
        "FF" => Ok(DependencyKind::FinishToFinish),
        "SF" => Ok(DependencyKind::StartToFinish),
        unknown => Err(conversion_error(
            column,
            format!("Unknown dependency kind '{unknown}' in database. Database may be corrupted or from a newer version."),
        )),
    }
}

/// Parse a stored RFC 3339 timestamp.
pub(crate) fn parse_timestamp(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, format!("Invalid timestamp '{s}' in database: {e}")))
}

/// Format a timestamp for storage.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at storage precision, so a freshly built record compares
/// equal to the same record read back.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Convert a row selected with `DEPENDENCY_COLUMNS` into a `Dependency`.
pub(crate) fn row_to_dependency(row: &Row<'_>) -> rusqlite::Result<Dependency> {
    let from_type: String = row.get(1)?;
    let to_type: String = row.get(3)?;
    let kind: String = row.get(5)?;
    let created_at: String = row.get(8)?;

    Ok(Dependency {
        id: DependencyId::new(row.get::<_, String>(0)?),
        from: EntityRef::new(parse_entity_kind(1, &from_type)?, row.get::<_, String>(2)?),
        to: EntityRef::new(parse_entity_kind(3, &to_type)?, row.get::<_, String>(4)?),
        kind: parse_dependency_kind(5, &kind)?,
        lag_days: row.get(6)?,
        note: row.get(7)?,
        created_at: parse_timestamp(8, &created_at)?,
    })
}

/// Convert a row selected with `entity_columns(kind)` into an `Entity`.
pub(crate) fn row_to_entity(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Entity> {
    let created_at: String = row.get(3)?;

    Ok(Entity {
        kind,
        id: row.get(0)?,
        name: row.get(1)?,
        project_id: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
    })
}
