//! Dependency edge queries.
//!
//! These take a plain `&Connection` so the service can run them inside its
//! write transaction (a `Transaction` derefs to `Connection`) or on the
//! shared connection for reads.

use rusqlite::{Connection, OptionalExtension, params};

use super::helpers::{
    DEPENDENCY_COLUMNS, DEPENDENCY_ORDER, format_timestamp, parse_dependency_kind,
    parse_entity_kind, row_to_dependency,
};
use crate::error::Result;
use crate::types::{Dependency, DependencyId, DependencyKind, EntityRef};

fn query_dependencies<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<Dependency>> {
    let sql = format!("SELECT {DEPENDENCY_COLUMNS} FROM dependencies {filter} {DEPENDENCY_ORDER}");
    let mut stmt = conn.prepare(&sql)?;
    let deps = stmt
        .query_map(params, row_to_dependency)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(deps)
}

/// Insert a fully built edge.
pub(crate) fn insert(conn: &Connection, dep: &Dependency) -> Result<()> {
    conn.execute(
        "INSERT INTO dependencies
            (id, from_type, from_id, to_type, to_id, kind, lag_days, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            dep.id.as_str(),
            dep.from.kind.as_str(),
            dep.from.id,
            dep.to.kind.as_str(),
            dep.to.id,
            dep.kind.as_str(),
            dep.lag_days,
            dep.note,
            format_timestamp(&dep.created_at),
        ],
    )?;
    Ok(())
}

/// Get one edge by id.
pub(crate) fn get(conn: &Connection, id: &DependencyId) -> Result<Option<Dependency>> {
    let sql = format!("SELECT {DEPENDENCY_COLUMNS} FROM dependencies WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id.as_str()], row_to_dependency)
        .optional()?)
}

/// Whether an edge id is already in use.
pub(crate) fn id_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM dependencies WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Find the edge with exactly this `(from, to, kind)` triple.
pub(crate) fn find_triple(
    conn: &Connection,
    from: &EntityRef,
    to: &EntityRef,
    kind: DependencyKind,
) -> Result<Option<Dependency>> {
    let sql = format!(
        "SELECT {DEPENDENCY_COLUMNS} FROM dependencies
         WHERE from_type = ?1 AND from_id = ?2 AND to_type = ?3 AND to_id = ?4 AND kind = ?5"
    );
    Ok(conn
        .query_row(
            &sql,
            params![
                from.kind.as_str(),
                from.id,
                to.kind.as_str(),
                to.id,
                kind.as_str()
            ],
            row_to_dependency,
        )
        .optional()?)
}

/// Every edge, oldest first.
pub(crate) fn list_all(conn: &Connection) -> Result<Vec<Dependency>> {
    query_dependencies(conn, "", [])
}

/// Edges where `entity` is the source.
pub(crate) fn outgoing(conn: &Connection, entity: &EntityRef) -> Result<Vec<Dependency>> {
    query_dependencies(
        conn,
        "WHERE from_type = ?1 AND from_id = ?2",
        params![entity.kind.as_str(), entity.id],
    )
}

/// Edges where `entity` is the target.
pub(crate) fn incoming(conn: &Connection, entity: &EntityRef) -> Result<Vec<Dependency>> {
    query_dependencies(
        conn,
        "WHERE to_type = ?1 AND to_id = ?2",
        params![entity.kind.as_str(), entity.id],
    )
}

/// Edges touching `entity` on either side, oldest first.
pub(crate) fn involving(conn: &Connection, entity: &EntityRef) -> Result<Vec<Dependency>> {
    query_dependencies(
        conn,
        "WHERE (from_type = ?1 AND from_id = ?2) OR (to_type = ?1 AND to_id = ?2)",
        params![entity.kind.as_str(), entity.id],
    )
}

/// Structural edges `(from, to)`, parallel edges of different kinds collapsed.
pub(crate) fn edge_pairs(conn: &Connection) -> Result<Vec<(EntityRef, EntityRef)>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT from_type, from_id, to_type, to_id FROM dependencies",
    )?;

    let pairs = stmt
        .query_map([], |row| {
            let from_type: String = row.get(0)?;
            let to_type: String = row.get(2)?;
            Ok((
                EntityRef::new(parse_entity_kind(0, &from_type)?, row.get::<_, String>(1)?),
                EntityRef::new(parse_entity_kind(2, &to_type)?, row.get::<_, String>(3)?),
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(pairs)
}

/// Overwrite the mutable metadata of an edge.
pub(crate) fn update_metadata(conn: &Connection, dep: &Dependency) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE dependencies SET kind = ?2, lag_days = ?3, note = ?4 WHERE id = ?1",
        params![dep.id.as_str(), dep.kind.as_str(), dep.lag_days, dep.note],
    )?)
}

/// Delete an edge by id, returning the number of rows removed.
pub(crate) fn delete(conn: &Connection, id: &DependencyId) -> Result<usize> {
    Ok(conn.execute("DELETE FROM dependencies WHERE id = ?1", [id.as_str()])?)
}

/// Total number of edges.
pub(crate) fn count(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM dependencies", [], |row| row.get(0))?)
}

/// Edge count per kind. Kinds with no edges are absent.
pub(crate) fn count_by_kind(conn: &Connection) -> Result<Vec<(DependencyKind, usize)>> {
    let mut stmt = conn.prepare("SELECT kind, COUNT(*) FROM dependencies GROUP BY kind")?;

    let counts = stmt
        .query_map([], |row| {
            let kind: String = row.get(0)?;
            Ok((parse_dependency_kind(0, &kind)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(counts)
}
