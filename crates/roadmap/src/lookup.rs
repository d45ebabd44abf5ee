//! Entity existence and naming, as seen by the dependency service.
//!
//! The service does not own projects or tasks; it only asks whether an
//! endpoint exists and what to call it in messages. Both questions are
//! answered on the connection the service is already using, so a check made
//! inside a write transaction sees that transaction's view.

use rusqlite::Connection;

use crate::db::{entity_exists, entity_name};
use crate::error::Result;
use crate::types::EntityRef;

/// Resolves entity references for the dependency service.
pub trait EntityLookup: Send + Sync {
    /// Whether `entity` currently exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn exists(&self, conn: &Connection, entity: &EntityRef) -> Result<bool>;

    /// Human-readable label, or `None` when the entity cannot be resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn label(&self, conn: &Connection, entity: &EntityRef) -> Result<Option<String>>;
}

/// Default lookup against the `projects` and `tasks` tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableLookup;

impl EntityLookup for TableLookup {
    fn exists(&self, conn: &Connection, entity: &EntityRef) -> Result<bool> {
        entity_exists(conn, entity)
    }

    fn label(&self, conn: &Connection, entity: &EntityRef) -> Result<Option<String>> {
        entity_name(conn, entity)
    }
}

/// Label for messages: the entity's name, or `kind:id` when it cannot be
/// resolved (e.g. an orphaned endpoint).
pub(crate) fn display_label<L: EntityLookup + ?Sized>(
    lookup: &L,
    conn: &Connection,
    entity: &EntityRef,
) -> Result<String> {
    Ok(lookup
        .label(conn, entity)?
        .unwrap_or_else(|| entity.to_string()))
}
