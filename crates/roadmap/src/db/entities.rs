//! Project and task CRUD operations.
//!
//! Deleting an entity never touches `dependencies`; edges that pointed at it
//! become orphans.

use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::helpers::{entity_columns, format_timestamp, now, row_to_entity};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use crate::types::{Entity, EntityKind, EntityRef};

/// Whether `entity` currently exists in its owning table.
pub(crate) fn entity_exists(conn: &Connection, entity: &EntityRef) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", entity.kind.table());
    let found = conn
        .query_row(&sql, [&entity.id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

/// Display name of `entity`, if it exists.
pub(crate) fn entity_name(conn: &Connection, entity: &EntityRef) -> Result<Option<String>> {
    let sql = format!("SELECT name FROM {} WHERE id = ?1", entity.kind.table());
    Ok(conn
        .query_row(&sql, [&entity.id], |row| row.get(0))
        .optional()?)
}

fn get_entity(conn: &Connection, entity: &EntityRef) -> Result<Option<Entity>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        entity_columns(entity.kind),
        entity.kind.table()
    );
    Ok(conn
        .query_row(&sql, [&entity.id], |row| row_to_entity(entity.kind, row))
        .optional()?)
}

fn insert_entity_row(conn: &Connection, entity: &Entity) -> Result<()> {
    let created_at = format_timestamp(&entity.created_at);
    match entity.kind {
        EntityKind::Project => conn.execute(
            "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![entity.id, entity.name, created_at],
        )?,
        EntityKind::Task => conn.execute(
            "INSERT INTO tasks (id, project_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![entity.id, entity.project_id, entity.name, created_at],
        )?,
    };
    Ok(())
}

fn count_entities(conn: &Connection, kind: EntityKind) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

fn validate_entity(kind: EntityKind, id: &str, name: &str, project_id: Option<&str>) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Config(format!("{kind} id cannot be empty")));
    }
    if name.trim().is_empty() {
        return Err(Error::Config(format!("{kind} name cannot be empty")));
    }
    if kind == EntityKind::Project && project_id.is_some() {
        return Err(Error::Config("projects cannot belong to a project".to_string()));
    }
    Ok(())
}

impl Store {
    /// Insert an entity with a caller-chosen id.
    ///
    /// `project_id` is only valid for tasks and must name an existing project.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for empty ids or names, and `Error::Database`
    /// when the id is already taken or the owning project does not exist.
    pub fn insert_entity(
        &self,
        kind: EntityKind,
        id: &str,
        name: &str,
        project_id: Option<&str>,
    ) -> Result<Entity> {
        validate_entity(kind, id, name, project_id)?;

        let entity = Entity {
            kind,
            id: id.trim().to_string(),
            name: name.trim().to_string(),
            project_id: project_id.map(str::to_string),
            created_at: now(),
        };

        self.write(|tx| insert_entity_row(tx, &entity))?;
        tracing::debug!(entity = %entity.entity_ref(), "Inserted entity");
        Ok(entity)
    }

    /// Create an entity with a generated id (`prj-…` or `tsk-…`).
    pub fn create_entity(
        &self,
        kind: EntityKind,
        name: &str,
        project_id: Option<&str>,
    ) -> Result<Entity> {
        validate_entity(kind, kind.id_prefix(), name, project_id)?;

        let entity = self.write(|tx| {
            let generator = IdGenerator::new(kind.id_prefix(), count_entities(tx, kind)?);
            let id = generator.generate::<Error, _>(name, |candidate| {
                entity_exists(tx, &EntityRef::new(kind, candidate))
            })?;

            let entity = Entity {
                kind,
                id,
                name: name.trim().to_string(),
                project_id: project_id.map(str::to_string),
                created_at: now(),
            };
            insert_entity_row(tx, &entity)?;
            Ok::<_, Error>(entity)
        })?;

        tracing::debug!(entity = %entity.entity_ref(), "Created entity");
        Ok(entity)
    }

    /// Get an entity by reference.
    pub fn get_entity(&self, entity: &EntityRef) -> Result<Option<Entity>> {
        let conn = self.connection()?;
        get_entity(&conn, entity)
    }

    /// List all entities of one kind, oldest first.
    pub fn list_entities(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at, rowid",
            entity_columns(kind),
            kind.table()
        );

        let mut stmt = conn.prepare(&sql)?;
        let entities = stmt
            .query_map([], |row| row_to_entity(kind, row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    /// Delete an entity. Dependencies that reference it are left in place.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the entity does not exist.
    pub fn delete_entity(&self, entity: &EntityRef) -> Result<Entity> {
        let deleted = self.write(|tx| {
            let existing =
                get_entity(tx, entity)?.ok_or_else(|| Error::NotFound(entity.to_string()))?;
            let sql = format!("DELETE FROM {} WHERE id = ?1", entity.kind.table());
            tx.execute(&sql, [&entity.id])?;
            Ok::<_, Error>(existing)
        })?;

        tracing::debug!(entity = %entity, "Deleted entity");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_generation::validate_id;

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn insert_and_get_project() {
        let store = store();
        let created = store
            .insert_entity(EntityKind::Project, "p1", "Alpha", None)
            .unwrap();

        let fetched = store.get_entity(&EntityRef::project("p1")).unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[test]
    fn task_records_owning_project() {
        let store = store();
        store
            .insert_entity(EntityKind::Project, "p1", "Alpha", None)
            .unwrap();
        store
            .insert_entity(EntityKind::Task, "t1", "Design", Some("p1"))
            .unwrap();

        let task = store.get_entity(&EntityRef::task("t1")).unwrap().unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p1"));
    }

    #[test]
    fn task_with_unknown_project_is_rejected() {
        let store = store();

        let result = store.insert_entity(EntityKind::Task, "t1", "Design", Some("nope"));
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let store = store();
        store
            .insert_entity(EntityKind::Project, "p1", "Alpha", None)
            .unwrap();

        let result = store.insert_entity(EntityKind::Project, "p1", "Again", None);
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn same_id_may_exist_as_project_and_task() {
        let store = store();
        store
            .insert_entity(EntityKind::Project, "x", "Project X", None)
            .unwrap();
        store
            .insert_entity(EntityKind::Task, "x", "Task X", None)
            .unwrap();

        assert!(store.get_entity(&EntityRef::project("x")).unwrap().is_some());
        assert!(store.get_entity(&EntityRef::task("x")).unwrap().is_some());
    }

    #[test]
    fn blank_name_is_rejected() {
        let store = store();
        let result = store.insert_entity(EntityKind::Project, "p1", "   ", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn create_generates_prefixed_ids() {
        let store = store();

        let project = store
            .create_entity(EntityKind::Project, "Alpha", None)
            .unwrap();
        let task = store
            .create_entity(EntityKind::Task, "Design", Some(&project.id))
            .unwrap();

        assert!(validate_id(&project.id, "prj"), "got {}", project.id);
        assert!(validate_id(&task.id, "tsk"), "got {}", task.id);
    }

    #[test]
    fn list_returns_only_requested_kind_in_creation_order() {
        let store = store();
        store
            .insert_entity(EntityKind::Project, "p2", "Second", None)
            .unwrap();
        store
            .insert_entity(EntityKind::Project, "p1", "First", None)
            .unwrap();
        store
            .insert_entity(EntityKind::Task, "t1", "Task", None)
            .unwrap();

        let ids: Vec<_> = store
            .list_entities(EntityKind::Project)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[test]
    fn delete_missing_entity_is_not_found() {
        let store = store();
        let result = store.delete_entity(&EntityRef::task("ghost"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn exists_and_name_lookups() {
        let store = store();
        store
            .insert_entity(EntityKind::Project, "p1", "Alpha", None)
            .unwrap();
        let conn = store.connection().unwrap();

        assert!(entity_exists(&conn, &EntityRef::project("p1")).unwrap());
        assert!(!entity_exists(&conn, &EntityRef::task("p1")).unwrap());
        assert_eq!(
            entity_name(&conn, &EntityRef::project("p1")).unwrap(),
            Some("Alpha".to_string())
        );
        assert_eq!(entity_name(&conn, &EntityRef::task("p1")).unwrap(), None);
    }
}
