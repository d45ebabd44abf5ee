//! The dependency service: the only way edges are created, changed or removed.
//!
//! Every mutation runs its validation reads and its write inside one
//! `BEGIN IMMEDIATE` transaction, so the graph a check sees is the graph the
//! write lands in. Validation for a new edge runs in a fixed order and stops
//! at the first failure:
//!
//! 1. Self-reference
//! 2. Missing endpoints (both sides reported together)
//! 3. Duplicate `(from, to, kind)`
//! 4. Cycle, treating the candidate as already added
//!
//! Rejections are returned as [`Response`] values, never as `Err` or panics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{Store, dependencies, now};
use crate::error::{DependencyError, Endpoint, Error};
use crate::graph::DependencyGraph;
use crate::id_generation::IdGenerator;
use crate::lookup::{EntityLookup, TableLookup, display_label};
use crate::response::Response;
use crate::types::{
    Cycle, Dependency, DependencyId, DependencyKind, DependencyStats, DependencyUpdate,
    EntityDependencies, EntityRef, NewDependency,
};

/// Prefix of generated dependency ids.
pub const DEPENDENCY_ID_PREFIX: &str = "dep";

type Outcome<T> = std::result::Result<T, DependencyError>;

/// Manages dependency edges between projects and tasks.
///
/// Cheap to share: the store sits behind an `Arc`, and the service holds no
/// other state.
#[derive(Debug, Clone)]
pub struct DependencyService<L = TableLookup> {
    store: Arc<Store>,
    lookup: L,
}

impl DependencyService<TableLookup> {
    /// Create a service that resolves entities from the store's own tables.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_lookup(store, TableLookup)
    }
}

impl<L: EntityLookup> DependencyService<L> {
    /// Create a service with a custom entity lookup.
    pub fn with_lookup(store: Arc<Store>, lookup: L) -> Self {
        Self { store, lookup }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Validate and persist a new dependency.
    pub fn create_dependency(&self, request: NewDependency) -> Response<Dependency> {
        report("create_dependency", self.create(request))
    }

    /// Delete a dependency by id. No cycle re-validation is needed.
    pub fn delete_dependency(&self, id: &DependencyId) -> Response<Dependency> {
        report("delete_dependency", self.delete(id))
    }

    /// Change the metadata (`kind`, `lag_days`, `note`) of a dependency.
    pub fn update_dependency(
        &self,
        id: &DependencyId,
        update: DependencyUpdate,
    ) -> Response<Dependency> {
        report("update_dependency", self.update(id, update))
    }

    /// Delete every dependency with an endpoint that no longer resolves.
    pub fn prune_orphaned_dependencies(&self) -> Response<Vec<Dependency>> {
        report("prune_orphaned_dependencies", self.prune_orphans())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fetch one dependency.
    pub fn get_dependency(&self, id: &DependencyId) -> Response<Dependency> {
        report("get_dependency", self.get(id))
    }

    /// Run the full create validation without writing anything.
    ///
    /// Reads the committed state; a concurrent writer may still change the
    /// answer before a later create.
    pub fn check_dependency(&self, request: NewDependency) -> Response<NewDependency> {
        report("check_dependency", self.check(request))
    }

    /// Outgoing, incoming and combined edges for one entity.
    pub fn get_dependencies_for_entity(&self, entity: &EntityRef) -> Response<EntityDependencies> {
        report("get_dependencies_for_entity", self.for_entity(entity))
    }

    /// Every dependency, oldest first.
    pub fn get_all_dependencies(&self) -> Response<Vec<Dependency>> {
        report("get_all_dependencies", self.read(dependencies::list_all))
    }

    /// Edge totals, overall and per kind.
    pub fn get_dependency_stats(&self) -> Response<DependencyStats> {
        report("get_dependency_stats", self.stats())
    }

    /// Scan the stored graph for cycles.
    ///
    /// Edges created through this service never form one, so a non-empty
    /// result means rows were written around it.
    pub fn find_cycles(&self) -> Response<Vec<Cycle>> {
        report("find_cycles", self.scan_cycles())
    }

    /// Dependencies whose `from` or `to` no longer resolves.
    pub fn get_orphaned_dependencies(&self) -> Response<Vec<Dependency>> {
        report(
            "get_orphaned_dependencies",
            self.read(|conn| self.orphans(conn)),
        )
    }

    // ------------------------------------------------------------------
    // Implementation
    // ------------------------------------------------------------------

    fn read<T>(&self, f: impl FnOnce(&Connection) -> crate::error::Result<T>) -> Outcome<T> {
        let conn = self.store.connection()?;
        Ok(f(&conn)?)
    }

    fn create(&self, request: NewDependency) -> Outcome<Dependency> {
        if request.from == request.to {
            return Err(DependencyError::SelfReference);
        }
        let note = normalize_note(request.note);

        let dep = self.store.write(|tx| {
            self.validate(tx, &request.from, &request.to, request.kind)?;

            let seed = format!("{}->{}:{}", request.from, request.to, request.kind);
            let generator = IdGenerator::new(DEPENDENCY_ID_PREFIX, dependencies::count(tx)?);
            let id = generator
                .generate::<Error, _>(&seed, |candidate| dependencies::id_exists(tx, candidate))?;

            let dep = Dependency {
                id: DependencyId::new(id),
                from: request.from,
                to: request.to,
                kind: request.kind,
                lag_days: request.lag_days,
                note,
                created_at: now(),
            };
            dependencies::insert(tx, &dep)?;
            Ok::<_, DependencyError>(dep)
        })?;

        info!(
            id = %dep.id,
            from = %dep.from,
            to = %dep.to,
            kind = %dep.kind,
            "Created dependency"
        );
        Ok(dep)
    }

    fn check(&self, mut request: NewDependency) -> Outcome<NewDependency> {
        if request.from == request.to {
            return Err(DependencyError::SelfReference);
        }
        request.note = normalize_note(request.note);

        let conn = self.store.connection()?;
        self.validate(&conn, &request.from, &request.to, request.kind)?;
        Ok(request)
    }

    /// Validation steps 1-4 against `conn`.
    fn validate(
        &self,
        conn: &Connection,
        from: &EntityRef,
        to: &EntityRef,
        kind: DependencyKind,
    ) -> Outcome<()> {
        if from == to {
            return Err(DependencyError::SelfReference);
        }

        let mut missing = Vec::new();
        for (side, entity) in [(Endpoint::Source, from), (Endpoint::Target, to)] {
            if !self.lookup.exists(conn, entity)? {
                missing.push((side, entity.clone()));
            }
        }
        if !missing.is_empty() {
            debug!(%from, %to, missing = missing.len(), "Rejected dependency: missing entity");
            return Err(DependencyError::MissingEntities(missing));
        }

        if dependencies::find_triple(conn, from, to, kind)?.is_some() {
            debug!(%from, %to, %kind, "Rejected dependency: duplicate");
            return Err(DependencyError::Duplicate {
                from: from.clone(),
                to: to.clone(),
                kind,
            });
        }

        let graph = DependencyGraph::from_edges(dependencies::edge_pairs(conn)?);
        debug!(
            node_count = graph.node_count(),
            edge_count = graph.edge_count(),
            "Checking candidate edge for cycles"
        );

        if let Some(loop_path) = graph.would_create_cycle(from, to) {
            let path = loop_path
                .iter()
                .map(|entity| display_label(&self.lookup, conn, entity))
                .collect::<crate::error::Result<Vec<_>>>()?;
            debug!(%from, %to, length = loop_path.len(), "Rejected dependency: cycle");
            return Err(DependencyError::Cycle { path });
        }

        Ok(())
    }

    fn delete(&self, id: &DependencyId) -> Outcome<Dependency> {
        let dep = self.store.write(|tx| {
            let dep = dependencies::get(tx, id)?
                .ok_or_else(|| DependencyError::DependencyNotFound(id.clone()))?;
            dependencies::delete(tx, id)?;
            Ok::<_, DependencyError>(dep)
        })?;

        info!(id = %dep.id, from = %dep.from, to = %dep.to, "Deleted dependency");
        Ok(dep)
    }

    fn update(&self, id: &DependencyId, update: DependencyUpdate) -> Outcome<Dependency> {
        if update.is_empty() {
            return self.get(id);
        }

        let dep = self.store.write(|tx| {
            let mut dep = dependencies::get(tx, id)?
                .ok_or_else(|| DependencyError::DependencyNotFound(id.clone()))?;

            if let Some(kind) = update.kind.filter(|&kind| kind != dep.kind) {
                if dependencies::find_triple(tx, &dep.from, &dep.to, kind)?.is_some() {
                    return Err(DependencyError::Duplicate {
                        from: dep.from.clone(),
                        to: dep.to.clone(),
                        kind,
                    });
                }
                dep.kind = kind;
            }
            if let Some(lag_days) = update.lag_days {
                dep.lag_days = lag_days;
            }
            if let Some(note) = update.note {
                dep.note = normalize_note(note);
            }

            dependencies::update_metadata(tx, &dep)?;
            Ok::<_, DependencyError>(dep)
        })?;

        info!(id = %dep.id, kind = %dep.kind, lag_days = dep.lag_days, "Updated dependency");
        Ok(dep)
    }

    fn get(&self, id: &DependencyId) -> Outcome<Dependency> {
        let conn = self.store.connection()?;
        dependencies::get(&conn, id)?.ok_or_else(|| DependencyError::DependencyNotFound(id.clone()))
    }

    fn for_entity(&self, entity: &EntityRef) -> Outcome<EntityDependencies> {
        let conn = self.store.connection()?;
        Ok(EntityDependencies {
            outgoing: dependencies::outgoing(&conn, entity)?,
            incoming: dependencies::incoming(&conn, entity)?,
            all: dependencies::involving(&conn, entity)?,
        })
    }

    fn stats(&self) -> Outcome<DependencyStats> {
        let conn = self.store.connection()?;

        let mut by_kind: BTreeMap<DependencyKind, usize> =
            DependencyKind::ALL.iter().map(|&kind| (kind, 0)).collect();
        by_kind.extend(dependencies::count_by_kind(&conn)?);

        Ok(DependencyStats {
            total: dependencies::count(&conn)?,
            by_kind,
        })
    }

    fn scan_cycles(&self) -> Outcome<Vec<Cycle>> {
        let conn = self.store.connection()?;
        let graph = DependencyGraph::from_edges(dependencies::edge_pairs(&conn)?);
        let cycles = graph.cycles();

        if !cycles.is_empty() {
            warn!(cycle_count = cycles.len(), "Stored dependency graph contains cycles");
        }
        Ok(cycles)
    }

    /// Edges with at least one unresolvable endpoint, oldest first.
    fn orphans(&self, conn: &Connection) -> crate::error::Result<Vec<Dependency>> {
        let mut known: HashMap<EntityRef, bool> = HashMap::new();
        let mut orphans = Vec::new();

        for dep in dependencies::list_all(conn)? {
            let mut resolves = true;
            for entity in [&dep.from, &dep.to] {
                let exists = match known.get(entity) {
                    Some(&exists) => exists,
                    None => {
                        let exists = self.lookup.exists(conn, entity)?;
                        known.insert(entity.clone(), exists);
                        exists
                    }
                };
                resolves &= exists;
            }
            if !resolves {
                orphans.push(dep);
            }
        }

        Ok(orphans)
    }

    fn prune_orphans(&self) -> Outcome<Vec<Dependency>> {
        let removed = self.store.write(|tx| {
            let orphans = self.orphans(tx)?;
            for dep in &orphans {
                dependencies::delete(tx, &dep.id)?;
            }
            Ok::<_, Error>(orphans)
        })?;

        info!(removed = removed.len(), "Pruned orphaned dependencies");
        Ok(removed)
    }
}

/// Blank notes are stored as no note.
fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Fold an outcome into a response, logging store failures.
fn report<T>(operation: &'static str, outcome: Outcome<T>) -> Response<T> {
    if let Err(error) = &outcome {
        if error.kind().is_internal_error() {
            warn!(operation, %error, "Dependency operation failed; transaction rolled back");
        } else {
            debug!(operation, %error, "Dependency operation rejected");
        }
    }
    outcome.into()
}
