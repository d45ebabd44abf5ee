//! Domain types for the roadmap dependency graph.
//!
//! These types represent the graph's data model:
//! - **Nodes**: `EntityRef` (a project or task; its lifecycle belongs to its own domain)
//! - **Edges**: `Dependency` (owned exclusively by `DependencyService`)
//! - **Requests**: `NewDependency`, `DependencyUpdate`
//! - **Results**: `EntityDependencies`, `DependencyStats`, `Cycle`
//!
//! ## Design Decisions
//!
//! | Decision | Choice | Rationale |
//! |----------|--------|-----------|
//! | Entity kind | Closed enum | Unsupported kinds fail at parse time, never at query time |
//! | Edge kind | Enum with `FS`/`SS`/`FF`/`SF` wire names | Matches scheduling vocabulary |
//! | Ids | Opaque strings | Entity ids are assigned by their owning domain |
//! | `created_at` | UTC, RFC 3339 in storage | Sortable as text, portable |

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a dependency edge (e.g. `dep-4k2x9q`).
///
/// Generated once at creation and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(String);

impl DependencyId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DependencyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DependencyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// Entities (graph nodes)
// ============================================================================

/// The kinds of entity that can take part in a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A roadmap project.
    Project,
    /// A task, optionally belonging to a project.
    Task,
}

impl EntityKind {
    /// Every supported entity kind.
    pub const ALL: [EntityKind; 2] = [EntityKind::Project, EntityKind::Task];

    /// Storage and display name (`project` / `task`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
        }
    }

    /// Table that owns entities of this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Task => "tasks",
        }
    }

    /// Prefix used when the entity store generates an id.
    pub(crate) fn id_prefix(self) -> &'static str {
        match self {
            Self::Project => "prj",
            Self::Task => "tsk",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "task" => Ok(Self::Task),
            other => Err(format!(
                "unknown entity kind '{other}' (expected 'project' or 'task')"
            )),
        }
    }
}

/// Reference to a graph node: an entity kind paired with its opaque id.
///
/// Two references are equal only when both kind and id match, so a project
/// and a task that happen to share an id are distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Kind of the referenced entity.
    pub kind: EntityKind,
    /// Id assigned by the owning domain.
    pub id: String,
}

impl EntityRef {
    /// Create a reference from its parts.
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Reference a project.
    pub fn project(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Project, id)
    }

    /// Reference a task.
    pub fn task(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Task, id)
    }
}

/// Formats as `kind:id`, the same syntax accepted by `FromStr`.
impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid entity reference '{s}' (expected 'project:ID' or 'task:ID')"))?;
        let kind: EntityKind = kind.parse()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("entity reference '{s}' has an empty id"));
        }
        Ok(Self::new(kind, id))
    }
}

/// A project or task row from the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Kind of entity.
    pub kind: EntityKind,
    /// Entity id.
    pub id: String,
    /// Human-readable name, used in cycle paths.
    pub name: String,
    /// Owning project (tasks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// When the entity was created.
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// The graph reference for this entity.
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id.clone())
    }
}

// ============================================================================
// Dependencies (graph edges)
// ============================================================================

/// Temporal relationship carried by a dependency.
///
/// The kind is descriptive metadata for schedulers; it has no effect on
/// cycle detection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DependencyKind {
    /// Successor starts after predecessor finishes.
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    /// Successor starts after predecessor starts.
    #[serde(rename = "SS")]
    StartToStart,
    /// Successor finishes after predecessor finishes.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Successor finishes after predecessor starts.
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyKind {
    /// Every dependency kind, in display order.
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::FinishToStart,
        DependencyKind::StartToStart,
        DependencyKind::FinishToFinish,
        DependencyKind::StartToFinish,
    ];

    /// Two-letter code (`FS`, `SS`, `FF`, `SF`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }

    /// Long form, e.g. `finish-to-start`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::FinishToStart => "finish-to-start",
            Self::StartToStart => "start-to-start",
            Self::FinishToFinish => "finish-to-finish",
            Self::StartToFinish => "start-to-finish",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str().eq_ignore_ascii_case(&normalized) || kind.description() == normalized
            })
            .ok_or_else(|| format!("unknown dependency kind '{s}' (expected FS, SS, FF or SF)"))
    }
}

/// A persisted dependency edge: `from` must happen before `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Unique, immutable edge id.
    pub id: DependencyId,
    /// Predecessor.
    pub from: EntityRef,
    /// Successor.
    pub to: EntityRef,
    /// Temporal relationship.
    pub kind: DependencyKind,
    /// Offset in days; negative values are leads.
    pub lag_days: i32,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation time, immutable.
    pub created_at: DateTime<Utc>,
}

impl Dependency {
    /// Whether `entity` is either endpoint of this edge.
    #[must_use]
    pub fn involves(&self, entity: &EntityRef) -> bool {
        &self.from == entity || &self.to == entity
    }
}

/// Request to create a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDependency {
    /// Predecessor.
    pub from: EntityRef,
    /// Successor.
    pub to: EntityRef,
    /// Temporal relationship.
    #[serde(default)]
    pub kind: DependencyKind,
    /// Offset in days (defaults to 0).
    #[serde(default)]
    pub lag_days: i32,
    /// Optional annotation.
    #[serde(default)]
    pub note: Option<String>,
}

impl NewDependency {
    /// Create a request with zero lag and no note.
    #[must_use]
    pub fn new(from: EntityRef, to: EntityRef, kind: DependencyKind) -> Self {
        Self {
            from,
            to,
            kind,
            lag_days: 0,
            note: None,
        }
    }

    /// Set the lag in days.
    #[must_use]
    pub fn with_lag(mut self, lag_days: i32) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Metadata changes for an existing dependency.
///
/// Endpoints are immutable; only these fields can change. `None` leaves a
/// field untouched. For `note`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyUpdate {
    /// New temporal relationship.
    #[serde(default)]
    pub kind: Option<DependencyKind>,
    /// New lag in days.
    #[serde(default)]
    pub lag_days: Option<i32>,
    /// New note, or `Some(None)` to clear.
    #[serde(default)]
    pub note: Option<Option<String>>,
}

impl DependencyUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.lag_days.is_none() && self.note.is_none()
    }
}

// ============================================================================
// Query results
// ============================================================================

/// Dependencies touching one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDependencies {
    /// Edges where the entity is the source.
    pub outgoing: Vec<Dependency>,
    /// Edges where the entity is the target.
    pub incoming: Vec<Dependency>,
    /// Union of both, ordered by creation time.
    pub all: Vec<Dependency>,
}

/// Aggregate counts over the whole edge set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStats {
    /// Number of edges.
    pub total: usize,
    /// Edge count per kind; every kind is present, zero when unused.
    pub by_kind: BTreeMap<DependencyKind, usize>,
}

impl DependencyStats {
    /// Count for one kind.
    #[must_use]
    pub fn count(&self, kind: DependencyKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// A cycle found by an integrity scan, in traversal order.
///
/// The closing edge runs from the last entity back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Entities on the cycle.
    pub entities: Vec<EntityRef>,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entity in &self.entities {
            write!(f, "{entity} → ")?;
        }
        match self.entities.first() {
            Some(first) => write!(f, "{first}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("project:alpha", EntityRef::project("alpha"))]
    #[case("task:t-1", EntityRef::task("t-1"))]
    #[case("Project:beta", EntityRef::project("beta"))]
    #[case("task: spaced ", EntityRef::task("spaced"))]
    fn entity_ref_parses(#[case] input: &str, #[case] expected: EntityRef) {
        assert_eq!(input.parse::<EntityRef>().unwrap(), expected);
    }

    #[rstest]
    #[case::no_separator("alpha")]
    #[case::unknown_kind("milestone:alpha")]
    #[case::empty_id("task:")]
    fn entity_ref_rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<EntityRef>().is_err());
    }

    #[test]
    fn entity_ref_display_round_trips_through_parse() {
        let entity = EntityRef::task("abc");
        assert_eq!(entity.to_string(), "task:abc");
        assert_eq!(entity.to_string().parse::<EntityRef>().unwrap(), entity);
    }

    #[test]
    fn same_id_different_kind_is_a_different_node() {
        assert_ne!(EntityRef::project("x"), EntityRef::task("x"));
    }

    #[rstest]
    #[case("FS", DependencyKind::FinishToStart)]
    #[case("ss", DependencyKind::StartToStart)]
    #[case("finish-to-finish", DependencyKind::FinishToFinish)]
    #[case(" SF ", DependencyKind::StartToFinish)]
    fn dependency_kind_parses(#[case] input: &str, #[case] expected: DependencyKind) {
        assert_eq!(input.parse::<DependencyKind>().unwrap(), expected);
    }

    #[test]
    fn dependency_kind_rejects_unknown() {
        let err = "XX".parse::<DependencyKind>().unwrap_err();
        assert!(err.contains("FS, SS, FF or SF"));
    }

    #[test]
    fn dependency_kind_serializes_as_code() {
        let json = serde_json::to_string(&DependencyKind::StartToFinish).unwrap();
        assert_eq!(json, "\"SF\"");
    }

    #[test]
    fn stats_serialize_kinds_as_map_keys() {
        let mut stats = DependencyStats::default();
        stats.by_kind.insert(DependencyKind::FinishToStart, 3);
        stats.total = 3;

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_kind"]["FS"], 3);
        assert_eq!(stats.count(DependencyKind::StartToStart), 0);
    }

    #[test]
    fn cycle_display_closes_the_loop() {
        let cycle = Cycle {
            entities: vec![EntityRef::project("a"), EntityRef::task("b")],
        };
        assert_eq!(cycle.to_string(), "project:a → task:b → project:a");
    }

    #[test]
    fn new_dependency_deserializes_with_defaults() {
        let request: NewDependency = serde_json::from_str(
            r#"{"from":{"kind":"project","id":"a"},"to":{"kind":"task","id":"b"}}"#,
        )
        .unwrap();

        assert_eq!(request.kind, DependencyKind::FinishToStart);
        assert_eq!(request.lag_days, 0);
        assert!(request.note.is_none());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(DependencyUpdate::default().is_empty());
        let update = DependencyUpdate {
            note: Some(None),
            ..DependencyUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
