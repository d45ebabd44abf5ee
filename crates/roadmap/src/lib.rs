//! # Roadmap: Cycle-Safe Dependency Graph for Projects and Tasks
//!
//! Roadmap stores directed, typed dependencies between projects and tasks in
//! `SQLite` and refuses any edge that would make the schedule impossible.
//!
//! ## Guarantees
//!
//! After every successful mutation the stored graph has:
//! - **No self-loops** - an entity never depends on itself
//! - **No duplicates** - at most one edge per `(from, to, kind)`
//! - **No cycles** - checked transitively, with parallel edges of different
//!   kinds counted as one structural edge
//! - **Live endpoints at creation** - both ends are re-checked on every create
//!
//! Edges whose endpoint is later deleted stay behind as orphans until removed
//! explicitly, and never confuse cycle detection.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use roadmap::{DependencyKind, DependencyService, EntityKind, EntityRef, NewDependency, Store};
//!
//! let store = Arc::new(Store::open_in_memory()?);
//! store.insert_entity(EntityKind::Project, "alpha", "Alpha", None)?;
//! store.insert_entity(EntityKind::Project, "beta", "Beta", None)?;
//!
//! let service = DependencyService::new(Arc::clone(&store));
//! let alpha = EntityRef::project("alpha");
//! let beta = EntityRef::project("beta");
//!
//! let created = service.create_dependency(NewDependency::new(
//!     alpha.clone(),
//!     beta.clone(),
//!     DependencyKind::FinishToStart,
//! ));
//! assert!(created.is_success());
//!
//! // Closing the loop is refused, with the path in the message
//! let rejected = service.create_dependency(NewDependency::new(
//!     beta,
//!     alpha,
//!     DependencyKind::FinishToStart,
//! ));
//! assert!(!rejected.is_success());
//! assert!(rejected.errors[0].contains("Beta → Alpha → Beta"));
//! # Ok::<(), roadmap::Error>(())
//! ```

pub mod config;
mod db;
mod error;
mod graph;
pub mod id_generation;
mod lookup;
mod response;
mod service;
mod types;

pub use db::Store;
pub use error::{DependencyError, Endpoint, Error, ErrorKind, Result};
pub use graph::DependencyGraph;
pub use lookup::{EntityLookup, TableLookup};
pub use response::Response;
pub use service::{DEPENDENCY_ID_PREFIX, DependencyService};
pub use types::{
    Cycle, Dependency, DependencyId, DependencyKind, DependencyStats, DependencyUpdate, Entity,
    EntityDependencies, EntityKind, EntityRef, NewDependency,
};
