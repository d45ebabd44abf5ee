//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use roadmap::{
    Dependency, DependencyKind, DependencyService, EntityKind, EntityRef, NewDependency, Store,
};

/// In-memory store seeded with projects `(id, name)`.
pub fn store_with_projects(projects: &[(&str, &str)]) -> Arc<Store> {
    let store = Store::open_in_memory().expect("should open in-memory store");
    for (id, name) in projects {
        store
            .insert_entity(EntityKind::Project, id, name, None)
            .expect("should insert project");
    }
    Arc::new(store)
}

/// Service over an in-memory store seeded with projects `(id, name)`.
pub fn service_with_projects(projects: &[(&str, &str)]) -> DependencyService {
    DependencyService::new(store_with_projects(projects))
}

/// Service seeded with `count` projects named `p1` .. `pN` (names `P1` .. `PN`).
pub fn numbered_service(count: usize) -> DependencyService {
    let store = Store::open_in_memory().expect("should open in-memory store");
    for i in 1..=count {
        store
            .insert_entity(EntityKind::Project, &format!("p{i}"), &format!("P{i}"), None)
            .expect("should insert project");
    }
    DependencyService::new(Arc::new(store))
}

/// `NewDependency` between two projects.
pub fn fs(from: &str, to: &str) -> NewDependency {
    NewDependency::new(
        EntityRef::project(from),
        EntityRef::project(to),
        DependencyKind::FinishToStart,
    )
}

/// Create a dependency that is expected to be accepted.
pub fn link(service: &DependencyService, request: NewDependency) -> Dependency {
    let description = format!("{} -> {}", request.from, request.to);
    service
        .create_dependency(request)
        .into_result()
        .unwrap_or_else(|errors| panic!("{description} should be accepted: {errors:?}"))
}

/// Link `p1 → p2 → … → pN` on a service from [`numbered_service`].
pub fn build_chain(service: &DependencyService, count: usize) {
    for i in 1..count {
        link(service, fs(&format!("p{i}"), &format!("p{}", i + 1)));
    }
}

/// Number of stored dependencies.
pub fn dependency_count(service: &DependencyService) -> usize {
    service
        .get_dependency_stats()
        .into_result()
        .expect("stats should succeed")
        .total
}

/// Run the roadmap binary in `dir`.
pub fn run_roadmap_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_roadmap"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute roadmap binary")
}

/// Run the binary and assert it succeeded, returning stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_roadmap_in_dir(dir, args);
    assert!(
        output.status.success(),
        "roadmap {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
