//! CLI command implementations.

pub mod dep;
pub mod display;
pub mod entity;
pub mod init;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use roadmap::{DependencyService, Store, config};

/// Locate the project from `directory` and open its store.
fn open_store(directory: &Path) -> Result<Arc<Store>> {
    let (root, _config, store) = config::open_project(directory)
        .with_context(|| format!("failed to open roadmap project from {}", directory.display()))?;
    tracing::debug!(root = %root.display(), "Opened roadmap project");
    Ok(Arc::new(store))
}

/// Open the dependency service for the project containing `directory`.
fn open_service(directory: &Path) -> Result<DependencyService> {
    Ok(DependencyService::new(open_store(directory)?))
}
