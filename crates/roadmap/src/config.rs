//! Project configuration and the `.roadmap/` directory.
//!
//! A roadmap project is any directory containing `.roadmap/config.yaml`.
//! Commands locate it by walking up from the working directory, the same way
//! `git` finds `.git/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::error::{Error, Result};

/// Name of the roadmap directory
pub const ROADMAP_DIR_NAME: &str = ".roadmap";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the database file created by `init`
pub const DEFAULT_DATABASE_NAME: &str = "roadmap.db";

/// Name of the gitignore file within .roadmap
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// How long a writer waits for another connection's lock by default
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Maximum directory depth to traverse when searching for the project root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct RoadmapConfig {
    /// Database path, relative to the project root
    pub database: String,

    /// Milliseconds a write waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl RoadmapConfig {
    /// Create a configuration pointing at `database`
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        validate_database(&config.database)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Absolute database path for a project rooted at `root`.
    #[must_use]
    pub fn database_path(&self, root: &Path) -> PathBuf {
        root.join(&self.database)
    }

    /// Busy timeout as a `Duration`.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self::new(format!("{ROADMAP_DIR_NAME}/{DEFAULT_DATABASE_NAME}"))
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created roadmap directory
    pub roadmap_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created database
    pub database_file: PathBuf,
}

fn validate_database(database: &str) -> Result<()> {
    if database.trim().is_empty() {
        return Err(Error::Config("database path cannot be empty".to_string()));
    }
    Ok(())
}

/// Initialize a new roadmap project in `base_dir`.
///
/// Creates `.roadmap/`, writes `config.yaml` and creates the database with
/// its schema.
///
/// # Errors
///
/// Returns an error if:
/// - The `.roadmap/` directory already exists
/// - The database path is empty
/// - File system or database operations fail
pub fn init(base_dir: &Path, database: Option<&str>) -> Result<InitResult> {
    let config = match database.map(str::trim) {
        Some(path) => {
            validate_database(path)?;
            RoadmapConfig::new(path)
        }
        None => RoadmapConfig::default(),
    };

    let roadmap_dir = base_dir.join(ROADMAP_DIR_NAME);
    if roadmap_dir.exists() {
        return Err(Error::Config(format!(
            "Roadmap is already initialized in this directory. Found existing '{ROADMAP_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&roadmap_dir)?;

    let config_file = roadmap_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file)?;

    // SQLite sidecars are transient and never belong in version control
    let gitignore_file = roadmap_dir.join(GITIGNORE_FILE_NAME);
    fs::write(&gitignore_file, "*.db-wal\n*.db-shm\n")?;

    let database_file = config.database_path(base_dir);
    Store::open(&database_file, config.busy_timeout())?;

    tracing::info!(
        root = %base_dir.display(),
        database = %database_file.display(),
        "Initialized roadmap project"
    );

    Ok(InitResult {
        roadmap_dir,
        config_file,
        database_file,
    })
}

/// Check if a directory has been initialized.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(ROADMAP_DIR_NAME).exists()
}

/// Find the project root by searching up the directory tree.
///
/// Returns the directory containing `.roadmap/`, or `None` when the
/// filesystem root or the traversal limit is reached first.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(ROADMAP_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

/// Locate the project from `start_dir` and open its store.
///
/// # Errors
///
/// Returns `Error::Config` when no project is found, and propagates config
/// and database errors.
pub fn open_project(start_dir: &Path) -> Result<(PathBuf, RoadmapConfig, Store)> {
    let root = find_root(start_dir).ok_or_else(|| {
        Error::Config(format!(
            "not a roadmap project (or any parent up to {MAX_TRAVERSAL_DEPTH} levels): {}. Run 'roadmap init' first",
            start_dir.display()
        ))
    })?;

    let config = RoadmapConfig::load(&root.join(ROADMAP_DIR_NAME).join(CONFIG_FILE_NAME))?;
    let store = Store::open(&config.database_path(&root), config.busy_timeout())?;

    Ok((root, config, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    // ========== RoadmapConfig Tests ==========

    #[test]
    fn config_default_points_inside_roadmap_dir() {
        let config = RoadmapConfig::default();
        assert_eq!(config.database, ".roadmap/roadmap.db");
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut original = RoadmapConfig::new("data/plan.db");
        original.busy_timeout_ms = 250;
        original.save(&config_path).unwrap();

        let loaded = RoadmapConfig::load(&config_path).unwrap();
        assert_eq!(original, loaded);
        assert_eq!(loaded.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn config_yaml_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        RoadmapConfig::default().save(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("database: .roadmap/roadmap.db"));
        assert!(content.contains("busy-timeout-ms: 5000"));
    }

    #[test]
    fn config_busy_timeout_is_optional() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "database: plan.db\n").unwrap();

        let loaded = RoadmapConfig::load(&config_path).unwrap();
        assert_eq!(loaded.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[rstest]
    #[case::empty("database: ''\n")]
    #[case::blank("database: '   '\n")]
    #[case::not_yaml_mapping("- just\n- a list\n")]
    fn config_load_rejects_invalid(#[case] content: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();

        let err = RoadmapConfig::load(&config_path).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    }

    // ========== Init Tests ==========

    #[test]
    fn init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).unwrap();

        assert!(result.roadmap_dir.exists());
        assert!(result.config_file.exists());
        assert!(result.database_file.exists());
        assert!(result.roadmap_dir.join(GITIGNORE_FILE_NAME).exists());
    }

    #[test]
    fn init_with_custom_database() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("plans/main.db")).unwrap();

        assert_eq!(result.database_file, temp_dir.path().join("plans/main.db"));
        let config = RoadmapConfig::load(&result.config_file).unwrap();
        assert_eq!(config.database, "plans/main.db");
    }

    #[test]
    fn init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path(), None).unwrap();

        let err_msg = init(temp_dir.path(), None)
            .unwrap_err()
            .to_string()
            .to_lowercase();
        assert!(err_msg.contains("already initialized"));
    }

    #[test]
    fn init_fails_with_empty_database() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some("  "));
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!is_initialized(temp_dir.path()));
    }

    // ========== Root Discovery Tests ==========

    #[test]
    fn find_root_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(ROADMAP_DIR_NAME)).unwrap();

        assert_eq!(
            find_root(temp_dir.path()),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn find_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(ROADMAP_DIR_NAME)).unwrap();

        let sub_dir = temp_dir.path().join("sub").join("nested");
        fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(find_root(&sub_dir), Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn find_root_not_found() {
        let temp_dir = TempDir::new().unwrap();

        assert!(find_root(temp_dir.path()).is_none());
    }

    #[test]
    fn open_project_from_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).unwrap();
        let nested = temp_dir.path().join("docs");
        fs::create_dir(&nested).unwrap();

        let (root, config, _store) = open_project(&nested).unwrap();
        assert_eq!(root, temp_dir.path());
        assert_eq!(config, RoadmapConfig::default());
    }

    #[test]
    fn open_project_outside_a_project_fails() {
        let temp_dir = TempDir::new().unwrap();

        let err = open_project(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("roadmap init"));
    }
}
