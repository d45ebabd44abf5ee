//! Database schema definition.

/// Database schema definition.
pub(crate) const SCHEMA: &str = r"
-- Graph nodes. Ids are opaque text assigned by whoever creates the row.
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);

-- Graph edges. Endpoints are polymorphic (project or task), so there is no
-- foreign key: edges outlive deleted entities as orphans.
CREATE TABLE IF NOT EXISTS dependencies (
    id TEXT PRIMARY KEY,
    from_type TEXT NOT NULL CHECK (from_type IN ('project', 'task')),
    from_id TEXT NOT NULL,
    to_type TEXT NOT NULL CHECK (to_type IN ('project', 'task')),
    to_id TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'FS' CHECK (kind IN ('FS', 'SS', 'FF', 'SF')),
    lag_days INTEGER NOT NULL DEFAULT 0,
    note TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (from_type, from_id, to_type, to_id, kind),
    CHECK (from_type <> to_type OR from_id <> to_id)
);

CREATE INDEX IF NOT EXISTS idx_dependencies_from ON dependencies(from_type, from_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_to ON dependencies(to_type, to_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_created ON dependencies(created_at);
";
