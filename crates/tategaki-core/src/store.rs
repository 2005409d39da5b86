//! Unified project store
//!
//! `Store` owns one of two backends, chosen once at open time: the
//! primary SQLite database, or, when that cannot be initialized in the
//! host environment, the flat-file fallback. The choice is part of the
//! handle, fixed at construction; after `open` there is no further
//! backend branching anywhere in the crate.
//!
//! ## Failure policy
//!
//! Opening never fails: the fallback backend has no open-time failure
//! mode. Individual read/write failures after open are swallowed here and
//! presented as absence (`get` returns `None`, `list` returns empty,
//! `put`/`delete` become logged no-ops). Callers treat "not found" and
//! "store unreadable" identically; nothing above this layer special-cases
//! storage errors.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::Project;
use crate::storage::{FlatFileBackend, SqliteBackend};

/// Which backend a store ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Primary structured store
    Sqlite,
    /// Whole-collection blob fallback
    FlatFile,
}

enum Backend {
    Sqlite(SqliteBackend),
    FlatFile(FlatFileBackend),
}

/// Project persistence with a backend fixed at construction
pub struct Store {
    backend: Backend,
}

impl Store {
    /// Open the store, selecting a backend
    ///
    /// Tries the primary SQLite backend first; if it cannot be
    /// initialized the store permanently switches to the flat-file
    /// fallback for this handle's lifetime. Logged once, never fatal.
    pub fn open(config: &Config) -> Self {
        let backend = match SqliteBackend::open(&config.sqlite_path()) {
            Ok(backend) => Backend::Sqlite(backend),
            Err(error) => {
                warn!(%error, "primary store unavailable, using flat-file fallback");
                Backend::FlatFile(FlatFileBackend::new(config.fallback_path()))
            }
        };
        Self { backend }
    }

    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            Backend::Sqlite(_) => BackendKind::Sqlite,
            Backend::FlatFile(_) => BackendKind::FlatFile,
        }
    }

    /// All projects; an unreadable store lists as empty
    pub fn list(&self) -> Vec<Project> {
        match &self.backend {
            Backend::Sqlite(backend) => backend.list().unwrap_or_else(|error| {
                warn!(%error, "project listing failed");
                Vec::new()
            }),
            Backend::FlatFile(backend) => backend.list(),
        }
    }

    /// A project by id; "missing" and "unreadable" are the same answer
    pub fn get(&self, id: Uuid) -> Option<Project> {
        match &self.backend {
            Backend::Sqlite(backend) => match backend.get(id) {
                Ok(project) => project,
                Err(error) => {
                    warn!(%id, %error, "project read failed");
                    None
                }
            },
            Backend::FlatFile(backend) => backend.get(id),
        }
    }

    /// Stamp `updatedAt` and upsert
    ///
    /// Returns the stamped record. Two uncoordinated concurrent puts for
    /// the same id resolve to whichever write commits last; a put racing a
    /// delete on the same id has no defined final state.
    pub fn put(&mut self, project: &Project) -> Project {
        let mut stamped = project.clone();
        stamped.updated_at = chrono::Utc::now();
        let result = match &self.backend {
            Backend::Sqlite(backend) => backend.put(&stamped),
            Backend::FlatFile(backend) => backend.put(&stamped),
        };
        match result {
            Ok(()) => debug!(id = %stamped.id, "project saved"),
            Err(error) => warn!(id = %stamped.id, %error, "project save failed"),
        }
        stamped
    }

    /// Remove a project record (chapters are embedded, so they go with it)
    pub fn delete(&mut self, id: Uuid) {
        let result = match &self.backend {
            Backend::Sqlite(backend) => backend.delete(id),
            Backend::FlatFile(backend) => backend.delete(id),
        };
        if let Err(error) = result {
            warn!(%id, %error, "project delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> Store {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
        };
        Store::open(&config)
    }

    /// A config whose sqlite path is unusable, forcing the fallback
    fn fallback_config(temp_dir: &TempDir) -> Config {
        std::fs::create_dir(temp_dir.path().join("projects.db")).unwrap();
        Config {
            data_dir: temp_dir.path().to_path_buf(),
        }
    }

    #[test]
    fn test_opens_on_primary_backend() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert_eq!(store.backend_kind(), BackendKind::Sqlite);
    }

    #[test]
    fn test_put_then_get_advances_updated_at() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let project = Project::new("作品");
        std::thread::sleep(std::time::Duration::from_millis(10));
        let stamped = store.put(&project);
        assert!(stamped.updated_at > project.updated_at);

        let loaded = store.get(project.id).unwrap();
        assert_eq!(loaded.updated_at, stamped.updated_at);
        assert_eq!(loaded.title, project.title);
        assert_eq!(loaded.created_at, project.created_at);
        assert_eq!(loaded.chapters, project.chapters);
    }

    #[test]
    fn test_delete_then_get_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let project = Project::new("作品");
        store.put(&project);
        store.delete(project.id);
        assert!(store.get(project.id).is_none());
    }

    #[test]
    fn test_falls_back_when_primary_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let config = fallback_config(&temp_dir);

        let store = Store::open(&config);
        assert_eq!(store.backend_kind(), BackendKind::FlatFile);
    }

    #[test]
    fn test_fallback_store_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config = fallback_config(&temp_dir);
        let mut store = Store::open(&config);

        let project = Project::new("退避作品");
        store.put(&project);
        assert_eq!(store.get(project.id).unwrap().title, "退避作品");
        assert_eq!(store.list().len(), 1);
        assert!(config.fallback_path().exists());

        store.delete(project.id);
        assert!(store.get(project.id).is_none());
    }

    #[test]
    fn test_direction_normalizes_through_the_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let mut project = Project::new("作品");
        store.put(&project);

        // Corrupt the persisted direction the way an older build might have
        let mut json = serde_json::to_value(&project).unwrap();
        json["settings"]["direction"] = "horizontal-tb".into();
        project = serde_json::from_value(json).unwrap();
        store.put(&project);

        let loaded = store.get(project.id).unwrap();
        assert_eq!(
            loaded.settings.direction,
            crate::models::Direction::VerticalRl
        );
    }

    #[test]
    fn test_missing_project_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(store.get(Uuid::new_v4()).is_none());
        assert!(store.list().is_empty());
    }
}
