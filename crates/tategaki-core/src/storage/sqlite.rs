//! Primary structured backend
//!
//! One SQLite table keyed by project id, with the full record serialized
//! into a JSON body column. The schema is created on first open; a failure
//! to open here is what sends the store to the flat-file fallback.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use crate::models::Project;

/// SQLite-backed project collection
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database and ensure the schema exists
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    /// All projects, most recently updated first
    ///
    /// Rows whose body no longer parses are skipped rather than failing
    /// the whole listing.
    pub fn list(&self) -> StorageResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM projects ORDER BY updated_at DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut projects = Vec::new();
        for row in rows {
            let (id, body) = row?;
            match serde_json::from_str::<Project>(&body) {
                Ok(project) => projects.push(project),
                Err(error) => warn!(%id, %error, "skipping unreadable project record"),
            }
        }
        Ok(projects)
    }

    pub fn get(&self, id: Uuid) -> StorageResult<Option<Project>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM projects WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Upsert by id
    pub fn put(&self, project: &Project) -> StorageResult<()> {
        let body = serde_json::to_string(project)?;
        self.conn.execute(
            "INSERT INTO projects (id, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body,
                                           updated_at = excluded.updated_at",
            params![
                project.id.to_string(),
                body,
                project.updated_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_backend(temp_dir: &TempDir) -> SqliteBackend {
        SqliteBackend::open(&temp_dir.path().join("projects.db")).unwrap()
    }

    #[test]
    fn test_put_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&temp_dir);

        let project = Project::new("短編");
        backend.put(&project).unwrap();

        let loaded = backend.get(project.id).unwrap().unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_get_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&temp_dir);
        assert!(backend.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_put_upserts() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&temp_dir);

        let mut project = Project::new("初稿");
        backend.put(&project).unwrap();
        project.title = "改稿".to_string();
        backend.put(&project).unwrap();

        assert_eq!(backend.list().unwrap().len(), 1);
        assert_eq!(backend.get(project.id).unwrap().unwrap().title, "改稿");
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&temp_dir);

        let project = Project::new("消える");
        backend.put(&project).unwrap();
        backend.delete(project.id).unwrap();
        assert!(backend.get(project.id).unwrap().is_none());
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_orders_by_updated_at_desc() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&temp_dir);

        let mut older = Project::new("古い");
        let mut newer = Project::new("新しい");
        older.updated_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        newer.updated_at = chrono::Utc::now();
        backend.put(&older).unwrap();
        backend.put(&newer).unwrap();

        let titles: Vec<String> = backend
            .list()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["新しい", "古い"]);
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("projects.db");

        let project = Project::new("残る");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.put(&project).unwrap();
        }
        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.get(project.id).unwrap().unwrap().title, "残る");
    }

    #[test]
    fn test_open_fails_on_unusable_path() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the database file should be
        let path = temp_dir.path().join("projects.db");
        std::fs::create_dir(&path).unwrap();
        assert!(SqliteBackend::open(&path).is_err());
    }
}
