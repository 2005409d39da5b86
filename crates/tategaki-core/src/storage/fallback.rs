//! Flat-file fallback backend
//!
//! Keeps the entire project collection as one JSON array in a single file.
//! Every mutation is a read-modify-write of the whole blob, so cost grows
//! with collection size; the trade is that this backend has no open-time
//! failure mode at all. Writes are atomic (temp file + rename) so the blob
//! is never left half-written.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use crate::models::Project;

/// Whole-collection-in-one-blob project storage
pub struct FlatFileBackend {
    path: PathBuf,
}

impl FlatFileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the whole collection
    ///
    /// A missing or unreadable blob is an empty collection, never an
    /// error: the caller cannot distinguish the two and should not try.
    fn load_all(&self) -> Vec<Project> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), %error, "fallback blob unreadable");
                }
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(projects) => projects,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "fallback blob unparseable");
                Vec::new()
            }
        }
    }

    fn store_all(&self, projects: &[Project]) -> StorageResult<()> {
        let body = serde_json::to_string(projects)?;
        atomic_write(&self.path, body.as_bytes())
    }

    pub fn list(&self) -> Vec<Project> {
        self.load_all()
    }

    pub fn get(&self, id: Uuid) -> Option<Project> {
        self.load_all().into_iter().find(|p| p.id == id)
    }

    /// Upsert by id, rewriting the whole blob
    pub fn put(&self, project: &Project) -> StorageResult<()> {
        let mut projects = self.load_all();
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        self.store_all(&projects)
    }

    pub fn delete(&self, id: Uuid) -> StorageResult<()> {
        let mut projects = self.load_all();
        projects.retain(|p| p.id != id);
        self.store_all(&projects)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(|source| StorageError::WriteError {
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(data)
        .and_then(|()| file.sync_all())
        .map_err(|source| StorageError::WriteError {
            path: temp_path.clone(),
            source,
        })?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path,
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend(temp_dir: &TempDir) -> FlatFileBackend {
        FlatFileBackend::new(temp_dir.path().join("projects.json"))
    }

    #[test]
    fn test_missing_blob_is_empty_collection() {
        let temp_dir = TempDir::new().unwrap();
        assert!(backend(&temp_dir).list().is_empty());
    }

    #[test]
    fn test_put_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);

        let project = Project::new("掌編");
        backend.put(&project).unwrap();
        assert_eq!(backend.get(project.id).unwrap(), project);
    }

    #[test]
    fn test_put_rewrites_whole_blob() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);

        let first = Project::new("一");
        let second = Project::new("二");
        backend.put(&first).unwrap();
        backend.put(&second).unwrap();

        let raw = fs::read_to_string(temp_dir.path().join("projects.json")).unwrap();
        let parsed: Vec<Project> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);

        let mut project = Project::new("初稿");
        backend.put(&project).unwrap();
        project.title = "決定稿".to_string();
        backend.put(&project).unwrap();

        let all = backend.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "決定稿");
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);

        let keep = Project::new("残す");
        let drop = Project::new("消す");
        backend.put(&keep).unwrap();
        backend.put(&drop).unwrap();

        backend.delete(drop.id).unwrap();
        assert!(backend.get(drop.id).is_none());
        assert_eq!(backend.list().len(), 1);
    }

    #[test]
    fn test_corrupt_blob_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("projects.json");
        fs::write(&path, "{{not json").unwrap();

        let backend = FlatFileBackend::new(path);
        assert!(backend.list().is_empty());
        // and a subsequent put starts a fresh collection
        backend.put(&Project::new("再出発")).unwrap();
        assert_eq!(backend.list().len(), 1);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);
        backend.put(&Project::new("作品")).unwrap();
        assert!(!temp_dir.path().join("projects.tmp").exists());
    }
}
