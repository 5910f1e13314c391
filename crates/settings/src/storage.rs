use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RecentFiles;

#[derive(Debug, Serialize, Deserialize)]
struct RecentFilesRecord {
    capacity: usize,
    entries: Vec<PathBuf>,
}

/// 最近檔案清單的 JSON 持久化。 / JSON-backed persistence for the recent-files history.
#[derive(Debug)]
pub struct RecentFilesStore {
    path: PathBuf,
    history: RecentFiles,
}

impl RecentFilesStore {
    /// 載入清單；檔案不存在時回傳空清單。 /
    /// Loads the history; a missing file yields an empty list.
    pub fn load(path: impl AsRef<Path>, default_capacity: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                history: RecentFiles::new(default_capacity),
            });
        }

        let contents = fs::read_to_string(&path)?;
        let record: RecentFilesRecord = serde_json::from_str(&contents)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(Self {
            path,
            history: RecentFiles::with_entries(record.capacity, record.entries),
        })
    }

    pub fn history(&self) -> &RecentFiles {
        &self.history
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.history.iter()
    }

    /// 新增項目並立即寫回。 / Adds an entry and persists immediately.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> io::Result<()> {
        self.history.add(path);
        self.persist()
    }

    /// 移除項目；有變更時寫回。 / Removes an entry, persisting when changed.
    pub fn remove(&mut self, path: &Path) -> io::Result<bool> {
        let removed = self.history.remove(path);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.history.clear();
        self.persist()
    }

    pub fn set_capacity(&mut self, capacity: usize) -> io::Result<()> {
        self.history.set_capacity(capacity);
        self.persist()
    }

    fn persist(&self) -> io::Result<()> {
        let record = RecentFilesRecord {
            capacity: self.history.capacity(),
            entries: self.history.iter().cloned().collect(),
        };
        let payload = serde_json::to_string_pretty(&record)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        write_atomic(&self.path, payload.as_bytes())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_round_trips_entries_and_capacity() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("recent.json");

        {
            let mut store = RecentFilesStore::load(&store_path, 5).unwrap();
            assert!(store.history().is_empty());
            store.add(dir.path().join("alpha.json")).unwrap();
            store.add(dir.path().join("beta.json")).unwrap();
            store.set_capacity(1).unwrap();
        }

        let store = RecentFilesStore::load(&store_path, 3).unwrap();
        let names: Vec<_> = store
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["beta.json"]);
        assert_eq!(store.history().capacity(), 1);
    }

    #[test]
    fn remove_persists_only_on_change() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("recent.json");

        let mut store = RecentFilesStore::load(&store_path, 3).unwrap();
        store.add("one.txt").unwrap();
        assert!(store.remove(Path::new("one.txt")).unwrap());
        assert!(!store.remove(Path::new("one.txt")).unwrap());

        let reloaded = RecentFilesStore::load(&store_path, 3).unwrap();
        assert!(reloaded.history().is_empty());
    }
}
