use std::path::{Path, PathBuf};

/// 最近開啟檔案的有界清單，最新的在最前面。 /
/// Bounded list of recently opened files, newest first.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    capacity: usize,
    entries: Vec<PathBuf>,
}

impl RecentFiles {
    /// 建立指定容量的空清單。 / Creates an empty list with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// 從持久化資料還原清單，超出容量者捨棄。 /
    /// Restores a list from persisted entries, dropping any overflow.
    pub fn with_entries(capacity: usize, entries: Vec<PathBuf>) -> Self {
        let capacity = capacity.max(1);
        let mut list = Self { capacity, entries };
        list.entries.truncate(capacity);
        list
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 調整容量並修剪多出的項目。 / Adjusts capacity and trims the excess.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    /// 新增或提升路徑到清單最前端。 / Inserts or promotes a path to the front.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.entries.retain(|existing| existing != &path);
        self.entries.insert(0, path);
        self.entries.truncate(self.capacity);
    }

    /// 移除指定路徑；有移除時回傳 `true`。 / Removes the path, returning `true` when present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|existing| existing.as_path() != path);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 最近一次開啟的檔案。 / The most recently opened file.
    pub fn most_recent(&self) -> Option<&Path> {
        self.entries.first().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_promotes_and_evicts() {
        let mut recent = RecentFiles::new(3);
        recent.add("a.json");
        recent.add("b.json");
        recent.add("c.json");
        recent.add("a.json");

        let collected: Vec<_> = recent.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(collected, vec!["a.json", "c.json", "b.json"]);

        recent.add("d.json");
        let collected: Vec<_> = recent.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(collected, vec!["d.json", "a.json", "c.json"]);
    }

    #[test]
    fn set_capacity_trims() {
        let mut recent = RecentFiles::new(4);
        for name in ["a", "b", "c", "d"] {
            recent.add(name);
        }
        recent.set_capacity(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.most_recent().unwrap().to_str().unwrap(), "d");
    }

    #[test]
    fn remove_and_clear() {
        let mut recent = RecentFiles::new(3);
        recent.add("x");
        recent.add("y");
        assert!(recent.remove(Path::new("x")));
        assert!(!recent.remove(Path::new("x")));
        recent.clear();
        assert!(recent.is_empty());
    }

    #[test]
    fn with_entries_enforces_capacity() {
        let entries = vec!["a", "b", "c"].into_iter().map(PathBuf::from).collect();
        let recent = RecentFiles::with_entries(2, entries);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.capacity(), 2);
    }
}
