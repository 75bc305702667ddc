use advisor_core::{Error, Result, SelectionStore};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::env;

/// `ADVISOR_SELECTION_FILE`, else `<data dir>/advisor/selection.json`.
pub fn default_selection_path() -> PathBuf {
    env("ADVISOR_SELECTION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("advisor")
                .join("selection.json")
        })
}

/// A JSON object of string keys to string values, rewritten atomically on every `set`.
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(s) => serde_json::from_str(&s)
                .map_err(|e| Error::Store(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(Error::Store(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_all(&self, m: &BTreeMap<String, String>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| Error::Store(e.to_string()))?;
        let bytes = serde_json::to_vec_pretty(m).map_err(|e| Error::Store(e.to_string()))?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::Store(e.to_string()))?;
        tmp.write_all(&bytes)
            .map_err(|e| Error::Store(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}

impl SelectionStore for FileSelectionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut m = self.read_all()?;
        m.insert(key.to_string(), value.to_string());
        self.write_all(&m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{PersistedSelection, SELECTION_KEY};

    #[test]
    fn missing_file_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(tmp.path().join("nope.json"));
        assert_eq!(store.get(SELECTION_KEY).unwrap(), None);
    }

    #[test]
    fn selection_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("selection.json");

        let mut sel = PersistedSelection::load(FileSelectionStore::new(path.clone())).unwrap();
        sel.toggle(3).unwrap();
        sel.toggle(8).unwrap();

        let again = PersistedSelection::load(FileSelectionStore::new(path.clone())).unwrap();
        assert_eq!(again.state().ids(), &[3, 8]);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[SELECTION_KEY], "[3,8]");
    }

    #[test]
    fn other_keys_are_preserved() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(tmp.path().join("s.json"));
        store.set("theme", "dark").unwrap();
        store.set(SELECTION_KEY, "[1]").unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("s.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSelectionStore::new(path);
        assert!(matches!(store.get(SELECTION_KEY), Err(Error::Store(_))));
    }
}
