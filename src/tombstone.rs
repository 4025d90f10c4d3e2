use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::debug;

use crate::error::StoreError;

pub(crate) const TOMBSTONE_FILE: &str = "deleted-posts.json";

/// The soft-delete list: filenames hidden from every read path while the
/// files themselves stay on disk.
#[derive(Debug)]
pub(crate) struct Tombstones {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Tombstones {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        load_list(&self.path)
    }

    /// Returns false when `filename` was already listed.
    pub fn add(&self, filename: &str) -> Result<bool, StoreError> {
        self.update(|list| {
            if list.iter().any(|f| f == filename) {
                return false;
            }
            list.push(filename.to_string());
            true
        })
    }

    /// Returns false when `filename` was not listed.
    pub fn remove(&self, filename: &str) -> Result<bool, StoreError> {
        self.update(|list| {
            let before = list.len();
            list.retain(|f| f != filename);
            list.len() != before
        })
    }

    fn update(&self, f: impl FnOnce(&mut Vec<String>) -> bool) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        // a list that fails to parse is an error here, never an empty list to overwrite
        let mut list = load_list(&self.path)?;
        let changed = f(&mut list);
        if changed {
            save_list(&self.path, &list)?;
            debug!("{} now lists {} posts", self.path.display(), list.len());
        }
        Ok(changed)
    }
}

fn load_list(path: &Path) -> Result<Vec<String>, StoreError> {
    let fd = match File::open(path) {
        Ok(fd) => fd,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("deleted posts list ({path:?}) does not exist, treating as empty");
            return Ok(vec![]);
        }
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(fd);
    Ok(serde_json::from_reader(reader)?)
}

fn save_list(path: &Path, list: &[String]) -> Result<(), StoreError> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    {
        let fd = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut writer = BufWriter::new(fd);
        serde_json::to_writer_pretty(&mut writer, list)?;
        writer.flush()?;
    }
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tombstones(dir: &tempfile::TempDir) -> Tombstones {
        Tombstones::new(dir.path().join(TOMBSTONE_FILE))
    }

    #[test]
    fn missing_file_is_an_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tombstones(&dir).list().unwrap().is_empty());
    }

    #[test]
    fn add_is_idempotent_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let t = tombstones(&dir);
        assert!(t.add("a.md").unwrap());
        assert!(!t.add("a.md").unwrap());
        assert!(t.add("b.md").unwrap());

        let reopened = tombstones(&dir);
        assert_eq!(reopened.list().unwrap(), vec!["a.md", "b.md"]);

        let raw = std::fs::read_to_string(dir.path().join(TOMBSTONE_FILE)).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn remove_drops_entry() {
        let dir = tempfile::tempdir().unwrap();
        let t = tombstones(&dir);
        t.add("a.md").unwrap();
        assert!(t.remove("a.md").unwrap());
        assert!(!t.remove("a.md").unwrap());
        assert!(t.list().unwrap().is_empty());
    }

    #[test]
    fn malformed_list_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOMBSTONE_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let t = tombstones(&dir);
        assert!(matches!(t.add("a.md"), Err(StoreError::Tombstones(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }
}
