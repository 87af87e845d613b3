use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use fs_err as fs;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A directory receiving one JSON file per scraped item.
///
/// Directories are either created for the run or confirmed empty, never
/// written into when they hold anything already.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    count: usize,
}

impl OutputDir {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            if fs::read_dir(&path)?.next().is_some() {
                return Err(Error::OutputNotEmpty(path));
            }
        } else {
            fs::create_dir_all(&path)?;
        }
        Ok(Self { path, count: 0 })
    }

    /// The first free `root/YYYY-MM-DD/NNN` directory.
    pub fn dated(root: impl AsRef<Path>) -> Result<Self> {
        let day = root
            .as_ref()
            .join(Local::now().format("%Y-%m-%d").to_string());
        fs::create_dir_all(&day)?;
        let mut n = 1;
        loop {
            let path = day.join(format!("{n:03}"));
            match fs::create_dir(&path) {
                Ok(()) => return Ok(Self { path, count: 0 }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Items saved so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Writes `item` under a new random name. The file only appears once
    /// fully written.
    pub fn save(&mut self, item: &Value) -> Result<PathBuf> {
        let name = Uuid::new_v4();
        let partial = self.path.join(format!(".{name}.json.part"));
        let path = self.path.join(format!("{name}.json"));

        if let Err(e) = write_json(&partial, item) {
            fs::remove_file(&partial).ok();
            return Err(e);
        }
        fs::rename(&partial, &path)?;

        self.count += 1;
        Ok(path)
    }
}

fn write_json(path: &Path, item: &Value) -> Result<()> {
    let mut file = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut file, item)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn create_fresh_or_empty() {
        let tmp = tempfile::tempdir().unwrap();

        let fresh = tmp.path().join("a/b");
        let out = OutputDir::create(&fresh).unwrap();
        assert!(fresh.is_dir());
        assert_eq!(out.count(), 0);

        // existing but empty is fine
        OutputDir::create(&fresh).unwrap();
    }

    #[test]
    fn refuse_non_empty() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("leftover.json"), "{}").unwrap();
        assert!(matches!(
            OutputDir::create(tmp.path()),
            Err(Error::OutputNotEmpty(_))
        ));
    }

    #[test]
    fn dated_directories_increment() {
        let tmp = tempfile::tempdir().unwrap();
        let first = OutputDir::dated(tmp.path()).unwrap();
        let second = OutputDir::dated(tmp.path()).unwrap();
        assert!(first.path().ends_with("001"));
        assert!(second.path().ends_with("002"));
        assert_eq!(first.path().parent(), second.path().parent());
    }

    #[test]
    fn save_items() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = OutputDir::create(tmp.path().join("out")).unwrap();

        let path = out.save(&serde_json::json!({"name": "a"})).unwrap();
        out.save(&serde_json::json!([1, 2])).unwrap();
        assert_eq!(out.count(), 2);

        let files = json_files(out.path());
        assert_eq!(files.len(), 2);
        assert!(files
            .iter()
            .all(|f| f.extension().and_then(|e| e.to_str()) == Some("json")));

        let saved: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(saved["name"], "a");
    }
}
