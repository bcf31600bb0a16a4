use crate::error::{Error, Result};
use crate::model::{Action, HistoryEntry, HistoryKind};
use crate::sources::Source;
use directories::ProjectDirs;
use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ordered log of previously opened files and run executables.
///
/// Labels are unique; recording a known label moves it to the end with its
/// new path. When backed by a file, every change is written through.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    path: Option<PathBuf>,
    capacity: usize,
}

pub fn default_history_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "menudo", "menudo").map(|dirs| dirs.data_dir().join("history.json"))
}

impl History {
    /// A store that never touches disk. `capacity` of 0 means unbounded.
    pub fn in_memory(capacity: usize) -> Self {
        Self { entries: Vec::new(), path: None, capacity }
    }

    /// Load the store at `path`. A missing or unreadable file starts empty; one
    /// that fails to parse is moved aside to `<path>.bak` first.
    pub fn load(path: PathBuf, capacity: usize) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    let backup = backup_path(&path);
                    warn!("Ignoring unreadable history {:?}: {}, moving it to {:?}", path, e, backup);
                    if let Err(e) = fs::rename(&path, &backup) {
                        warn!("Could not move {:?} aside: {}", path, e);
                    }
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        debug!("History: loaded {} entries from {:?}", entries.len(), path);
        let mut history = Self { entries, path: Some(path), capacity };
        history.truncate();
        history
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn get(&self, label: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn add_file(&mut self, label: &str, path: &Path) -> Result<()> {
        self.record(HistoryEntry::file(label, path))
    }

    pub fn add_executable(&mut self, label: &str) -> Result<()> {
        self.record(HistoryEntry::executable(label))
    }

    fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.retain(|e| e.label != entry.label);
        self.entries.push(entry);
        self.truncate();
        self.save()
    }

    /// The action that re-runs `label`: files go to the opener, executables to the shell.
    pub fn action_for(&self, label: &str) -> Option<Action> {
        self.get(label).map(|entry| match entry.kind {
            HistoryKind::File => Action::Open(entry.path.clone()),
            HistoryKind::Executable => Action::Shell(entry.path.to_string_lossy().into_owned()),
        })
    }

    fn truncate(&mut self) {
        if self.capacity > 0 && self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let err = |message: String| Error::History { path: path.clone(), message };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| err(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| err(e.to_string()))?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries).map_err(|e| err(e.to_string()))?;
        tmp.flush().map_err(|e| err(e.to_string()))?;
        tmp.persist(path).map_err(|e| err(e.error.to_string()))?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

impl Source for History {
    fn items(&self) -> Vec<String> {
        self.labels()
    }
}
