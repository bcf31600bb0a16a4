use crate::error::{Error, Result};
use crate::executor::{Launcher, is_executable};
use crate::matcher::TOPLEVEL;
use crate::model::{Action, HistoryEntry, HistoryKind, Resolution, Step};
use crate::observer::{Event, Observer};
use crate::sources::Source;
use crate::sources::bin::Executables;
use crate::sources::desktop::MenuIndex;
use crate::sources::folders::Folders;
use crate::sources::history::History;
use crate::sources::session::Sessions;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the top level can offer or match against.
#[derive(Debug, Default)]
pub struct Catalog {
    pub history: History,
    pub folders: Folders,
    pub sessions: Sessions,
    pub executables: Executables,
    pub menu: MenuIndex,
}

impl Catalog {
    /// History, bookmarks, sessions, executables, then menu entries.
    pub fn initial_items(&self) -> Vec<String> {
        let sources: [&dyn Source; 5] = [
            &self.history,
            &self.folders,
            &self.sessions,
            &self.executables,
            &self.menu,
        ];
        sources.iter().flat_map(|s| s.items()).collect()
    }
}

/// Turns picker selections into the next listing or a launch.
///
/// The only state is the cursor: the directory being browsed, if any. While it
/// is set, input is always read as a path relative to it.
pub struct Engine<L, O> {
    catalog: Catalog,
    cursor: Option<PathBuf>,
    home: Option<PathBuf>,
    launcher: L,
    observer: O,
}

impl<L: Launcher, O: Observer> Engine<L, O> {
    pub fn new(catalog: Catalog, launcher: L, observer: O) -> Self {
        Self { catalog, cursor: None, home: None, launcher, observer }
    }

    /// Directory substituted for a leading `~`.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Option<&Path> {
        self.cursor.as_deref()
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Back to the top level.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Resolve `input` and, if it ends the run, carry out the launch.
    pub fn step(&mut self, input: &str) -> Result<Step> {
        match self.resolve(input)? {
            Resolution::Display(items) => Ok(Step::Display(items)),
            Resolution::Launch { action, record } => {
                // History only changes once we are committed to launching.
                if let Some(entry) = record {
                    let history = &mut self.catalog.history;
                    let saved = match entry.kind {
                        HistoryKind::File => history.add_file(&entry.label, &entry.path),
                        HistoryKind::Executable => history.add_executable(&entry.label),
                    };
                    if let Err(e) = saved {
                        self.observer.notify(&Event::HistoryNotSaved(&e.to_string()));
                    }
                }
                self.launcher.launch(&action)?;
                Ok(Step::Launched)
            }
        }
    }

    pub fn resolve(&mut self, input: &str) -> Result<Resolution> {
        if input.is_empty() {
            return Ok(Resolution::Display(self.catalog.initial_items()));
        }

        if self.cursor.is_none() {
            for matcher in TOPLEVEL {
                if let Some(resolution) = matcher.try_resolve(input, &self.catalog) {
                    self.observer.notify(&Event::Matched { matcher: matcher.name(), input });
                    return Ok(resolution);
                }
            }
        }

        self.resolve_path(input)
    }

    fn resolve_path(&mut self, input: &str) -> Result<Resolution> {
        let expanded = expand_home(input, self.home.as_deref());
        let candidate = match &self.cursor {
            Some(cursor) => cursor.join(expanded),
            None => expanded,
        };

        if candidate.is_dir() {
            let listing = list_dir(&candidate, &self.observer)?;
            let cursor = fs::canonicalize(&candidate).unwrap_or(candidate);
            self.observer.notify(&Event::Directory(&cursor));
            self.cursor = Some(cursor);

            let mut items = Vec::with_capacity(listing.len() + 1);
            items.push("..".to_string());
            items.extend(listing);
            return Ok(Resolution::Display(items));
        }

        if !candidate.exists() {
            return Err(Error::Missing { path: candidate });
        }

        // Deliberately tests the input as typed, not the joined path.
        if is_executable(Path::new(input)) {
            self.observer.notify(&Event::Executable(&candidate));
            return Ok(Resolution::launch(Action::Program(candidate)));
        }

        self.observer.notify(&Event::Document(&candidate));
        Ok(Resolution::Launch {
            action: Action::Open(candidate.clone()),
            record: Some(HistoryEntry::file(input, candidate)),
        })
    }
}

/// Replace a leading `~` with `home`.
pub fn expand_home(input: &str, home: Option<&Path>) -> PathBuf {
    match (home, input.strip_prefix('~')) {
        (Some(home), Some("")) => home.to_path_buf(),
        (Some(home), Some(rest)) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(input),
    }
}

/// Sorted UTF-8 entry names of `dir`. Other names could not round-trip through
/// the picker, so they are reported and left out.
fn list_dir(dir: &Path, observer: &impl Observer) -> Result<Vec<String>> {
    let err = |source| Error::ListDir { path: dir.to_path_buf(), source };
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(err)? {
        let entry = entry.map_err(err)?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(_) => observer.notify(&Event::Skipped(&entry.path())),
        }
    }
    names.sort();
    Ok(names)
}
