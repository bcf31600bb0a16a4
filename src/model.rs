use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    File,
    Executable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub label: String,   // What the picker shows
    pub path: PathBuf,   // What gets opened or run
    pub kind: HistoryKind,
}

impl HistoryEntry {
    pub fn file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { label: label.into(), path: path.into(), kind: HistoryKind::File }
    }

    pub fn executable(label: impl Into<String>) -> Self {
        let label = label.into();
        Self { path: PathBuf::from(&label), label, kind: HistoryKind::Executable }
    }
}

/// A side effect that ends a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run through `sh -c`.
    Shell(String),
    /// Run a program file directly.
    Program(PathBuf),
    /// Hand a document to the configured opener.
    Open(PathBuf),
}

/// What a single resolution produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Show these items and feed the next selection back in.
    Display(Vec<String>),
    /// Commit to `action`, recording `record` in history first when present.
    Launch { action: Action, record: Option<HistoryEntry> },
}

impl Resolution {
    pub fn launch(action: Action) -> Self {
        Resolution::Launch { action, record: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Display(Vec<String>),
    Launched,
}
