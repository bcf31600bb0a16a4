use log::{debug, warn};
use std::path::Path;

/// A decision taken by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// A top-level matcher claimed the input.
    Matched { matcher: &'static str, input: &'a str },
    Directory(&'a Path),
    Executable(&'a Path),
    Document(&'a Path),
    /// A directory entry whose name the picker cannot carry intact.
    Skipped(&'a Path),
    HistoryNotSaved(&'a str),
}

pub trait Observer {
    fn notify(&self, event: &Event<'_>);
}

/// Forwards events to the `log` facade.
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: &Event<'_>) {
        match event {
            Event::Matched { matcher, input } => debug!("{}: {}", matcher, input),
            Event::Directory(path) => debug!("DIRECTORY: {}", path.display()),
            Event::Executable(path) => debug!("EXECUTABLE: {}", path.display()),
            Event::Document(path) => debug!("FILE: {}", path.display()),
            Event::Skipped(path) => warn!("Skipping non-UTF-8 name {:?}", path),
            Event::HistoryNotSaved(reason) => warn!("{}", reason),
        }
    }
}
