//! Fakes shared by the unit tests.

use crate::error::{Error, Result};
use crate::model::Action;
use crate::observer::{Event, Observer};
use crate::sources::bin::Executables;
use crate::sources::desktop::{MenuEntry, MenuIndex, MenuNode};
use crate::sources::folders::Folders;
use crate::sources::history::History;
use crate::sources::session::Sessions;
use crate::state::Catalog;
use crate::ui::picker::Picker;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io;

/// History empty, one bookmark, one session, one executable, one menu entry.
pub fn catalog() -> Catalog {
    Catalog {
        history: History::in_memory(0),
        folders: Folders::new(vec!["~/work".to_string()]),
        sessions: Sessions::new(BTreeMap::from([(
            "lock".to_string(),
            "xscreensaver-command -lock".to_string(),
        )])),
        executables: Executables::new(&["vim".to_string()], &[]),
        menu: MenuIndex::new(vec![MenuNode::Category {
            name: "Utility".to_string(),
            children: vec![MenuNode::Entry(MenuEntry {
                name: "Calculator".to_string(),
                exec: "gnome-calculator %U".to_string(),
            })],
        }]),
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    launched: RefCell<Vec<Action>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self { launched: RefCell::default(), fail: true }
    }

    pub fn launched(&self) -> Vec<Action> {
        self.launched.borrow().clone()
    }
}

impl crate::executor::Launcher for RecordingLauncher {
    fn launch(&self, action: &Action) -> Result<()> {
        if self.fail {
            return Err(Error::Launch {
                command: format!("{action:?}"),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }
        self.launched.borrow_mut().push(action.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct Recorder {
    events: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl Observer for Recorder {
    fn notify(&self, event: &Event<'_>) {
        let line = match event {
            Event::Matched { matcher, input } => format!("{matcher} {input}"),
            Event::Directory(p) => format!("DIRECTORY {}", p.display()),
            Event::Executable(p) => format!("EXECUTABLE {}", p.display()),
            Event::Document(p) => format!("FILE {}", p.display()),
            Event::Skipped(p) => format!("SKIPPED {}", p.display()),
            Event::HistoryNotSaved(reason) => format!("UNSAVED {reason}"),
        };
        self.events.borrow_mut().push(line);
    }
}

/// Replays canned selections and remembers what it was shown.
#[derive(Default)]
pub struct ScriptedPicker {
    replies: VecDeque<Option<String>>,
    pub shown: Vec<Vec<String>>,
}

impl ScriptedPicker {
    pub fn new(replies: &[Option<&str>]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.map(str::to_string)).collect(),
            shown: Vec::new(),
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick(&mut self, items: &[String]) -> Result<Option<String>> {
        self.shown.push(items.to_vec());
        Ok(self.replies.pop_front().flatten())
    }
}
