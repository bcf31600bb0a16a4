use crate::sources::Source;
use std::collections::BTreeMap;

/// Named shell shortcuts from the `[session]` config table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    commands: BTreeMap<String, String>,
}

impl Sessions {
    pub fn new(commands: BTreeMap<String, String>) -> Self {
        Self { commands }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn command_for(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(String::as_str)
    }
}

impl Source for Sessions {
    fn items(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }
}
