//! Top-level dispatch rules, tried in a fixed order until one claims the input.

use crate::calc;
use crate::model::{Action, HistoryEntry, Resolution};
use crate::state::Catalog;

pub trait Matcher {
    fn name(&self) -> &'static str;
    fn try_resolve(&self, input: &str, catalog: &Catalog) -> Option<Resolution>;
}

/// Dispatch order at the top level. History wins over sessions, sessions over
/// the menu, and so on.
pub const TOPLEVEL: &[&dyn Matcher] = &[
    &HistoryMatcher,
    &SessionMatcher,
    &MenuMatcher,
    &ExecutableMatcher,
    &CalculatorMatcher,
];

pub struct HistoryMatcher;

impl Matcher for HistoryMatcher {
    fn name(&self) -> &'static str {
        "HISTORY"
    }

    fn try_resolve(&self, input: &str, catalog: &Catalog) -> Option<Resolution> {
        if !catalog.history.contains(input) {
            return None;
        }
        catalog.history.action_for(input).map(Resolution::launch)
    }
}

pub struct SessionMatcher;

impl Matcher for SessionMatcher {
    fn name(&self) -> &'static str {
        "SESSION"
    }

    fn try_resolve(&self, input: &str, catalog: &Catalog) -> Option<Resolution> {
        let command = catalog.sessions.command_for(input)?;
        Some(Resolution::launch(Action::Shell(command.to_string())))
    }
}

pub struct MenuMatcher;

impl Matcher for MenuMatcher {
    fn name(&self) -> &'static str {
        "MENU"
    }

    // Not recorded in history: the menu lists it anyway.
    fn try_resolve(&self, input: &str, catalog: &Catalog) -> Option<Resolution> {
        let exec = catalog.menu.exec_for(input).filter(|e| !e.is_empty())?;
        Some(Resolution::launch(Action::Shell(exec)))
    }
}

pub struct ExecutableMatcher;

impl Matcher for ExecutableMatcher {
    fn name(&self) -> &'static str {
        "EXECUTABLE"
    }

    fn try_resolve(&self, input: &str, catalog: &Catalog) -> Option<Resolution> {
        if !catalog.executables.contains(input) {
            return None;
        }
        Some(Resolution::Launch {
            action: Action::Shell(input.to_string()),
            record: Some(HistoryEntry::executable(input)),
        })
    }
}

pub struct CalculatorMatcher;

impl Matcher for CalculatorMatcher {
    fn name(&self) -> &'static str {
        "CALCULATION"
    }

    fn try_resolve(&self, input: &str, _catalog: &Catalog) -> Option<Resolution> {
        let expression = input.strip_prefix('=')?;
        Some(Resolution::Display(vec![calc::calculate(expression)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::desktop::{MenuEntry, MenuIndex, MenuNode};
    use crate::sources::session::Sessions;
    use crate::testing::catalog;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn first_match(input: &str, catalog: &Catalog) -> Option<(&'static str, Resolution)> {
        TOPLEVEL
            .iter()
            .find_map(|m| m.try_resolve(input, catalog).map(|r| (m.name(), r)))
    }

    #[test]
    fn history_beats_colliding_session() {
        let mut catalog = catalog();
        catalog.history.add_file("lock", Path::new("/home/u/lock")).unwrap();
        catalog.sessions = Sessions::new(BTreeMap::from([("lock".to_string(), "slock".to_string())]));

        let (name, resolution) = first_match("lock", &catalog).unwrap();
        assert_eq!(name, "HISTORY");
        assert_eq!(resolution, Resolution::launch(Action::Open("/home/u/lock".into())));
    }

    #[test]
    fn session_beats_menu_and_menu_beats_executable() {
        let mut catalog = catalog();
        catalog.menu = MenuIndex::new(vec![
            MenuNode::Entry(MenuEntry { name: "lock".to_string(), exec: "menu-lock".to_string() }),
            MenuNode::Entry(MenuEntry { name: "vim".to_string(), exec: "gvim %F".to_string() }),
        ]);

        assert_eq!(first_match("lock", &catalog).unwrap().0, "SESSION");
        assert_eq!(
            first_match("vim", &catalog).unwrap(),
            ("MENU", Resolution::launch(Action::Shell("gvim".to_string())))
        );
    }

    #[test]
    fn menu_entry_with_blank_exec_falls_through() {
        let mut catalog = catalog();
        catalog.menu = MenuIndex::new(vec![MenuNode::Entry(MenuEntry {
            name: "vim".to_string(),
            exec: " %U ".to_string(),
        })]);

        let (name, resolution) = first_match("vim", &catalog).unwrap();
        assert_eq!(name, "EXECUTABLE");
        assert_eq!(
            resolution,
            Resolution::Launch {
                action: Action::Shell("vim".to_string()),
                record: Some(HistoryEntry::executable("vim")),
            }
        );
    }

    #[test]
    fn calculation_is_displayed_not_launched() {
        let catalog = catalog();
        assert_eq!(
            first_match("=2+2", &catalog),
            Some(("CALCULATION", Resolution::Display(vec!["4".to_string()])))
        );
        assert_eq!(
            first_match("=import os", &catalog).unwrap().1,
            Resolution::Display(vec![calc::INVALID.to_string()])
        );
    }

    #[test]
    fn unknown_input_is_unclaimed() {
        assert!(first_match("Documents", &catalog()).is_none());
    }
}
