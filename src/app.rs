use crate::error::Result;
use crate::executor::Launcher;
use crate::model::Step;
use crate::observer::Observer;
use crate::state::Engine;
use crate::ui::picker::Picker;
use log::{debug, error};

/// Alternate between the engine and the picker until something is launched
/// or the user cancels.
pub fn run<L, O, P>(engine: &mut Engine<L, O>, picker: &mut P, first_input: &str) -> Result<()>
where
    L: Launcher,
    O: Observer,
    P: Picker,
{
    let mut input = first_input.to_string();
    loop {
        let items = match engine.step(&input) {
            Ok(Step::Display(items)) => items,
            Ok(Step::Launched) => return Ok(()),
            Err(err) if err.is_recoverable() => {
                error!("{}", err);
                engine.reset();
                engine.catalog().initial_items()
            }
            Err(err) => return Err(err),
        };

        match picker.pick(&items)? {
            Some(choice) => input = choice,
            None => {
                debug!("Selection cancelled");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;
    use crate::testing::{Recorder, RecordingLauncher, ScriptedPicker, catalog};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn engine() -> Engine<RecordingLauncher, Recorder> {
        Engine::new(catalog(), RecordingLauncher::default(), Recorder::default())
    }

    #[test]
    fn cancel_on_first_round_stops_silently() {
        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[None]);

        run(&mut engine, &mut picker, "").unwrap();

        assert_eq!(picker.shown.len(), 1);
        assert!(engine.launcher().launched().is_empty());
        assert!(engine.catalog().history.labels().is_empty());
    }

    #[test]
    fn browses_into_a_folder_and_opens_a_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[Some(dir_str), Some("notes.md")]);

        run(&mut engine, &mut picker, "").unwrap();

        assert_eq!(picker.shown.len(), 2);
        assert_eq!(picker.shown[1], vec!["..", "notes.md"]);
        let opened = fs::canonicalize(dir.path()).unwrap().join("notes.md");
        assert_eq!(engine.launcher().launched(), vec![Action::Open(opened)]);
        assert!(engine.catalog().history.contains("notes.md"));
    }

    #[test]
    fn calculation_can_be_cancelled_without_side_effects() {
        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[Some("=2+2"), None]);

        run(&mut engine, &mut picker, "").unwrap();

        assert_eq!(picker.shown[1], vec!["4"]);
        assert!(engine.launcher().launched().is_empty());
        assert!(engine.catalog().history.labels().is_empty());
    }

    #[test]
    fn initial_input_skips_the_first_listing() {
        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[]);

        run(&mut engine, &mut picker, "lock").unwrap();

        assert!(picker.shown.is_empty());
        assert_eq!(engine.launcher().launched(), vec![Action::Shell("xscreensaver-command -lock".to_string())]);
    }

    #[test]
    fn listing_failure_returns_to_top_level() {
        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            return;
        }

        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[Some(locked.to_str().unwrap()), None]);

        run(&mut engine, &mut picker, "").unwrap();

        assert_eq!(picker.shown[1], engine.catalog().initial_items());
        assert!(engine.cursor().is_none());
        fs::set_permissions(Path::new(&locked), fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn mistyped_path_returns_to_top_level() {
        let mut engine = engine();
        let mut picker = ScriptedPicker::new(&[Some("/nonexistent/fierfox"), None]);

        run(&mut engine, &mut picker, "").unwrap();

        assert_eq!(picker.shown.len(), 2);
        assert_eq!(picker.shown[1], engine.catalog().initial_items());
        assert!(engine.launcher().launched().is_empty());
        assert!(engine.catalog().history.labels().is_empty());
    }
}
