use crate::error::{Error, Result};
use crate::model::Action;
use log::debug;
use nix::unistd::{AccessFlags, access};
use std::env;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Performs a terminal [`Action`].
pub trait Launcher {
    fn launch(&self, action: &Action) -> Result<()>;
}

/// Starts each action as a detached child and never waits for it.
pub struct SpawnLauncher {
    opener: Vec<String>,
    search_path: Option<OsString>,
}

impl SpawnLauncher {
    /// `opener` is the document handler command line; `extra_dirs` are put in
    /// front of `PATH` for everything launched.
    pub fn new(opener: &str, extra_dirs: &[PathBuf]) -> Self {
        let search_path = if extra_dirs.is_empty() {
            None
        } else {
            let inherited = env::var_os("PATH").unwrap_or_default();
            let dirs = extra_dirs.iter().cloned().chain(env::split_paths(&inherited));
            env::join_paths(dirs).ok()
        };
        Self {
            opener: opener.split_whitespace().map(str::to_string).collect(),
            search_path,
        }
    }

    fn command(&self, action: &Action) -> Option<Command> {
        let command = match action {
            Action::Shell(line) => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                command
            }
            Action::Program(path) => Command::new(path),
            Action::Open(path) => {
                let (program, args) = self.opener.split_first()?;
                let mut command = Command::new(program);
                command.args(args).arg(path);
                command
            }
        };
        Some(command)
    }
}

impl Launcher for SpawnLauncher {
    fn launch(&self, action: &Action) -> Result<()> {
        let Some(mut command) = self.command(action) else {
            log::warn!("No opener configured, cannot handle {:?}", action);
            return Ok(());
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(path) = &self.search_path {
            command.env("PATH", path);
        }

        // Own process group, out of reach of signals sent to ours.
        command.process_group(0);

        debug!("EXECUTE {:?}", command);
        command.spawn().map_err(|source| Error::Launch { command: describe(action), source })?;
        Ok(())
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::Shell(line) => line.clone(),
        Action::Program(path) | Action::Open(path) => path.display().to_string(),
    }
}

/// A regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}
