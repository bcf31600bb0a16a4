use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot list {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("failed to start picker `{command}`: {source}")]
    PickerSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("picker I/O failed: {0}")]
    PickerIo(#[from] io::Error),

    #[error("picker exited abnormally ({0})")]
    PickerExit(std::process::ExitStatus),

    #[error("picker command is empty")]
    PickerEmpty,

    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("history at {}: {message}", path.display())]
    History { path: PathBuf, message: String },
}

impl Error {
    /// Errors that only spoil the current round; the driver can go back to the top level.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ListDir { .. } | Error::Missing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
