use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures of a single thread dump. Every variant is fatal for the request.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The command could not be spawned, or was aborted by the timeout.
    #[error("failed to execute `{command}`: {source}")]
    Exec {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}{detail}")]
    CommandFailed {
        command: String,
        status: String,
        detail: String,
    },

    #[error("failed to open dump archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to read {entry} from dump archive {}: {source}", .path.display())]
    ArchiveEntry {
        path: PathBuf,
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("no JSON file found in dump archive {}", .path.display())]
    NoJsonFound { path: PathBuf },

    #[error("failed to decode conversation from {entry} (cmd: `{command}`): {source}")]
    Decode {
        command: String,
        entry: String,
        #[source]
        source: serde_json::Error,
    },
}
