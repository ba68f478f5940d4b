use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("source directory {0:?} is not a directory")]
    SourceNotADirectory(PathBuf),

    #[error("{0:?} is an existing file, not a directory")]
    TargetNotADirectory(PathBuf),

    #[error("clearing of non-empty directory {0:?} was declined")]
    ClearDeclined(PathBuf),

    #[error("directory {0:?} is not empty")]
    TargetNotEmpty(PathBuf),

    #[error("could not start {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with {status} while producing {output:?}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        output: PathBuf,
    },

    #[error("{first:?} and {second:?} both map to output {output:?}")]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> BuildError {
        let context = context.into();
        move |source| BuildError::Io { context, source }
    }
}
