//! Errors raised while restacking, each with a stable process exit code.

use std::path::PathBuf;

/// Exit code for [`RestackError::GitDirectories`]
pub const EXIT_GIT_DIRECTORIES: i32 = 70;
/// Exit code for [`RestackError::MergeBase`]
pub const EXIT_MERGE_BASE: i32 = 71;
/// Exit code for [`RestackError::GitConfig`]
pub const EXIT_GIT_CONFIG: i32 = 128;
/// Exit code for every error without a documented code of its own
pub const EXIT_FAILURE: i32 = 1;

/// Everything we know about an external command that exited unsuccessfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub code: i32,
    pub output: String,
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The following command failed with exit code {}\n    \"{}\"\n-----------------------\n{}\n-----------------------",
            self.code,
            self.argv.join(" "),
            self.output,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RestackError {
    #[error("Cannot determine where .git directory is.\n{0}")]
    GitDirectories(CommandFailure),

    #[error("Cannot determine merge base.\n{0}")]
    MergeBase(CommandFailure),

    #[error("Git config value retrieval failed.\n{0}")]
    GitConfig(CommandFailure),

    #[error("unable to run {program:?}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to split command line into arguments: {0}")]
    Parse(String),

    #[error("unable to read config file {}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
}

impl RestackError {
    /// The status the process exits with when this error aborts a restack
    pub fn exit_code(&self) -> i32 {
        match self {
            RestackError::GitDirectories(_) => EXIT_GIT_DIRECTORIES,
            RestackError::MergeBase(_) => EXIT_MERGE_BASE,
            RestackError::GitConfig(_) => EXIT_GIT_CONFIG,
            RestackError::Spawn { .. }
            | RestackError::Parse(_)
            | RestackError::ConfigFile { .. } => EXIT_FAILURE,
        }
    }

    /// The failed command, for the variants that wrap one
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            RestackError::GitDirectories(failure)
            | RestackError::MergeBase(failure)
            | RestackError::GitConfig(failure) => Some(failure),
            _ => None,
        }
    }
}

pub type Result<T, E = RestackError> = std::result::Result<T, E>;
