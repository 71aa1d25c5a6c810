pub mod config;
pub mod error;
pub mod logging;
pub mod review_config;
pub mod runner;

use tracing::debug;

pub use crate::config::Settings;
pub use crate::error::{CommandFailure, RestackError, Result};
pub use crate::review_config::ReviewConfig;
pub use crate::runner::{CommandLine, CommandResult, RepositoryLocation, Runner};

/// The remote whose tracking branches we restack onto
pub const DEFAULT_REMOTE: &str = "origin";

/// Start an interactive rebase of HEAD from its merge-base with the upstream branch
///
/// `branch` overrides the configured default branch. Returns the exit status
/// of `git rebase`.
pub fn restack(settings: &Settings, branch: Option<&str>) -> Result<i32> {
    restack_with(&Runner::new(), settings, branch)
}

/// Same as [`restack`], with every command going through `runner`
pub fn restack_with(runner: &Runner, settings: &Settings, branch: Option<&str>) -> Result<i32> {
    // Nothing else makes sense outside of a repository, so bail before reading any config
    let location = runner.locate_repository()?;
    let config = ReviewConfig::load(settings, &location)?;

    let branch = match branch {
        Some(branch) if !branch.is_empty() => branch.to_owned(),
        _ => config.branch(runner)?,
    };
    let upstream = format!("{DEFAULT_REMOTE}/{branch}");
    let base = runner.merge_base("HEAD", &upstream)?;
    debug!("restacking onto {upstream} from {base}");

    runner.run_foreground(runner.git_argv(["rebase", "-i", base.as_str()]))
}
