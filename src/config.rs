use std::env;
use std::path::Path;

use clap::Parser;

/// Presence of this env var confines configuration to the current repository
pub const LOCAL_MODE_VAR: &str = "GITREVIEW_LOCAL_MODE";

pub const LICENSE: &str = "\
Copyright (C) 2011-2012 OpenStack LLC.

Licensed under the Apache License, Version 2.0 (the \"License\");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

   http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an \"AS IS\" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
implied.

See the License for the specific language governing permissions and
limitations under the License.";

#[derive(Parser, Debug)]
#[clap(
    about = "Restack the current branch onto its upstream with an interactive rebase",
    long_about = "Restack the current branch onto its upstream with an interactive rebase

When run with no arguments this will:

  * Find the default branch, looking in order at:
      * the gitreview.branch git config value
      * the defaultbranch option of the repository's .gitreview file
      * ~/.config/git-review/git-review.conf and /etc/git-review/git-review.conf
      * master
  * Compute the merge-base of HEAD and origin/<branch>
  * Start `git rebase -i` from that merge-base
",
    override_usage = "git restack [BRANCH]",
    disable_version_flag = true,
    max_term_width = 100
)]
pub struct Args {
    /// Output more information about what's going on
    #[clap(short = 'v', long)]
    pub verbose: bool,

    /// Print the license and exit
    #[clap(long)]
    pub license: bool,

    /// Print the version and exit
    #[clap(long)]
    pub version: bool,

    /// The branch to restack onto, instead of the configured default branch
    pub branch: Option<String>,
}

/// Settings fixed at startup and shared by everything that runs afterwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Log every command that gets run
    pub verbose: bool,
    /// Ignore system and user config files, read git config from the repository only
    pub local_mode: bool,
}

impl Settings {
    /// Create Settings based on arguments and env vars
    pub fn from_args_env(args: &Args) -> Settings {
        Settings {
            verbose: args.verbose,
            local_mode: env::var_os(LOCAL_MODE_VAR).is_some(),
        }
    }
}

/// `<program name> version <version>`, named after however we were invoked
pub fn version_line() -> String {
    let program = env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
    format!("{} version {}", program, env!("CARGO_PKG_VERSION"))
}
