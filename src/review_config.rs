//! mod review_config layers git-review config files under live git config values

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use tracing::debug;

use crate::config::Settings;
use crate::error::{RestackError, Result};
use crate::runner::{RepositoryLocation, Runner};

pub const SYSTEM_CONFIG: &str = "/etc/git-review/git-review.conf";
pub const DEFAULT_BRANCH: &str = "master";

/// git config section holding the live overrides, e.g. `gitreview.branch`
const LIVE_SECTION: &str = "gitreview";
/// Section of the git-review files we read options from
const FILE_SECTION: &str = "gerrit";
/// Our key name, and the name of the option in the `[gerrit]` section
const FILE_OPTIONS: &[(&str, &str)] = &[
    ("scheme", "scheme"),
    ("hostname", "host"),
    ("port", "port"),
    ("project", "project"),
    ("branch", "defaultbranch"),
    ("remote", "defaultremote"),
    ("rebase", "defaultrebase"),
    ("track", "track"),
    ("usepushurl", "usepushurl"),
];

/// Where the file layers live, lowest precedence first
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub system: Option<PathBuf>,
    pub user: Option<PathBuf>,
    pub repository: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn for_repository(location: &RepositoryLocation) -> ConfigPaths {
        ConfigPaths {
            system: Some(PathBuf::from(SYSTEM_CONFIG)),
            user: home::home_dir().map(|home| {
                home.join(".config")
                    .join("git-review")
                    .join("git-review.conf")
            }),
            repository: Some(location.review_file()),
        }
    }
}

/// Config options from files, with live git config consulted on every read
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    values: BTreeMap<String, String>,
    /// The only file live lookups read from, when in local mode
    live_file: Option<PathBuf>,
}

impl ReviewConfig {
    pub fn load(settings: &Settings, location: &RepositoryLocation) -> Result<ReviewConfig> {
        ReviewConfig::load_from(settings, location, &ConfigPaths::for_repository(location))
    }

    pub fn load_from(
        settings: &Settings,
        location: &RepositoryLocation,
        paths: &ConfigPaths,
    ) -> Result<ReviewConfig> {
        let mut values = BTreeMap::from([("branch".to_owned(), DEFAULT_BRANCH.to_owned())]);

        let mut layers: Vec<(&Path, bool)> = Vec::new();
        if !settings.local_mode {
            for path in [&paths.system, &paths.user].into_iter().flatten() {
                layers.push((path.as_path(), true));
            }
        }
        if let Some(path) = &paths.repository {
            layers.push((path.as_path(), false));
        }

        for (path, deprecated) in layers {
            if !path.exists() {
                continue;
            }
            if deprecated {
                println!(
                    "Using global/system git-review config files ({}) is deprecated",
                    path.display()
                );
            }
            debug!("loading {}", path.display());
            values.extend(load_config_file(path)?);
        }

        Ok(ReviewConfig {
            values,
            live_file: settings
                .local_mode
                .then(|| location.local_config_file()),
        })
    }

    /// The value for `key`, preferring `gitreview.<key>` from git config
    pub fn get(&self, runner: &Runner, key: &str) -> Result<Option<String>> {
        let live = git_config_get_value(
            runner,
            self.live_file.as_deref(),
            LIVE_SECTION,
            key,
            false,
        )?;
        Ok(live.or_else(|| self.values.get(key).cloned()))
    }

    /// The branch to restack onto, never empty
    pub fn branch(&self, runner: &Runner) -> Result<String> {
        Ok(self
            .get(runner, "branch")?
            .filter(|branch| !branch.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_owned()))
    }

    /// The value loaded from files for `key`, ignoring git config
    pub fn file_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Read the known `[gerrit]` options from a git-review file
///
/// Options may use `=` or `:`, values are taken verbatim to the end of the
/// line, and option names are matched case-insensitively.
pub fn load_config_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let file = Ini::load_from_file_opt(path, options).map_err(|source| RestackError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;

    let found: BTreeMap<String, &str> = file
        .section(Some(FILE_SECTION))
        .map(|section| {
            section
                .iter()
                .map(|(option, value)| (option.to_lowercase(), value))
                .collect()
        })
        .unwrap_or_default();

    Ok(FILE_OPTIONS
        .iter()
        .filter_map(|(key, option)| {
            found
                .get(*option)
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect())
}

/// Ask git for `<section>.<option>`, `None` when it isn't set
///
/// With `file` set, only that config file is consulted.
pub fn git_config_get_value(
    runner: &Runner,
    file: Option<&Path>,
    section: &str,
    option: &str,
    as_bool: bool,
) -> Result<Option<String>> {
    let mut argv = runner.git_argv(["config"]);
    if let Some(file) = file {
        argv.push("-f".to_owned());
        argv.push(file.to_string_lossy().into_owned());
    }
    if as_bool {
        argv.push("--bool".to_owned());
    }
    argv.push("--get".to_owned());
    argv.push(format!("{section}.{option}"));

    match runner.run_or_fail(RestackError::GitConfig, argv, &[]) {
        Ok(value) => Ok(Some(value.trim().to_owned())),
        Err(RestackError::GitConfig(failure)) if failure.code == 1 => Ok(None),
        Err(e) => Err(e),
    }
}
