//! mod runner executes git, either attached to the terminal or with its output captured

use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{CommandFailure, RestackError, Result, EXIT_FAILURE};

/// A command to run, either as one shell-quoted string or as an argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    /// Split into words with POSIX shell quoting rules before running
    Shell(String),
    /// Passed through unchanged, unless it holds a single element
    Argv(Vec<String>),
}

impl CommandLine {
    /// The argument vector that will actually be executed
    ///
    /// A one-element vector is indistinguishable from a single string, so it
    /// is split exactly like [`CommandLine::Shell`].
    pub fn to_argv(&self) -> Result<Vec<String>> {
        let argv = match self {
            CommandLine::Shell(line) => split(line)?,
            CommandLine::Argv(argv) if argv.len() == 1 => split(&argv[0])?,
            CommandLine::Argv(argv) => argv.clone(),
        };
        if argv.is_empty() {
            return Err(RestackError::Parse("empty command line".into()));
        }
        Ok(argv)
    }
}

fn split(line: &str) -> Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| RestackError::Parse(line.to_owned()))
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        CommandLine::Shell(line.to_owned())
    }
}

impl From<String> for CommandLine {
    fn from(line: String) -> Self {
        CommandLine::Shell(line)
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(argv: Vec<String>) -> Self {
        CommandLine::Argv(argv)
    }
}

impl From<&[&str]> for CommandLine {
    fn from(argv: &[&str]) -> Self {
        CommandLine::Argv(argv.iter().map(|a| a.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CommandLine {
    fn from(argv: [&str; N]) -> Self {
        CommandLine::from(&argv[..])
    }
}

/// The outcome of a command whose output was captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub code: i32,
    /// stdout and stderr interleaved, lossily decoded and trimmed
    pub output: String,
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    fn into_failure(self) -> CommandFailure {
        CommandFailure {
            code: self.code,
            output: self.output,
            argv: self.argv,
            env: self.env,
        }
    }
}

/// The working tree root and git directory of the repository we are in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    top_dir: PathBuf,
    git_dir: PathBuf,
}

impl RepositoryLocation {
    pub fn new(top_dir: impl Into<PathBuf>, git_dir: impl Into<PathBuf>) -> Self {
        RepositoryLocation {
            top_dir: top_dir.into(),
            git_dir: git_dir.into(),
        }
    }

    pub fn top_dir(&self) -> &Path {
        &self.top_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The repository-local `.gitreview` file
    pub fn review_file(&self) -> PathBuf {
        self.top_dir.join(".gitreview")
    }

    /// The repository's own git config file
    pub fn local_config_file(&self) -> PathBuf {
        self.git_dir.join("config")
    }
}

/// Runs external commands, optionally from a fixed working directory
#[derive(Debug, Clone)]
pub struct Runner {
    cwd: Option<PathBuf>,
    /// How git is invoked, normally just `git`
    git: Vec<String>,
}

impl Default for Runner {
    fn default() -> Self {
        Runner {
            cwd: None,
            git: vec!["git".to_owned()],
        }
    }
}

impl Runner {
    /// A runner that uses the current directory of the process
    pub fn new() -> Self {
        Runner::default()
    }

    /// A runner that starts every command in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Runner {
            cwd: Some(dir.into()),
            ..Runner::default()
        }
    }

    /// Invoke git through `program` and its leading arguments instead of plain `git`
    pub fn with_git(mut self, program: &[&str]) -> Self {
        self.git = program.iter().map(|a| a.to_string()).collect();
        self
    }

    /// The argument vector for a git subcommand
    pub fn git_argv<S: AsRef<str>>(&self, args: impl IntoIterator<Item = S>) -> Vec<String> {
        self.git
            .iter()
            .cloned()
            .chain(args.into_iter().map(|a| a.as_ref().to_owned()))
            .collect()
    }

    fn command(&self, argv: &[String]) -> Command {
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run a command attached to our own stdin, stdout and stderr
    ///
    /// Returns the exit status of the child, which the caller is expected to
    /// exit with.
    pub fn run_foreground(&self, cmd: impl Into<CommandLine>) -> Result<i32> {
        let argv = cmd.into().to_argv()?;
        debug!("Running: {}", argv.join(" "));
        let status = self
            .command(&argv)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(spawn_error(&argv))?;
        Ok(status_code(status))
    }

    /// Run a command with its stdout and stderr captured into one string
    ///
    /// `LANG` and `LANGUAGE` are forced to `C` so that output can be parsed,
    /// then `env` is applied on top. A nonzero exit is reported in the
    /// result, not as an error.
    pub fn run_captured(
        &self,
        cmd: impl Into<CommandLine>,
        input: Option<&[u8]>,
        env: &[(&str, &str)],
    ) -> Result<CommandResult> {
        let argv = cmd.into().to_argv()?;
        debug!("Running: {}", argv.join(" "));

        let mut command = self.command(&argv);
        command.env("LANG", "C").env("LANGUAGE", "C");
        for (key, value) in env {
            command.env(key, value);
        }

        let (mut reader, writer) = std::io::pipe().map_err(spawn_error(&argv))?;
        let stderr = writer.try_clone().map_err(spawn_error(&argv))?;
        command
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(writer)
            .stderr(stderr);

        let mut child = command.spawn().map_err(spawn_error(&argv))?;
        // Our copies of the write end must be closed or the read below never sees EOF
        drop(command);

        let child_stdin = child.stdin.take();
        let mut raw = Vec::new();
        std::thread::scope(|s| {
            if let (Some(mut pipe), Some(bytes)) = (child_stdin, input) {
                s.spawn(move || {
                    // The child is free to exit without reading everything
                    let _ = pipe.write_all(bytes);
                });
            }
            reader.read_to_end(&mut raw)
        })
        .map_err(spawn_error(&argv))?;
        let status = child.wait().map_err(spawn_error(&argv))?;

        Ok(CommandResult {
            code: status_code(status),
            output: String::from_utf8_lossy(&raw).trim().to_owned(),
            argv,
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Run a captured command, converting a nonzero exit into the error built by `kind`
    pub fn run_or_fail(
        &self,
        kind: impl FnOnce(CommandFailure) -> RestackError,
        cmd: impl Into<CommandLine>,
        env: &[(&str, &str)],
    ) -> Result<String> {
        let result = self.run_captured(cmd, None, env)?;
        if result.success() {
            Ok(result.output)
        } else {
            Err(kind(result.into_failure()))
        }
    }

    /// Find the working tree root and git directory containing our working directory
    pub fn locate_repository(&self) -> Result<RepositoryLocation> {
        let argv = self.git_argv(["rev-parse", "--show-toplevel", "--git-dir"]);
        let out = self.run_or_fail(RestackError::GitDirectories, argv.clone(), &[])?;
        let lines: Vec<&str> = out.lines().collect();
        let location = match lines[..] {
            [top_dir, git_dir] if !top_dir.is_empty() && !git_dir.is_empty() => Some(
                RepositoryLocation::new(top_dir, self.resolve(Path::new(git_dir))),
            ),
            _ => None,
        };
        location.ok_or_else(|| {
            RestackError::GitDirectories(CommandFailure {
                code: 0,
                output: out.clone(),
                argv: argv.clone(),
                env: vec![],
            })
        })
    }

    /// The most recent common ancestor of `local` and `remote`
    pub fn merge_base(&self, local: &str, remote: &str) -> Result<String> {
        self.run_or_fail(
            RestackError::MergeBase,
            self.git_argv(["merge-base", local, remote]),
            &[],
        )
    }

    /// git reports some paths relative to the directory it was started in
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.cwd {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn spawn_error(argv: &[String]) -> impl FnOnce(std::io::Error) -> RestackError + '_ {
    move |source| RestackError::Spawn {
        program: argv.join(" "),
        source,
    }
}

/// The exit code of a finished child, using the shell convention for signals
fn status_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(EXIT_FAILURE)
}
