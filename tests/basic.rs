use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::prelude::*;
use itertools::Itertools;

#[test]
fn test_can_compile() {
    let mut cmd = restack();
    let ex = cmd.arg("--help").output().unwrap();
    let out = String::from_utf8(ex.stdout).unwrap();
    let err = String::from_utf8(ex.stderr).unwrap();
    assert!(
        out.contains("Restack the current branch onto its upstream"),
        "out={} err='{}'",
        out,
        err
    );
}

#[test]
fn test_license_and_version_work_anywhere() {
    let repos = Repos::new();
    let out = string(repos.restack("").arg("--license").unwrap().stdout);
    assert!(
        out.starts_with("Copyright (C) 2011-2012 OpenStack LLC."),
        "{}",
        out
    );
    assert!(out.contains("Apache License, Version 2.0"), "{}", out);

    let out = string(repos.restack("").arg("--version").unwrap().stdout);
    assert_eq!(
        out,
        format!("git-restack version {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_restack_default_branch() {
    let repos = Repos::cloned();
    repos.local_changes();

    let commits = repos.git_log("local");
    assert_eq!(
        subjects(&commits),
        ["b3", "b2", "b1", "second commit", "initial commit"]
    );

    let out = string(repos.restack("local").unwrap().stdout);
    assert_eq!(todo(&out), expected_todo(&commits), "out:\n{}", out);
}

#[test]
fn test_restack_gitreview_branch() {
    let repos = Repos::cloned();
    repos.git("local", &["checkout", "-q", "branch2"]);
    repos.local_changes();

    let commits = repos.git_log("local");
    assert_eq!(
        subjects(&commits),
        [
            "b3",
            "b2",
            "b1",
            "branch2 commit",
            "second commit",
            "initial commit"
        ]
    );

    let out = string(repos.restack("local").unwrap().stdout);
    assert_eq!(todo(&out), expected_todo(&commits), "out:\n{}", out);
}

#[test]
fn test_restack_branch_argument() {
    let repos = Repos::cloned();
    repos.git("local", &["checkout", "-q", "branch1"]);
    repos.local_changes();

    let commits = repos.git_log("local");
    assert_eq!(
        subjects(&commits),
        [
            "b3",
            "b2",
            "b1",
            "branch1 commit",
            "second commit",
            "initial commit"
        ]
    );

    let out = string(repos.restack("local").arg("branch1").unwrap().stdout);
    assert_eq!(todo(&out), expected_todo(&commits), "out:\n{}", out);
}

#[test]
fn test_live_git_config_picks_the_branch() {
    let repos = Repos::cloned();
    repos.git("local", &["checkout", "-q", "branch1"]);
    repos.git("local", &["config", "gitreview.branch", "branch1"]);
    repos.local_changes();

    let commits = repos.git_log("local");
    let out = string(repos.restack("local").unwrap().stdout);
    assert_eq!(todo(&out), expected_todo(&commits), "out:\n{}", out);
}

#[test]
fn test_user_config_is_deprecated() {
    let repos = Repos::cloned();
    repos.git("local", &["checkout", "-q", "branch1"]);
    repos.local_changes();
    let user_config = repos.td.child("home/.config/git-review/git-review.conf");
    user_config
        .write_str("[gerrit]\ndefaultbranch=branch1\n")
        .unwrap();

    let commits = repos.git_log("local");
    let out = string(repos.restack("local").unwrap().stdout);
    let (notice, rest) = out.split_once('\n').unwrap();
    assert_eq!(
        notice,
        format!(
            "Using global/system git-review config files ({}) is deprecated",
            user_config.path().display()
        )
    );
    assert_eq!(todo(rest), expected_todo(&commits), "out:\n{}", out);

    // local mode ignores the user file and falls back to master
    let out = string(
        repos
            .restack("local")
            .env("GITREVIEW_LOCAL_MODE", "1")
            .unwrap()
            .stdout,
    );
    assert!(!out.contains("deprecated"), "out:\n{}", out);
    let picks = todo(&out);
    assert_eq!(picks.len(), 4, "out:\n{}", out);
    assert!(picks[0].ends_with(" branch1 commit"), "out:\n{}", out);
}

#[test]
fn test_verbose_logs_commands() {
    let repos = Repos::cloned();
    repos.local_changes();

    let out = string(repos.restack("local").arg("-v").unwrap().stdout);
    assert!(
        out.contains("Running: git rev-parse --show-toplevel --git-dir"),
        "out:\n{}",
        out
    );
    assert!(
        out.contains("Running: git merge-base HEAD origin/master"),
        "out:\n{}",
        out
    );
    assert!(out.contains("Running: git rebase -i "), "out:\n{}", out);
}

#[test]
fn test_missing_upstream_branch() {
    let repos = Repos::cloned();

    let assert = repos
        .restack("local")
        .arg("no-such-branch")
        .assert()
        .code(71);
    let err = string(assert.get_output().stderr.clone());
    assert!(err.contains("Cannot determine merge base."), "err: {}", err);
    assert!(
        err.contains("\"git merge-base HEAD origin/no-such-branch\""),
        "err: {}",
        err
    );
}

#[test]
fn test_outside_a_repository() {
    let repos = Repos::new();
    repos.td.child("not-a-repo").create_dir_all().unwrap();

    let assert = repos
        .restack("not-a-repo")
        .env("GIT_CEILING_DIRECTORIES", repos.td.path())
        .assert()
        .code(70);
    let err = string(assert.get_output().stderr.clone());
    assert!(
        err.contains("Cannot determine where .git directory is."),
        "err: {}",
        err
    );
    assert!(err.contains("not a git repository"), "err: {}", err);
}

/// A tempdir holding an upstream repo, its clone, and a fake home directory
struct Repos {
    td: assert_fs::TempDir,
}

impl Repos {
    fn new() -> Repos {
        let td = assert_fs::TempDir::new().unwrap();
        td.child("home").create_dir_all().unwrap();
        Repos { td }
    }

    /// An upstream and a clone of it in "local"
    ///
    /// master has two commits, branch1 adds one on top, branch2 adds a
    /// .gitreview pointing at itself.
    fn cloned() -> Repos {
        let repos = Repos::new();
        repos.td.child("upstream").create_dir_all().unwrap();
        repos.git("upstream", &["init", "-q", "--initial-branch=master"]);
        repos.file_commit("upstream", "test_file.txt", "initial text", "initial commit");
        repos.file_commit("upstream", "test_file.txt", "second text", "second commit");
        repos.git("upstream", &["checkout", "-q", "-b", "branch1"]);
        repos.file_commit("upstream", "test_file.txt", "branch1 text", "branch1 commit");
        repos.git("upstream", &["checkout", "-q", "master"]);
        repos.git("upstream", &["checkout", "-q", "-b", "branch2"]);
        repos.file_commit(
            "upstream",
            ".gitreview",
            "[gerrit]\ndefaultbranch=branch2\n",
            "branch2 commit",
        );
        repos.git("upstream", &["checkout", "-q", "master"]);
        repos.git("", &["clone", "-q", "upstream", "local"]);
        repos
    }

    fn dir(&self, name: &str) -> PathBuf {
        self.td.path().join(name)
    }

    fn local_changes(&self) {
        for name in ["b1", "b2", "b3"] {
            self.file_commit("local", "test_file.txt", &format!("{name} text"), name);
        }
    }

    /// Write `contents` to `file` and commit it with `message`
    fn file_commit(&self, dir: &str, file: &str, contents: &str, message: &str) {
        self.td.child(dir).child(file).write_str(contents).unwrap();
        self.git(dir, &["add", file]);
        self.git(dir, &["commit", "-q", "-m", message]);
    }

    /// Run git in dir with args and panic if theres an error
    fn git(&self, dir: &str, args: &[&str]) {
        self.git_inner(dir, args).ok().unwrap();
    }

    fn git_inner(&self, dir: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(self.dir(dir));
        self.isolate(&mut cmd);
        cmd
    }

    /// `(short sha, subject)` pairs, newest first
    fn git_log(&self, dir: &str) -> Vec<(String, String)> {
        let out = self
            .git_inner(dir, &["log", "--oneline", "--no-decorate"])
            .output()
            .unwrap()
            .stdout;
        string(out)
            .lines()
            .map(|l| {
                let (sha, subject) = l.split_once(' ').unwrap();
                (sha.to_owned(), subject.to_owned())
            })
            .collect()
    }

    /// git-restack in dir, with `cat` standing in for the todo list editor
    fn restack(&self, dir: &str) -> Command {
        let mut cmd = restack();
        cmd.current_dir(self.dir(dir))
            .env("GIT_SEQUENCE_EDITOR", "cat")
            .env_remove("RUST_LOG");
        self.isolate(&mut cmd);
        cmd
    }

    /// Keep the developer's own git and git-review config out of the tests
    fn isolate(&self, cmd: &mut Command) {
        let home = self.dir("home");
        cmd.env("XDG_CONFIG_HOME", home.join(".config"))
            .env("HOME", home)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env_remove("GITREVIEW_LOCAL_MODE")
            .env("GIT_AUTHOR_NAME", "Restack Test")
            .env("GIT_AUTHOR_EMAIL", "restack@example.com")
            .env("GIT_COMMITTER_NAME", "Restack Test")
            .env("GIT_COMMITTER_EMAIL", "restack@example.com");
    }
}

fn subjects(commits: &[(String, String)]) -> Vec<&str> {
    commits.iter().map(|(_, s)| s.as_str()).collect()
}

/// The three local commits, oldest first, as rebase picks them
fn expected_todo(commits: &[(String, String)]) -> Vec<String> {
    commits[..3]
        .iter()
        .rev()
        .map(|(sha, subject)| format!("pick {} {}", sha, subject))
        .collect()
}

/// The pick lines of the instruction list that `cat` printed, checking the
/// empty line that follows them
fn todo(out: &str) -> Vec<String> {
    let lines = out.lines().collect_vec();
    let picks = lines
        .iter()
        .take_while(|l| l.starts_with("pick "))
        // newer gits print the subject as a comment
        .map(|l| l.replacen(" # ", " ", 1))
        .collect_vec();
    assert_eq!(
        lines.get(picks.len()).copied(),
        Some(""),
        "todo list should end with an empty line:\n{}",
        out
    );
    picks
}

fn string(from: Vec<u8>) -> String {
    String::from_utf8(from).unwrap()
}

/// Get something that can get args added to it
fn restack() -> Command {
    Command::cargo_bin("git-restack").unwrap()
}

