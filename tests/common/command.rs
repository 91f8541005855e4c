use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use revdiff::areas::git::GitConfig;
use revdiff::areas::repository::Repository;
use rstest::fixture;
use std::path::Path;

/// Blob id of the content `empty`
pub const EMPTY_CONTENT_SHA: &str = "7b4d68d70fcae134d5348f5e118f5e9c9d3f05f6";

const GIT_IDENTITY: [(&str, &str); 6] = [
    ("GIT_AUTHOR_NAME", "fake_user"),
    ("GIT_AUTHOR_EMAIL", "fake_email@email.com"),
    ("GIT_AUTHOR_DATE", "2023-01-01 12:00:00 +0000"),
    ("GIT_COMMITTER_NAME", "fake_user"),
    ("GIT_COMMITTER_EMAIL", "fake_email@email.com"),
    ("GIT_COMMITTER_DATE", "2023-01-01 12:00:00 +0000"),
];

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with two commits: `README`, then `new` holding `empty`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    init_git_repository(repository_dir.path());

    let readme = FileSpec::new(repository_dir.path().join("README"), "readme".to_string());
    write_file(readme);
    git_add(repository_dir.path(), &["README"]).assert().success();
    git_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    let new = FileSpec::new(repository_dir.path().join("new"), "empty".to_string());
    write_file(new);
    git_add(repository_dir.path(), &["new"]).assert().success();
    git_commit(repository_dir.path(), "Add new").assert().success();

    repository_dir
}

/// [`init_repository_dir`] plus the untracked files `deep/down` and `deep/down2`
#[fixture]
pub fn untracked_deep_dir(init_repository_dir: TempDir) -> TempDir {
    for name in ["down", "down2"] {
        let file = FileSpec::new(
            init_repository_dir.path().join("deep").join(name),
            name.to_string(),
        );
        write_file(file);
    }

    init_repository_dir
}

pub fn init_git_repository(dir: &Path) {
    run_git_command(dir, &["init", "-q"]).assert().success();
}

pub fn run_revdiff_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("revdiff").expect("Failed to find revdiff binary");
    cmd.envs(vec![("NO_PAGER", "1"), ("NO_COLOR", "1")]);
    cmd.env_remove("REVDIFF_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn run_git_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn git_add(dir: &Path, paths: &[&str]) -> Command {
    let mut cmd = run_git_command(dir, &["add", "--"]);
    cmd.args(paths);
    cmd
}

pub fn git_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_git_command(dir, &["-c", "commit.gpgsign=false", "commit", "-q", "-m", message]);
    cmd.envs(GIT_IDENTITY);
    cmd
}

pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let output = run_git_command(dir, &["rev-parse", "HEAD"]).output()?;
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

pub fn get_blob_sha(dir: &Path, path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let output = run_git_command(dir, &["hash-object", path]).output()?;
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Open the repository at `dir`, discarding rendered output
pub async fn open_repository(dir: &Path) -> anyhow::Result<Repository> {
    Repository::discover(dir, Box::new(std::io::sink()), GitConfig::default()).await
}
