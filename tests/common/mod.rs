use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use std::process;
use tempfile::TempDir;

pub const ZERO: &str = "0000000000000000000000000000000000000000";
pub const MODULE: &str = "example.com/m";
/// 2021-03-04T05:06:07Z
pub const T0: i64 = 1_614_834_367;

/// A scratch git repository the hook runs against.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub repo: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        let repo = tmp.path().join("repo");
        fs::create_dir_all(&home).expect("create isolated home");
        fs::create_dir_all(&repo).expect("create repo dir");

        let env = Self {
            _tmp: tmp,
            home,
            repo,
        };
        env.git(&["init", "-q"]);
        env.git(&["symbolic-ref", "HEAD", "refs/heads/master"]);
        env.git(&["config", "user.name", "Fixture"]);
        env.git(&["config", "user.email", "fixture@example.com"]);
        env.git(&["config", "core.autocrlf", "false"]);
        env
    }

    fn git_cmd(&self) -> process::Command {
        let mut cmd = process::Command::new("git");
        cmd.current_dir(&self.repo)
            .env("HOME", &self.home)
            .env("GIT_CONFIG_NOSYSTEM", "1");
        cmd
    }

    pub fn git(&self, args: &[&str]) -> String {
        let out = self.git_cmd().args(args).output().expect("run git");
        assert!(
            out.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8(out.stdout).expect("git output utf8").trim().to_string()
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.repo.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(full, content).expect("write file");
    }

    pub fn remove(&self, path: &str) {
        self.git(&["rm", "-q", "--cached", path]);
        fs::remove_file(self.repo.join(path)).expect("remove file");
    }

    /// Stages everything and commits with both dates pinned to `time`.
    pub fn commit(&self, message: &str, time: i64) -> String {
        let date = format!("{} +0000", time);
        self.git(&["add", "-A"]);
        let out = self
            .git_cmd()
            .args(["commit", "-q", "--allow-empty", "-m", message])
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .output()
            .expect("run git commit");
        assert!(
            out.status.success(),
            "git commit failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        self.git(&["rev-parse", "HEAD"])
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("modgate");
        cmd.current_dir(&self.repo)
            .env("HOME", &self.home)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("HOME_MODULE_PATH", MODULE)
            .env_remove("RUST_LOG");
        cmd
    }

    /// Runs the hook with a single update of master.
    pub fn push(&self, old: &str, new: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.write_stdin(format!("{} {} refs/heads/master\n", old, new));
        cmd
    }
}

pub fn version_of(id: &str, stamp: &str) -> String {
    format!("v0.0.0-{}-{}", stamp, &id[..12])
}
