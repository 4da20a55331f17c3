use crate::domain::constants::ZERO_REVISION;
use crate::domain::models::{Commit, FileMode, TreeEntry};
use anyhow::{anyhow, bail, Context};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;
use wait_timeout::ChildExt;

#[cfg(test)]
pub mod memory;

/// Read-only access to the repository being pushed to.
pub trait Repository {
    /// Commits reachable from `new` but not from `old`, oldest first.
    fn walk(&self, old: &str, new: &str) -> anyhow::Result<Vec<Commit>>;

    fn commit(&self, revision: &str) -> anyhow::Result<Commit>;

    /// Looks up a single path of a commit's tree; `None` if it does not exist.
    fn stat(&self, commit: &str, path: &str) -> anyhow::Result<Option<TreeEntry>>;

    /// Every non-directory entry of a commit's tree, in tree order.
    fn files(&self, commit: &str) -> anyhow::Result<Vec<TreeEntry>>;

    fn read_blob(&self, oid: &str) -> anyhow::Result<Vec<u8>>;

    /// The commit's tree as a tar stream.
    fn export_tar(&self, commit: &str) -> anyhow::Result<Vec<u8>>;
}

/// `Repository` backed by the `git` command line.
///
/// Every invocation inherits the hook's environment, so `GIT_DIR` and the
/// object quarantine variables set by `receive-pack` keep working.
pub struct GitCli {
    dir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn open(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }

    fn git(&self, args: &[&str]) -> anyhow::Result<Vec<u8>> {
        run_bounded(&self.dir, "git", args, self.timeout)
    }
}

impl Repository for GitCli {
    fn walk(&self, old: &str, new: &str) -> anyhow::Result<Vec<Commit>> {
        if new == ZERO_REVISION {
            return Ok(vec![]);
        }
        let exclude = format!("^{}", old);
        let mut args = vec!["rev-list", "--topo-order", new];
        if old != ZERO_REVISION {
            args.push(&exclude);
        }
        let out = self.git(&args)?;
        let ids = String::from_utf8(out).context("rev-list output is not utf-8")?;
        let mut commits = ids
            .lines()
            .filter(|l| !l.is_empty())
            .map(|id| self.commit(id))
            .collect::<anyhow::Result<Vec<_>>>()?;
        commits.reverse();
        Ok(commits)
    }

    fn commit(&self, revision: &str) -> anyhow::Result<Commit> {
        let id = self.git(&["rev-parse", "--verify", &format!("{}^{{commit}}", revision)])?;
        let id = String::from_utf8(id)
            .context("rev-parse output is not utf-8")?
            .trim()
            .to_string();
        let raw = self.git(&["cat-file", "commit", &id])?;
        parse_commit(&id, &raw)
    }

    fn stat(&self, commit: &str, path: &str) -> anyhow::Result<Option<TreeEntry>> {
        let out = self.git(&["ls-tree", "-z", "--full-tree", commit, "--", path])?;
        Ok(parse_ls_tree(&out)?.into_iter().find(|e| e.path == path))
    }

    fn files(&self, commit: &str) -> anyhow::Result<Vec<TreeEntry>> {
        let out = self.git(&["ls-tree", "-r", "-z", "--full-tree", commit])?;
        parse_ls_tree(&out)
    }

    fn read_blob(&self, oid: &str) -> anyhow::Result<Vec<u8>> {
        self.git(&["cat-file", "blob", oid])
    }

    fn export_tar(&self, commit: &str) -> anyhow::Result<Vec<u8>> {
        self.git(&[
            "-c",
            "core.autocrlf=input",
            "-c",
            "core.eol=lf",
            "archive",
            "--format=tar",
            commit,
        ])
    }
}

/// Runs `program` to completion within `timeout`, returning its stdout.
///
/// Stdout and stderr are drained on reader threads while waiting, so output
/// larger than the pipe buffer cannot stall the child. On timeout the child
/// is killed and reaped.
pub fn run_bounded(
    dir: &Path,
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> anyhow::Result<Vec<u8>> {
    let cmdline = format!("{} {}", program, args.join(" "));
    let started = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("starting `{}`", cmdline))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("`{}`: stdout not captured", cmdline))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("`{}`: stderr not captured", cmdline))?;
    let stdout_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });
    let stderr_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).map(|_| buf)
    });

    let waited = child
        .wait_timeout(timeout)
        .with_context(|| format!("waiting for `{}`", cmdline));
    let status = match waited {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            bail!("`{}` timed out after {:?}", cmdline, timeout);
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };

    let out = stdout_thread
        .join()
        .map_err(|_| anyhow!("`{}`: stdout reader panicked", cmdline))?
        .with_context(|| format!("reading stdout of `{}`", cmdline))?;
    let err = stderr_thread
        .join()
        .map_err(|_| anyhow!("`{}`: stderr reader panicked", cmdline))?
        .with_context(|| format!("reading stderr of `{}`", cmdline))?;

    debug!(
        command = %cmdline,
        elapsed_ms = started.elapsed().as_millis() as u64,
        bytes = out.len(),
        "subprocess finished"
    );

    if !status.success() {
        bail!(
            "`{}` failed ({}): {}",
            cmdline,
            status,
            String::from_utf8_lossy(&err).trim()
        );
    }
    Ok(out)
}

/// Parses the output of `git cat-file commit`.
pub fn parse_commit(id: &str, raw: &[u8]) -> anyhow::Result<Commit> {
    let text = String::from_utf8_lossy(raw);
    let (headers, message) = match text.find("\n\n") {
        Some(i) => (&text[..i], &text[i + 2..]),
        None => (text.as_ref(), ""),
    };

    let mut has_tree = false;
    let mut parents = Vec::new();
    let mut committer_time = None;
    for line in headers.lines() {
        // continuation of a multi-line header such as gpgsig
        if line.starts_with(' ') {
            continue;
        }
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "tree" => has_tree = true,
            "parent" => parents.push(value.to_string()),
            "committer" => committer_time = Some(parse_signature_time(value)?),
            _ => {}
        }
    }

    if !has_tree {
        bail!("commit {} has no tree", id);
    }
    let committer_time =
        committer_time.ok_or_else(|| anyhow!("commit {} has no committer", id))?;
    Ok(Commit {
        id: id.to_string(),
        parents,
        committer_time,
        message: message.to_string(),
    })
}

/// Extracts the Unix time from `Name <email> 1614834367 +0000`.
fn parse_signature_time(signature: &str) -> anyhow::Result<i64> {
    let rest = match signature.rfind('>') {
        Some(i) => &signature[i + 1..],
        None => signature,
    };
    let secs = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("signature has no timestamp: {:?}", signature))?;
    secs.parse::<i64>()
        .with_context(|| format!("bad signature timestamp {:?}", secs))
}

/// Parses `git ls-tree -z` output (`<mode> <type> <oid>\t<path>\0`...).
pub fn parse_ls_tree(raw: &[u8]) -> anyhow::Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for record in raw.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let record = std::str::from_utf8(record)
            .with_context(|| format!("tree entry is not utf-8: {:?}", record))?;
        let (meta, path) = record
            .split_once('\t')
            .ok_or_else(|| anyhow!("malformed tree entry {:?}", record))?;
        let mut fields = meta.split(' ');
        let (Some(mode), Some(_kind), Some(oid)) = (fields.next(), fields.next(), fields.next())
        else {
            bail!("malformed tree entry {:?}", record);
        };
        let mode =
            FileMode::from_git(mode).ok_or_else(|| anyhow!("unknown file mode {:?}", mode))?;
        entries.push(TreeEntry {
            path: path.to_string(),
            mode,
            oid: oid.to_string(),
        });
    }
    Ok(entries)
}
