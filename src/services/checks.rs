use crate::domain::constants::LICENSE_FILE;
use crate::domain::errors::VerifyError;
use crate::domain::models::{Commit, FileMode, ModuleVersion, VerifiedCommit};
use crate::git::Repository;
use crate::services::archive::{DirectBuilder, ReferenceBuilder};
use crate::services::compare::check_archive_equivalence;
use crate::services::pseudo::pseudo_version;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

/// Version a commit would publish as.
pub fn module_version(module_path: &str, commit: &Commit) -> ModuleVersion {
    ModuleVersion {
        path: module_path.to_string(),
        version: pseudo_version("", commit_time(commit.committer_time), commit.short_id()),
    }
}

fn commit_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn render_time(secs: i64) -> String {
    commit_time(secs).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Commits must have at most one parent and be committed strictly after it.
pub fn verify_time_ordering(repo: &dyn Repository, commit: &Commit) -> Result<(), VerifyError> {
    let parent_id = match commit.parents.as_slice() {
        [] => return Ok(()),
        [parent] => parent,
        parents => {
            return Err(VerifyError::policy(format!(
                "commit has {} parents, want no more than 1",
                parents.len()
            )))
        }
    };
    let parent = repo
        .commit(parent_id)
        .with_context(|| format!("looking up parent {} of {}", parent_id, commit.id))?;
    if commit.committer_time <= parent.committer_time {
        return Err(VerifyError::policy(format!(
            "commit time {} is not after parent commit time {}",
            render_time(commit.committer_time),
            render_time(parent.committer_time)
        )));
    }
    Ok(())
}

/// The commit's tree must carry a regular `LICENSE` file at its root.
pub fn verify_license_present(repo: &dyn Repository, commit: &Commit) -> Result<(), VerifyError> {
    let entry = repo
        .stat(&commit.id, LICENSE_FILE)
        .with_context(|| format!("looking up {} in {}", LICENSE_FILE, commit.id))?;
    match entry {
        None => Err(VerifyError::policy("commit does not have a LICENSE file")),
        Some(e) if !e.mode.is_file() => Err(VerifyError::policy(format!(
            "commit has a LICENSE that is not a regular file ({})",
            mode_name(e.mode)
        ))),
        Some(_) => Ok(()),
    }
}

fn mode_name(mode: FileMode) -> &'static str {
    match mode {
        FileMode::Regular | FileMode::Executable => "file",
        FileMode::Symlink => "symlink",
        FileMode::Directory => "directory",
        FileMode::Submodule => "submodule",
    }
}

/// Runs every check against one commit.
///
/// Policy violations are collected into the result; the first internal error
/// aborts and is returned.
pub fn verify_commit(
    module_path: &str,
    repo: &dyn Repository,
    commit: &Commit,
) -> anyhow::Result<VerifiedCommit> {
    let version = module_version(module_path, commit);
    debug!(commit = %commit.id, version = %version, "verifying commit");

    let mut errors = Vec::new();
    collect(&mut errors, verify_time_ordering(repo, commit))?;
    collect(
        &mut errors,
        check_archive_equivalence(
            &ReferenceBuilder::new(repo),
            &DirectBuilder::new(repo),
            &version,
            &commit.id,
        ),
    )?;
    collect(&mut errors, verify_license_present(repo, commit))?;

    if !errors.is_empty() {
        info!(commit = %commit.id, violations = errors.len(), "commit rejected");
    }
    Ok(VerifiedCommit {
        id: commit.id.clone(),
        subject: commit.subject(),
        version,
        errors,
    })
}

fn collect(errors: &mut Vec<String>, outcome: Result<(), VerifyError>) -> anyhow::Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(VerifyError::Policy(text)) => {
            errors.push(text);
            Ok(())
        }
        Err(VerifyError::Internal(e)) => Err(e),
    }
}
