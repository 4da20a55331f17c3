use crate::domain::constants::PROTECTED_REF;
use crate::domain::models::{Commit, RefUpdate};
use crate::git::Repository;
use anyhow::{anyhow, Context};
use std::io::{BufRead, Lines};
use tracing::{debug, info};

/// Lazily parses pre-receive input, one `RefUpdate` per line.
///
/// Iteration ends at end of input or right after the first error.
pub struct RefUpdates<R> {
    lines: Lines<R>,
    failed: bool,
}

pub fn parse_ref_updates<R: BufRead>(input: R) -> RefUpdates<R> {
    RefUpdates {
        lines: input.lines(),
        failed: false,
    }
}

impl<R: BufRead> Iterator for RefUpdates<R> {
    type Item = anyhow::Result<RefUpdate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let parsed = match self.lines.next()? {
            Ok(line) => parse_line(&line),
            Err(e) => Err(anyhow::Error::new(e).context("reading ref updates")),
        };
        self.failed = parsed.is_err();
        Some(parsed)
    }
}

fn parse_line(line: &str) -> anyhow::Result<RefUpdate> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [old, new, name] = fields.as_slice() else {
        return Err(anyhow!("invalid ref update line: {:?}", line));
    };
    Ok(RefUpdate {
        old_revision: old.to_string(),
        new_revision: new.to_string(),
        ref_name: name.to_string(),
    })
}

pub fn is_protected(update: &RefUpdate) -> bool {
    update.ref_name == PROTECTED_REF
}

/// Commits introduced by `update`, oldest first. Updates to any ref other
/// than the protected branch introduce nothing.
pub fn walk_commits(repo: &dyn Repository, update: &RefUpdate) -> anyhow::Result<Vec<Commit>> {
    if !is_protected(update) {
        debug!(ref_name = %update.ref_name, "ignoring unprotected ref");
        return Ok(vec![]);
    }
    let commits = repo
        .walk(&update.old_revision, &update.new_revision)
        .with_context(|| {
            format!(
                "listing commits {}..{}",
                update.old_revision, update.new_revision
            )
        })?;
    info!(
        ref_name = %update.ref_name,
        commits = commits.len(),
        "walked pushed commits"
    );
    Ok(commits)
}
