use crate::domain::models::{HookConfig, RunResult};
use crate::git::Repository;
use crate::services::checks::verify_commit;
use crate::services::walker::{parse_ref_updates, walk_commits};
use std::fmt;
use std::io::BufRead;
use tracing::info;

/// Verifies every commit pushed to the protected branch.
///
/// Any internal error aborts the run; no partial result is returned.
pub fn run(
    config: &HookConfig,
    repo: &dyn Repository,
    input: impl BufRead,
) -> anyhow::Result<RunResult> {
    let mut result = RunResult::default();
    for update in parse_ref_updates(input) {
        let update = update?;
        for commit in walk_commits(repo, &update)? {
            result.push(verify_commit(&config.module_path, repo, &commit)?);
        }
    }
    info!(
        commits = result.commits.len(),
        bad = result.bad_count,
        "verification finished"
    );
    Ok(result)
}

/// Human-readable report printed back to the pusher.
pub fn render_report(result: &RunResult) -> String {
    result.to_string()
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "publishing {} pseudo-versions", self.commits.len())?;
        if self.bad_count > 0 {
            writeln!(
                f,
                "error: rejecting push due to {} bad module versions",
                self.bad_count
            )?;
        }
        writeln!(f)?;

        for c in &self.commits {
            writeln!(f, " commit: {}", c.id)?;
            writeln!(f, "subject: {}", c.subject)?;
            writeln!(f, "version: {}", c.version.version)?;
            for e in &c.errors {
                writeln!(f, "  error: {}", e)?;
            }
            writeln!(f)?;
        }

        if self.accepted() {
            writeln!(f, "done")
        } else {
            writeln!(f, "there were problems, stopping")
        }
    }
}
