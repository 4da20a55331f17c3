use crate::cli::Cli;
use crate::git::GitCli;
use crate::services::output::print_report;
use crate::services::report::run;
use tracing::warn;

/// Verifies the push read from stdin against the repository in the current
/// directory. Returns whether the push is accepted.
pub fn handle_hook(cli: &Cli) -> anyhow::Result<bool> {
    let config = cli.hook_config();
    if config.module_path.is_empty() {
        warn!("module path is empty; set --module-path or HOME_MODULE_PATH");
    }
    let repo = GitCli::open(".", config.git_timeout);
    let stdin = std::io::stdin();
    let result = run(&config, &repo, stdin.lock())?;
    print_report(cli.json, &result)?;
    Ok(result.accepted())
}
