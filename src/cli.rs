use crate::domain::constants::{DEFAULT_GIT_TIMEOUT_SECS, GIT_TIMEOUT_ENV, MODULE_PATH_ENV};
use crate::domain::models::HookConfig;
use clap::Parser;
use std::time::Duration;

/// Runs as a git pre-receive hook: reads `<old> <new> <ref>` lines on stdin
/// and verifies every commit pushed to master.
#[derive(Parser, Debug)]
#[command(
    name = "modgate",
    version,
    about = "Pre-receive hook verifying module pseudo-versions"
)]
pub struct Cli {
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        env = MODULE_PATH_ENV,
        default_value = "",
        help = "Module path the repository publishes"
    )]
    pub module_path: String,
    #[arg(
        long,
        env = GIT_TIMEOUT_ENV,
        default_value_t = DEFAULT_GIT_TIMEOUT_SECS,
        help = "Seconds any single git invocation may run"
    )]
    pub git_timeout_secs: u64,
}

impl Cli {
    pub fn hook_config(&self) -> HookConfig {
        HookConfig {
            module_path: self.module_path.clone(),
            git_timeout: Duration::from_secs(self.git_timeout_secs),
        }
    }
}
