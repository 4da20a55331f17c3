use crate::domain::models::{JsonOut, RunResult};
use crate::services::report::render_report;

pub fn print_report(json: bool, result: &RunResult) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: result.accepted(),
                data: result
            })?
        );
    } else {
        print!("{}", render_report(result));
    }
    Ok(())
}

/// Operator-facing message for a failed run.
pub fn print_failure(json: bool, err: &anyhow::Error) -> anyhow::Result<()> {
    let message = format!("something went wrong: {:#}", err);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: false,
                data: message
            })?
        );
    } else {
        println!("{}", message);
    }
    Ok(())
}
