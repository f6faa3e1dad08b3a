//! Running short-lived helper commands (`shortcuts`, `osascript`, `ioreg`)
//! with a deadline.

use std::time::Duration;

use tokio::process::Command;

/// How a helper command failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// The program could not be started.
    Spawn(String),
    /// Non-zero exit; carries trimmed stderr.
    Exit { code: Option<i32>, stderr: String },
    Timeout,
}

/// Run `program args...` and return trimmed stdout.
///
/// The child is killed when the deadline passes.
pub async fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, CommandFailure> {
    tracing::debug!(program, ?args, timeout_secs = timeout.as_secs(), "running helper command");

    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(CommandFailure::Spawn(format!("{program}: {e}"))),
        Err(_) => {
            tracing::warn!(program, timeout_secs = timeout.as_secs(), "helper command timed out");
            return Err(CommandFailure::Timeout);
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CommandFailure::Exit {
            code: output.status.code(),
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
