//! Subprocess execution with captured output

use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String) -> Self {
        let exit_code = status.code().unwrap_or(-1);
        Self {
            success: status.success(),
            exit_code,
            stdout,
            stderr,
        }
    }
}

/// Run a command and capture its output
///
/// A non-zero exit status is reported through `CommandResult::success`;
/// only a failure to spawn the process is an error.
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandResult> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute {}", program))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    Ok(CommandResult::from_status(output.status, stdout, stderr))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_captures_stdout() {
        let result = run_command("sh", &["-c", "printf 'hello'"]).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "hello");
    }

    #[test]
    fn test_run_command_reports_failure_status() {
        let result = run_command("sh", &["-c", "echo oops >&2; exit 3"]).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[test]
    fn test_run_command_missing_program() {
        assert!(run_command("satisfy-no-such-program", &[]).is_err());
        assert!(!command_exists("satisfy-no-such-program"));
    }
}
