//! Subprocess execution for the wrapped tools.
//!
//! Everything stagehand does remotely goes through an external binary
//! (the alias-aware site CLI or rsync), so the only seam needed for
//! testing is the process boundary itself.

use std::process::Command;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn error_detail(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Trait for running external commands - system or scripted (tests).
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> CommandOutput;
}

/// Production implementation: spawn the process and capture output.
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        match Command::new(program).args(args).output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("Command error: {}", e),
                success: false,
                exit_code: -1,
            },
        }
    }
}

/// Render a program + args as a single display string for error details.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(crate::utils::shell::quote_arg(program));
    parts.extend(args.iter().map(|a| crate::utils::shell::quote_arg(a)));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_joins_program_and_args() {
        let args = vec!["-aH".to_string(), "--delete".to_string()];
        assert_eq!(display_command("rsync", &args), "rsync -aH --delete");
    }

    #[test]
    fn error_detail_prefers_stderr() {
        let out = CommandOutput {
            stdout: "partial".to_string(),
            stderr: "boom".to_string(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(out.error_detail(), "boom");
    }

    #[test]
    fn error_detail_falls_back_to_stdout() {
        let out = CommandOutput {
            stdout: "only stdout".to_string(),
            stderr: "  \n".to_string(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(out.error_detail(), "only stdout");
    }
}
