//! CLI command execution helpers with automatic timing
//!
//! Wraps the `freeze` binary built by cargo for this test run and
//! isolates it from the invoking user's config file.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct FreezeCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl FreezeCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        let working_dir = working_dir.as_ref().to_path_buf();
        let mut env = HashMap::new();
        // Keep the per-user config out of the picture
        env.insert(
            "XDG_CONFIG_HOME".to_string(),
            working_dir.join(".no-config").to_string_lossy().into_owned(),
        );
        env.insert("NO_COLOR".to_string(), "1".to_string());

        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_freeze")),
            working_dir,
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Add a path argument
    pub fn arg_path(&mut self, path: &Path) -> &mut Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Name of the snapshot the run reported writing
    pub fn written_snapshot(&self) -> Option<String> {
        self.stdout.lines().find_map(|line| {
            let rest = line.strip_prefix("Snapshot ")?;
            rest.split_whitespace().next().map(str::to_string)
        })
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.stdout).context("stdout is not JSON")
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// freeze!(dir, "--dry-run", ".").assert_success()?;
/// ```
#[macro_export]
macro_rules! freeze {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::FreezeCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_snapshot_extraction() {
        let result = CommandResult {
            stdout: "No changes\nSnapshot 20240309T120000.000000Z written (3 files)\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::ZERO,
        };
        assert_eq!(
            result.written_snapshot().as_deref(),
            Some("20240309T120000.000000Z")
        );
    }
}
