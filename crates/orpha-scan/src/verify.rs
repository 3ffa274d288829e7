//! External verification hook run after a scan.

use std::path::Path;
use std::process::Command;

use crate::types::{ScanError, ScanResult};

/// Command that checks the candidate output.
///
/// The output path is appended as the final argument. Standard streams are
/// inherited so the verifier's own report reaches the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the output path.
    pub args: Vec<String>,
}

impl VerifyCommand {
    /// Creates a command from a program and its leading arguments.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a whitespace-separated command line. Quoting is not supported.
    ///
    /// # Errors
    /// Returns a configuration error for a blank command line.
    pub fn parse(command_line: &str) -> ScanResult<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ScanError::Config("verification command is empty".to_string()))?;
        Ok(Self::new(program, parts))
    }

    /// Runs the command against `output`.
    ///
    /// # Errors
    /// Returns [`ScanError::Verification`] if the command cannot be spawned or
    /// exits unsuccessfully.
    pub fn run(&self, output: &Path) -> ScanResult<()> {
        tracing::info!(
            "Verifying {} with '{} {}'",
            output.display(),
            self.program,
            self.args.join(" ")
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(output)
            .status()
            .map_err(|e| ScanError::Verification {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(ScanError::Verification {
                program: self.program.clone(),
                reason: match status.code() {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                },
            });
        }

        tracing::info!("Verification passed");
        Ok(())
    }
}
