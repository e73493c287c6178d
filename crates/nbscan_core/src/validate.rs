//! Syntactic validation of code buffers.

use crate::error::{Result, ScanError};
use std::io::Write;
use std::process::{Command, Stdio};

/// Outcome of validating one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The text parses in the target dialect.
    Valid,
    /// The text does not parse.
    Invalid {
        /// Parser diagnostic, possibly empty.
        reason: String,
    },
}

impl Validation {
    /// True for [`Validation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Decides whether source text parses in the target dialect.
///
/// Errors are reserved for a validator that cannot run at all; a buffer that
/// does not parse is `Ok(Validation::Invalid { .. })`.
pub trait SourceValidator: Send + Sync {
    /// Validates one buffer.
    fn validate(&self, source: &str) -> Result<Validation>;
}

impl<F> SourceValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn validate(&self, source: &str) -> Result<Validation> {
        if self(source) {
            Ok(Validation::Valid)
        } else {
            Ok(Validation::Invalid {
                reason: String::new(),
            })
        }
    }
}

/// Accepts every buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SourceValidator for AcceptAll {
    fn validate(&self, _source: &str) -> Result<Validation> {
        Ok(Validation::Valid)
    }
}

/// Pipes the buffer to an external parser; exit status 0 means valid.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    program: String,
    args: Vec<String>,
}

impl CommandValidator {
    /// Creates a validator from an argv-style command line.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            ScanError::ConfigError("validator command must name a program".into())
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SourceValidator for CommandValidator {
    fn validate(&self, source: &str) -> Result<Validation> {
        let unavailable = |e: std::io::Error| ScanError::ValidatorUnavailable {
            program: self.program.clone(),
            reason: e.to_string(),
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A parser may exit before reading everything; the status still decides.
            let _ = stdin.write_all(source.as_bytes());
        }

        let output = child.wait_with_output().map_err(unavailable)?;
        if output.status.success() {
            Ok(Validation::Valid)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Ok(Validation::Invalid {
                reason: stderr.lines().last().unwrap_or_default().trim().to_string(),
            })
        }
    }
}
