// ABOUTME: Opaque shell command strings with secret redaction for logs and errors.
// ABOUTME: Also carries the best-effort flag for statements whose failure is ignored.

use std::fmt;

const REDACTED: &str = "***";

/// A single shell command line as it is sent to the executor.
///
/// `Display` never prints the secrets registered with [`ShellCommand::with_secret`].
#[derive(Clone, PartialEq, Eq)]
pub struct ShellCommand {
    script: String,
    secrets: Vec<String>,
    best_effort: bool,
}

impl ShellCommand {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            secrets: Vec::new(),
            best_effort: false,
        }
    }

    /// Register a value that must not appear in logs. Empty values are ignored.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    /// A failing best-effort command is logged and the sequence continues.
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    pub fn is_best_effort(&self) -> bool {
        self.best_effort
    }

    /// The literal script, secrets included. Only hand this to a shell.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn redacted(&self) -> String {
        self.secrets
            .iter()
            .fold(self.script.clone(), |text, secret| text.replace(secret, REDACTED))
    }
}

/// Quote `value` as a single POSIX shell word.
///
/// Wraps it in single quotes; embedded single quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCommand")
            .field("script", &self.redacted())
            .field("best_effort", &self.best_effort)
            .finish()
    }
}
