// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deploy.
// ABOUTME: Collects failures that must not fail the deploy but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn report_delivery(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ReportDelivery,
            message: message.into(),
        }
    }

    pub fn marker_unreadable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MarkerUnreadable,
            message: message.into(),
        }
    }

    pub fn ssh_disconnect(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SshDisconnect,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A notification could not be delivered.
    ReportDelivery,
    /// The stored version marker could not be read; treated as a first deploy.
    MarkerUnreadable,
    /// Failed to cleanly disconnect SSH session.
    SshDisconnect,
}
