use std::fmt;

use crate::precondition::Severity;

/// Error returned when a sink operation refuses to mutate its target.
///
/// Every error carries the [`Severity`] of the failed precondition so callers
/// can tell a programming error (wrong element handed to a sink) from an
/// untrusted-input rejection.
///
/// # Examples
///
/// ```
/// use safe_dom::{ErrorKind, SafeDomError, Severity};
///
/// let error = SafeDomError::new(ErrorKind::InvalidBlob, Severity::Hard, "not an image");
/// assert_eq!(error.kind(), ErrorKind::InvalidBlob);
/// assert_eq!(error.severity(), Severity::Hard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeDomError {
    kind: ErrorKind,
    severity: Severity,
    message: String,
}

impl SafeDomError {
    /// Creates a new error.
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the severity of the precondition that failed.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SafeDomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure ({}): {}", self.severity, self.kind, self.message)
    }
}

impl std::error::Error for SafeDomError {}

/// Kind of sink failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The target is not the element or interface the sink requires.
    IdentityMismatch,
    /// The target is an element HTML may never be written into (SCRIPT, STYLE).
    DisallowedTarget,
    /// A raw string URL was rejected by the URL sanitizer.
    UntrustedUrl,
    /// The sink does not accept this kind of value.
    WrongValueKind,
    /// A blob did not carry an image MIME type.
    InvalidBlob,
    /// The sanitizer configuration was refused.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityMismatch => write!(f, "identity mismatch"),
            Self::DisallowedTarget => write!(f, "disallowed target"),
            Self::UntrustedUrl => write!(f, "untrusted url"),
            Self::WrongValueKind => write!(f, "wrong value kind"),
            Self::InvalidBlob => write!(f, "invalid blob"),
            Self::Config => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_severity_and_kind() {
        let error = SafeDomError::new(
            ErrorKind::IdentityMismatch,
            Severity::Unconditional,
            "expected A, got DIV",
        );

        assert_eq!(
            error.to_string(),
            "unconditional failure (identity mismatch): expected A, got DIV"
        );
    }

    #[test]
    fn error_kinds_display() {
        assert_eq!(ErrorKind::UntrustedUrl.to_string(), "untrusted url");
        assert_eq!(ErrorKind::WrongValueKind.to_string(), "wrong value kind");
        assert_eq!(ErrorKind::InvalidBlob.to_string(), "invalid blob");
        assert_eq!(ErrorKind::Config.to_string(), "configuration");
    }

    #[test]
    fn error_accessors() {
        let error = SafeDomError::new(ErrorKind::Config, Severity::Hard, "refused");
        assert_eq!(error.message(), "refused");
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}
