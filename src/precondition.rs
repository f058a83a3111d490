//! Pluggable handling of failed runtime preconditions.
//!
//! Every sink operation that detects a failed precondition describes it as a
//! [`PreconditionFailure`] and hands it to the [`FailureHandler`] currently
//! installed in a [`Preconditions`] slot:
//!
//! - **Recoverable** failures (untrusted URLs, lenient form-target checks) let
//!   the handler decide: [`Disposition::Abort`] fails the operation,
//!   [`Disposition::Continue`] lets it proceed with the fallback value it
//!   already computed.
//! - **Unconditional** failures (identity mismatches on high-risk sinks) are
//!   shown to the handler but always abort.
//!
//! The default handler is [`AbortHandler`], so code fails closed unless a
//! caller scopes an alternate handler with [`Preconditions::install`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorKind, SafeDomError};

/// How severe a failed precondition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The installed handler decides whether the operation continues.
    Recoverable,
    /// The operation always aborts; the handler only observes the failure.
    Unconditional,
    /// Validation failure with no meaningful fallback; never reaches the handler.
    Hard,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "recoverable"),
            Self::Unconditional => write!(f, "unconditional"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// Decision returned by a [`FailureHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Fail the current operation.
    Abort,
    /// Proceed with the already-computed fallback.
    Continue,
}

/// A failed precondition, as delivered to the installed handler.
///
/// Carries no raw input: messages describe the sink and the identities
/// involved, never the rejected value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreconditionFailure {
    kind: ErrorKind,
    severity: Severity,
    message: String,
}

impl PreconditionFailure {
    /// Creates a new failure description.
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

    /// Returns the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn into_error(self) -> SafeDomError {
        SafeDomError::new(self.kind, self.severity, self.message)
    }
}

impl fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Strategy invoked whenever a precondition fails.
///
/// Closures of the shape `Fn(&PreconditionFailure) -> Disposition` implement
/// this trait directly.
pub trait FailureHandler {
    /// Observes a failure and decides whether a recoverable one may continue.
    ///
    /// The return value is ignored for unconditional failures.
    fn handle(&self, failure: &PreconditionFailure) -> Disposition;
}

impl<F> FailureHandler for F
where
    F: Fn(&PreconditionFailure) -> Disposition,
{
    fn handle(&self, failure: &PreconditionFailure) -> Disposition {
        self(failure)
    }
}

/// The default handler: every failure aborts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortHandler;

impl FailureHandler for AbortHandler {
    fn handle(&self, _failure: &PreconditionFailure) -> Disposition {
        Disposition::Abort
    }
}

/// Handler that records every failure in memory and lets recoverable ones continue.
///
/// Useful for exercising the "proceed anyway" path deterministically.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use safe_dom::{Preconditions, RecordingHandler};
///
/// let preconditions = Preconditions::new();
/// let recorder = Rc::new(RecordingHandler::new());
/// {
///     let _guard = preconditions.install(recorder.clone());
///     // sink operations here continue past recoverable failures
/// }
/// assert!(recorder.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RecordingHandler {
    failures: RefCell<Vec<PreconditionFailure>>,
}

impl RecordingHandler {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded failures, oldest first.
    pub fn failures(&self) -> Vec<PreconditionFailure> {
        self.failures.borrow().clone()
    }

    /// Returns the number of recorded failures.
    pub fn len(&self) -> usize {
        self.failures.borrow().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.failures.borrow().is_empty()
    }

    /// Forgets every recorded failure.
    pub fn clear(&self) {
        self.failures.borrow_mut().clear();
    }
}

impl FailureHandler for RecordingHandler {
    fn handle(&self, failure: &PreconditionFailure) -> Disposition {
        self.failures.borrow_mut().push(failure.clone());
        Disposition::Continue
    }
}

/// Slot holding the single live [`FailureHandler`].
pub struct Preconditions {
    handler: RefCell<Rc<dyn FailureHandler>>,
}

impl Preconditions {
    /// Creates a slot holding the default [`AbortHandler`].
    pub fn new() -> Self {
        Self {
            handler: RefCell::new(Rc::new(AbortHandler)),
        }
    }

    /// Installs `handler` until the returned guard is dropped.
    ///
    /// The previously installed handler is restored on drop, so nested
    /// installs unwind in order.
    pub fn install(&self, handler: Rc<dyn FailureHandler>) -> HandlerGuard<'_> {
        let previous = self.handler.replace(handler);
        HandlerGuard {
            slot: self,
            previous: Some(previous),
        }
    }

    /// Reports a recoverable failure.
    ///
    /// Returns `Ok(())` when the installed handler lets the operation continue.
    ///
    /// # Errors
    ///
    /// Returns the failure as a [`SafeDomError`] when the handler aborts.
    pub fn recoverable(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Result<(), SafeDomError> {
        let failure = PreconditionFailure::new(kind, Severity::Recoverable, message);
        tracing::warn!(
            target: "safe_dom",
            severity = %failure.severity(),
            kind = %failure.kind(),
            "{}",
            failure.message()
        );
        match self.current().handle(&failure) {
            Disposition::Continue => Ok(()),
            Disposition::Abort => Err(failure.into_error()),
        }
    }

    /// Reports an unconditional failure and returns the error to propagate.
    ///
    /// The handler observes the failure but cannot suppress it.
    pub fn unconditional(&self, kind: ErrorKind, message: impl Into<String>) -> SafeDomError {
        let failure = PreconditionFailure::new(kind, Severity::Unconditional, message);
        tracing::error!(
            target: "safe_dom",
            severity = %failure.severity(),
            kind = %failure.kind(),
            "{}",
            failure.message()
        );
        let _ = self.current().handle(&failure);
        failure.into_error()
    }

    /// Builds a hard validation error; the handler is not consulted.
    pub fn hard(&self, kind: ErrorKind, message: impl Into<String>) -> SafeDomError {
        let error = SafeDomError::new(kind, Severity::Hard, message);
        tracing::error!(
            target: "safe_dom",
            severity = %error.severity(),
            kind = %error.kind(),
            "{}",
            error.message()
        );
        error
    }

    fn current(&self) -> Rc<dyn FailureHandler> {
        // Cloned out so a handler may install another one without a borrow conflict.
        Rc::clone(&self.handler.borrow())
    }
}

impl Default for Preconditions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Preconditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preconditions").finish_non_exhaustive()
    }
}

/// Restores the previously installed handler when dropped.
#[must_use = "the handler is uninstalled as soon as the guard is dropped"]
pub struct HandlerGuard<'a> {
    slot: &'a Preconditions,
    previous: Option<Rc<dyn FailureHandler>>,
}

impl Drop for HandlerGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.slot.handler.replace(previous);
        }
    }
}

impl fmt::Debug for HandlerGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGuard").finish_non_exhaustive()
    }
}
