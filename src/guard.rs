//! Element identity guards.
//!
//! Before a sink mutates anything, its target is classified into a
//! [`TargetClass`] and compared with what the sink requires. A mismatch on a
//! high-risk sink is a programming error (the wrong element was handed to the
//! wrong sink) and fails unconditionally; form-action sinks report mismatches
//! as recoverable because callers commonly hand them duck-typed stand-ins.

use std::fmt;

use crate::error::{ErrorKind, SafeDomError};
use crate::host::{HostObject, Identity};
use crate::precondition::{Preconditions, Severity};

const LOCATION_MEMBERS: [&str; 3] = ["href", "assign", "replace"];

/// Structural classification of a sink target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetClass {
    /// An element with the given tag name, uppercase.
    Element(String),
    /// A genuine `Location`.
    Location,
    /// A non-element object exposing the `Location` navigation members.
    LocationLike,
    /// A genuine `Window`.
    Window,
    /// A genuine `Document`.
    Document,
    /// Anything else, with its reported name.
    Unknown(String),
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(tag) => write!(f, "{}", tag),
            Self::Location => write!(f, "Location"),
            Self::LocationLike => write!(f, "Location-like object"),
            Self::Window => write!(f, "Window"),
            Self::Document => write!(f, "Document"),
            Self::Unknown(name) => write!(f, "{}", name),
        }
    }
}

/// Classifies `target` by identity and, for non-element objects, by shape.
pub fn classify<T: HostObject + ?Sized>(target: &T) -> TargetClass {
    match target.identity() {
        Identity::Element(tag) => TargetClass::Element(tag.to_ascii_uppercase()),
        Identity::Location => TargetClass::Location,
        Identity::Window => TargetClass::Window,
        Identity::Document => TargetClass::Document,
        Identity::Other(name) => {
            if LOCATION_MEMBERS.iter().all(|member| target.has_member(member)) {
                TargetClass::LocationLike
            } else {
                TargetClass::Unknown(name)
            }
        }
    }
}

/// Asserts that `target` is an element with tag `expected`.
///
/// `severity` selects how a mismatch is reported. With
/// [`Severity::Recoverable`] the installed handler may let the caller proceed
/// against the stand-in; any other severity fails unconditionally.
///
/// # Errors
///
/// Returns [`ErrorKind::IdentityMismatch`] naming the expected and actual
/// identities.
pub fn assert_tag<T: HostObject + ?Sized>(
    preconditions: &Preconditions,
    target: &T,
    expected: &str,
    severity: Severity,
) -> Result<(), SafeDomError> {
    let class = classify(target);
    if let TargetClass::Element(tag) = &class {
        if tag.eq_ignore_ascii_case(expected) {
            return Ok(());
        }
    }

    let message = format!(
        "Argument is not an element of type <{}>; got: {}",
        expected.to_ascii_uppercase(),
        class
    );
    match severity {
        Severity::Recoverable => preconditions.recoverable(ErrorKind::IdentityMismatch, message),
        _ => Err(preconditions.unconditional(ErrorKind::IdentityMismatch, message)),
    }
}

/// Asserts that `target` is not an element with one of the `refused` tags.
///
/// # Errors
///
/// Returns [`ErrorKind::DisallowedTarget`] unconditionally when it is.
pub fn assert_not_tags<T: HostObject + ?Sized>(
    preconditions: &Preconditions,
    target: &T,
    refused: &[&str],
    sink: &str,
) -> Result<(), SafeDomError> {
    if let TargetClass::Element(tag) = classify(target) {
        if refused.iter().any(|r| r.eq_ignore_ascii_case(&tag)) {
            return Err(preconditions.unconditional(
                ErrorKind::DisallowedTarget,
                format!("{} cannot be used on <{}> elements", sink, tag),
            ));
        }
    }
    Ok(())
}

/// Asserts that `target` can stand in for a `Location`.
///
/// Genuine locations pass. Elements never pass, whatever members they have.
/// Other objects pass only if they expose `href`, `assign` and `replace`.
///
/// # Errors
///
/// Returns [`ErrorKind::IdentityMismatch`] unconditionally otherwise.
pub fn assert_is_location_like<T: HostObject + ?Sized>(
    preconditions: &Preconditions,
    target: &T,
) -> Result<(), SafeDomError> {
    match classify(target) {
        TargetClass::Location | TargetClass::LocationLike => Ok(()),
        other => Err(preconditions.unconditional(
            ErrorKind::IdentityMismatch,
            format!(
                "Argument is not a Location (or a non-Element mock); got: {}",
                other
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::precondition::RecordingHandler;

    struct FakeHost {
        identity: Identity,
        members: &'static [&'static str],
    }

    impl HostObject for FakeHost {
        fn identity(&self) -> Identity {
            self.identity.clone()
        }

        fn has_member(&self, name: &str) -> bool {
            self.members.contains(&name)
        }
    }

    fn element(tag: &str) -> FakeHost {
        FakeHost {
            identity: Identity::Element(tag.to_string()),
            members: &[],
        }
    }

    #[test]
    fn classify_uppercases_tags() {
        assert_eq!(classify(&element("a")), TargetClass::Element("A".to_string()));
    }

    #[test]
    fn classify_detects_location_shape() {
        let mock = FakeHost {
            identity: Identity::Other("Object".to_string()),
            members: &["href", "assign", "replace"],
        };
        let partial = FakeHost {
            identity: Identity::Other("Object".to_string()),
            members: &["href"],
        };

        assert_eq!(classify(&mock), TargetClass::LocationLike);
        assert_eq!(classify(&partial), TargetClass::Unknown("Object".to_string()));
    }

    #[test]
    fn assert_tag_accepts_matching_element_case_insensitively() {
        let preconditions = Preconditions::new();
        let iframe = element("iframe");
        assert!(assert_tag(&preconditions, &iframe, "IFRAME", Severity::Unconditional).is_ok());
    }

    #[test]
    fn assert_tag_mismatch_names_both_identities() {
        let preconditions = Preconditions::new();
        let error =
            assert_tag(&preconditions, &element("div"), "a", Severity::Unconditional).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::IdentityMismatch);
        assert!(error.message().contains("<A>"));
        assert!(error.message().contains("DIV"));
    }

    #[test]
    fn unconditional_mismatch_ignores_recording_handler() {
        let preconditions = Preconditions::new();
        let recorder = Rc::new(RecordingHandler::new());
        let _guard = preconditions.install(recorder.clone());

        let result = assert_tag(&preconditions, &element("div"), "EMBED", Severity::Unconditional);

        assert!(result.is_err());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn recoverable_mismatch_continues_under_recording_handler() {
        let preconditions = Preconditions::new();
        let recorder = Rc::new(RecordingHandler::new());
        let _guard = preconditions.install(recorder.clone());

        let stand_in = FakeHost {
            identity: Identity::Other("Object".to_string()),
            members: &["formAction"],
        };
        assert!(assert_tag(&preconditions, &stand_in, "INPUT", Severity::Recoverable).is_ok());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn assert_not_tags_refuses_script_and_style() {
        let preconditions = Preconditions::new();
        for tag in ["script", "STYLE"] {
            let error =
                assert_not_tags(&preconditions, &element(tag), &["SCRIPT", "STYLE"], "innerHTML")
                    .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::DisallowedTarget);
        }
        assert!(assert_not_tags(&preconditions, &element("div"), &["SCRIPT"], "innerHTML").is_ok());
    }

    #[test]
    fn location_guard() {
        let preconditions = Preconditions::new();
        let genuine = FakeHost {
            identity: Identity::Location,
            members: &[],
        };
        let anchor = FakeHost {
            identity: Identity::Element("A".to_string()),
            members: &["href", "assign", "replace"],
        };

        assert!(assert_is_location_like(&preconditions, &genuine).is_ok());
        let error = assert_is_location_like(&preconditions, &anchor).unwrap_err();
        assert_eq!(error.severity(), Severity::Unconditional);
    }
}
