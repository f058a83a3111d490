use std::fmt;

use crate::error::{ErrorKind, SafeDomError};
use crate::precondition::{Preconditions, Severity};

/// The inert URL substituted for every rejected raw URL.
///
/// A syntactically valid URL with no origin and no executable scheme.
/// Callers and tests may rely on the exact literal.
pub const INNOCUOUS_URL: &str = "about:invalid#zClosurez";

const DEFAULT_SCHEMES: [&str; 4] = ["http", "https", "ftp", "mailto"];

// Schemes that can execute script or carry inline content.
const FORBIDDEN_SCHEMES: [&str; 5] = ["javascript", "vbscript", "data", "blob", "filesystem"];

/// Top-level MIME type a sink accepts in `data:` URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimePattern {
    /// `audio/*`
    Audio,
    /// `video/*`
    Video,
    /// `image/*`
    Image,
}

impl MimePattern {
    fn top_level(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
        }
    }

    /// Returns true if `mime` (e.g. `audio/mp3`) falls under this pattern.
    ///
    /// Comparison is ASCII case-insensitive and requires a non-empty subtype.
    pub fn matches(self, mime: &str) -> bool {
        match mime.split_once('/') {
            Some((top, sub)) => {
                top.eq_ignore_ascii_case(self.top_level()) && !sub.trim().is_empty()
            }
            None => false,
        }
    }
}

impl fmt::Display for MimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/*", self.top_level())
    }
}

/// Outcome of classifying a raw URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizationVerdict {
    /// The URL may be used as-is.
    Accepted(String),
    /// The URL was refused; the payload is always [`INNOCUOUS_URL`].
    Rejected(&'static str),
}

impl SanitizationVerdict {
    /// Returns the string a sink should assign.
    pub fn into_value(self) -> String {
        match self {
            Self::Accepted(url) => url,
            Self::Rejected(placeholder) => placeholder.to_string(),
        }
    }

    /// Returns true for [`SanitizationVerdict::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Classifies raw URL strings by scheme.
///
/// Accepts relative URLs, URLs whose scheme is on the allow-list, and
/// `data:` URLs whose declared MIME type matches the pattern a sink allows.
/// Everything else is replaced with [`INNOCUOUS_URL`].
///
/// # Examples
///
/// ```
/// use safe_dom::{MimePattern, SanitizationVerdict, UrlSanitizer, INNOCUOUS_URL};
///
/// let sanitizer = UrlSanitizer::default();
///
/// assert!(sanitizer.verdict("https://example.com/", None).is_accepted());
/// assert!(sanitizer.verdict("/relative/path?q=1", None).is_accepted());
/// assert_eq!(
///     sanitizer.verdict("javascript:alert(1)", None),
///     SanitizationVerdict::Rejected(INNOCUOUS_URL)
/// );
/// assert!(sanitizer
///     .verdict("data:audio/mp3;base64,AAAA", Some(MimePattern::Audio))
///     .is_accepted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSanitizer {
    schemes: Vec<String>,
}

impl UrlSanitizer {
    /// Extends the allow-list with another inert scheme.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Config`] error for schemes that can execute
    /// script or carry inline content (`javascript`, `vbscript`, `data`,
    /// `blob`, `filesystem`) and for strings that are not valid scheme names.
    pub fn allow_scheme(mut self, scheme: &str) -> Result<Self, SafeDomError> {
        let scheme = scheme.trim_end_matches(':').to_ascii_lowercase();
        if !is_scheme_name(&scheme) {
            return Err(SafeDomError::new(
                ErrorKind::Config,
                Severity::Hard,
                format!("'{}' is not a valid URL scheme", scheme),
            ));
        }
        if FORBIDDEN_SCHEMES.contains(&scheme.as_str()) {
            return Err(SafeDomError::new(
                ErrorKind::Config,
                Severity::Hard,
                format!("scheme '{}' cannot be allow-listed", scheme),
            ));
        }
        if !self.schemes.contains(&scheme) {
            self.schemes.push(scheme);
        }
        Ok(self)
    }

    /// Returns the allow-listed schemes, lowercase.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }

    /// Classifies `raw` without reporting anything.
    pub fn verdict(&self, raw: &str, data_mime: Option<MimePattern>) -> SanitizationVerdict {
        let accepted = match scheme_of(raw) {
            None => true,
            Some(scheme) if scheme.eq_ignore_ascii_case("data") => match data_mime {
                Some(pattern) => declared_data_mime(raw).is_some_and(|mime| pattern.matches(mime)),
                None => false,
            },
            Some(scheme) => self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)),
        };

        if accepted {
            SanitizationVerdict::Accepted(raw.to_string())
        } else {
            SanitizationVerdict::Rejected(INNOCUOUS_URL)
        }
    }

    /// Classifies `raw` and reports a rejection as a recoverable failure.
    ///
    /// Returns the URL to assign: `raw` itself, or [`INNOCUOUS_URL`] when the
    /// installed handler lets a rejection continue.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UntrustedUrl`] when the URL is rejected and the
    /// handler aborts.
    pub fn sanitize(
        &self,
        preconditions: &Preconditions,
        raw: &str,
        data_mime: Option<MimePattern>,
    ) -> Result<String, SafeDomError> {
        match self.verdict(raw, data_mime) {
            SanitizationVerdict::Accepted(url) => Ok(url),
            SanitizationVerdict::Rejected(placeholder) => {
                let allowance = match data_mime {
                    Some(pattern) => format!(" or data:{} URLs", pattern),
                    None => String::new(),
                };
                preconditions.recoverable(
                    ErrorKind::UntrustedUrl,
                    format!(
                        "URL ({} bytes) rejected: only relative, {}{} URLs are allowed; using {}",
                        raw.len(),
                        self.schemes.join("/"),
                        allowance,
                        placeholder
                    ),
                )?;
                Ok(placeholder.to_string())
            }
        }
    }
}

impl Default for UrlSanitizer {
    fn default() -> Self {
        Self {
            schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Returns the scheme of `url`, or `None` for a relative URL.
///
/// A scheme is whatever precedes the first `:` when no `/`, `?` or `#`
/// comes before it. It is returned verbatim, so leading whitespace or
/// control characters make it unrecognizable rather than ignored.
fn scheme_of(url: &str) -> Option<&str> {
    let end = url.find([':', '/', '?', '#'])?;
    if url[end..].starts_with(':') {
        Some(&url[..end])
    } else {
        None
    }
}

/// Returns the MIME type declared by a `data:` URL (`data:<mime>[;...],...`).
fn declared_data_mime(url: &str) -> Option<&str> {
    let rest = url.get(5..)?;
    let end = rest.find([';', ',']).unwrap_or(rest.len());
    let mime = &rest[..end];
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

fn is_scheme_name(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_default_schemes_unchanged() {
        let sanitizer = UrlSanitizer::default();
        for url in [
            "http://example.com",
            "HTTPS://example.com/a?b#c",
            "ftp://files.example/x",
            "mailto:someone@example.com",
        ] {
            assert_eq!(
                sanitizer.verdict(url, None),
                SanitizationVerdict::Accepted(url.to_string())
            );
        }
    }

    #[test]
    fn accepts_relative_urls() {
        let sanitizer = UrlSanitizer::default();
        for url in ["", "foo", "/a/b", "?q=javascript:x", "#frag", "a/b:c"] {
            assert!(sanitizer.verdict(url, None).is_accepted(), "{}", url);
        }
    }

    #[test]
    fn rejects_script_schemes() {
        let sanitizer = UrlSanitizer::default();
        for url in [
            "javascript:alert(1)",
            "JaVaScRiPt:alert(1)",
            " javascript:alert(1)",
            "vbscript:msgbox",
            "blob:https://example.com/uuid",
            "unknown:thing",
        ] {
            assert_eq!(
                sanitizer.verdict(url, None),
                SanitizationVerdict::Rejected(INNOCUOUS_URL),
                "{}",
                url
            );
        }
    }

    #[test]
    fn data_urls_need_a_matching_pattern() {
        let sanitizer = UrlSanitizer::default();
        let audio = "data:audio/mp3;base64,SUQz";

        assert!(sanitizer.verdict(audio, Some(MimePattern::Audio)).is_accepted());
        assert!(!sanitizer.verdict(audio, Some(MimePattern::Image)).is_accepted());
        assert!(!sanitizer.verdict(audio, None).is_accepted());
        assert!(sanitizer
            .verdict("DATA:VIDEO/MP4,xyz", Some(MimePattern::Video))
            .is_accepted());
        assert!(!sanitizer
            .verdict("data:text/html,<script>", Some(MimePattern::Image))
            .is_accepted());
        assert!(!sanitizer.verdict("data:,plain", Some(MimePattern::Audio)).is_accepted());
        assert!(!sanitizer.verdict("data:audio/;base64,x", Some(MimePattern::Audio)).is_accepted());
    }

    #[test]
    fn allow_scheme_extends_allow_list() {
        let sanitizer = UrlSanitizer::default().allow_scheme("tel:").unwrap();

        assert!(sanitizer.verdict("tel:+15551234", None).is_accepted());
        assert!(sanitizer.schemes().any(|s| s == "tel"));
    }

    #[test]
    fn allow_scheme_refuses_executable_schemes() {
        for scheme in ["javascript", "JavaScript:", "data", "vbscript", "blob"] {
            let error = UrlSanitizer::default().allow_scheme(scheme).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Config);
        }
        assert!(UrlSanitizer::default().allow_scheme("not a scheme").is_err());
    }

    #[test]
    fn verdict_into_value() {
        assert_eq!(
            SanitizationVerdict::Rejected(INNOCUOUS_URL).into_value(),
            "about:invalid#zClosurez"
        );
        assert_eq!(
            SanitizationVerdict::Accepted("x".to_string()).into_value(),
            "x"
        );
    }

    #[test]
    fn sanitize_reports_rejections() {
        use crate::precondition::RecordingHandler;
        use std::rc::Rc;

        let sanitizer = UrlSanitizer::default();
        let preconditions = Preconditions::new();

        let error = sanitizer
            .sanitize(&preconditions, "javascript:evil()", None)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UntrustedUrl);
        assert!(!error.message().contains("evil"));

        let recorder = Rc::new(RecordingHandler::new());
        let _guard = preconditions.install(recorder.clone());
        let url = sanitizer
            .sanitize(&preconditions, "javascript:evil()", Some(MimePattern::Audio))
            .unwrap();
        assert_eq!(url, INNOCUOUS_URL);
        assert_eq!(recorder.len(), 1);
        assert!(recorder.failures()[0].message().contains("data:audio/*"));
    }

    #[test]
    fn sanitize_accepts_silently() {
        use crate::precondition::RecordingHandler;
        use std::rc::Rc;

        let preconditions = Preconditions::new();
        let recorder = Rc::new(RecordingHandler::new());
        let _guard = preconditions.install(recorder.clone());

        let url = UrlSanitizer::default()
            .sanitize(&preconditions, "https://example.com/", None)
            .unwrap();
        assert_eq!(url, "https://example.com/");
        assert!(recorder.is_empty());
    }

    #[test]
    fn mime_pattern_display() {
        assert_eq!(MimePattern::Audio.to_string(), "audio/*");
        assert_eq!(MimePattern::Image.to_string(), "image/*");
    }

    mod proptests {
        use super::*;
        use crate::test_utils::{arb_javascript_url, arb_web_url};
        use proptest::prelude::*;

        proptest! {
            /// Property: javascript: URLs always collapse to the sentinel
            #[test]
            fn proptest_javascript_urls_rejected(url in arb_javascript_url()) {
                let verdict = UrlSanitizer::default().verdict(&url, None);
                prop_assert_eq!(verdict, SanitizationVerdict::Rejected(INNOCUOUS_URL));
            }

            /// Property: http(s) URLs pass through byte-for-byte
            #[test]
            fn proptest_web_urls_unchanged(url in arb_web_url()) {
                let verdict = UrlSanitizer::default().verdict(&url, None);
                prop_assert_eq!(verdict, SanitizationVerdict::Accepted(url));
            }
        }
    }
}
