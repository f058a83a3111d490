use std::fmt;

use crate::nonce::NonceSource;
use crate::precondition::Severity;
use crate::sanitizer::MimePattern;
use crate::value::ValueKind;

const SCRIPT_AND_STYLE: &[&str] = &["SCRIPT", "STYLE"];

/// Identifies one dangerous DOM write.
///
/// Each sink maps to a fixed [`SinkPolicy`]; every operation on
/// [`SafeDom`](crate::SafeDom) consults it before mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkId {
    /// `insertAdjacentHTML`
    InsertAdjacentHtml,
    /// `innerHTML`
    InnerHtml,
    /// `innerHTML` from a compile-time constant
    InnerHtmlFromConstant,
    /// `outerHTML`
    OuterHtml,
    /// `style.cssText`
    Style,
    /// `document.write`
    DocumentWrite,
    /// `<link href>` for non-stylesheet `rel` values
    LinkHref,
    /// `<link href>` when `rel` includes `stylesheet`
    LinkStylesheetHref,
    /// `location.href`
    LocationHref,
    /// `location.replace`
    LocationReplace,
    /// `location.assign`
    LocationAssign,
    /// `<a href>`
    AnchorHref,
    /// `<input formaction>`
    InputFormAction,
    /// `<button formaction>`
    ButtonFormAction,
    /// `<form action>`
    FormAction,
    /// `<audio src>`
    AudioSrc,
    /// `<video src>`
    VideoSrc,
    /// `<img src>`
    ImageSrc,
    /// `<embed src>`
    EmbedSrc,
    /// `<frame src>`
    FrameSrc,
    /// `<iframe src>`
    IframeSrc,
    /// `<object data>`
    ObjectData,
    /// `<iframe srcdoc>`
    IframeSrcdoc,
    /// `<script src>`
    ScriptSrc,
    /// `<script>` text content
    ScriptContent,
    /// `window.open`
    OpenInWindow,
    /// `DOMParser.parseFromString`
    ParseFromString,
    /// `Range.createContextualFragment`
    ContextualFragment,
}

/// What a sink requires of its target before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRequirement {
    /// Any target (or no target at all).
    Unchecked,
    /// Any element except those with the listed tags; violations are unconditional.
    NotTags(&'static [&'static str]),
    /// An element with this tag; mismatches are reported with `severity`.
    Tag {
        /// Required tag, uppercase
        tag: &'static str,
        /// How a mismatch is reported
        severity: Severity,
    },
    /// A `Location` or a non-element object shaped like one.
    LocationLike,
}

/// How a sink treats raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStrings {
    /// Raw strings are a hard failure.
    Reject,
    /// Raw strings go through the URL sanitizer, optionally allowing `data:` URLs of a MIME family.
    Sanitize(Option<MimePattern>),
}

/// Per-sink dispatch rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkPolicy {
    /// Required target identity
    pub target: TargetRequirement,
    /// Vetted kinds the sink accepts
    pub accepts: &'static [ValueKind],
    /// Raw string handling
    pub raw: RawStrings,
    /// Element property written, for property sinks
    pub property: Option<&'static str>,
    /// Nonce relayed onto the target before writing
    pub nonce: Option<NonceSource>,
}

impl SinkPolicy {
    const fn html(target: TargetRequirement, property: Option<&'static str>) -> Self {
        Self {
            target,
            accepts: &[ValueKind::Html],
            raw: RawStrings::Reject,
            property,
            nonce: None,
        }
    }

    const fn navigable(
        target: TargetRequirement,
        property: Option<&'static str>,
        data: Option<MimePattern>,
    ) -> Self {
        Self {
            target,
            accepts: &[ValueKind::Url],
            raw: RawStrings::Sanitize(data),
            property,
            nonce: None,
        }
    }

    const fn resource(tag: &'static str, property: &'static str) -> Self {
        Self {
            target: strict(tag),
            accepts: &[ValueKind::ResourceUrl],
            raw: RawStrings::Reject,
            property: Some(property),
            nonce: None,
        }
    }

    /// Returns true if the sink accepts vetted values of `kind`.
    pub fn accepts(&self, kind: ValueKind) -> bool {
        self.accepts.contains(&kind)
    }
}

const fn strict(tag: &'static str) -> TargetRequirement {
    TargetRequirement::Tag {
        tag,
        severity: Severity::Unconditional,
    }
}

const fn lenient(tag: &'static str) -> TargetRequirement {
    TargetRequirement::Tag {
        tag,
        severity: Severity::Recoverable,
    }
}

impl SinkId {
    /// Every sink, in declaration order.
    pub const ALL: [SinkId; 28] = [
        Self::InsertAdjacentHtml,
        Self::InnerHtml,
        Self::InnerHtmlFromConstant,
        Self::OuterHtml,
        Self::Style,
        Self::DocumentWrite,
        Self::LinkHref,
        Self::LinkStylesheetHref,
        Self::LocationHref,
        Self::LocationReplace,
        Self::LocationAssign,
        Self::AnchorHref,
        Self::InputFormAction,
        Self::ButtonFormAction,
        Self::FormAction,
        Self::AudioSrc,
        Self::VideoSrc,
        Self::ImageSrc,
        Self::EmbedSrc,
        Self::FrameSrc,
        Self::IframeSrc,
        Self::ObjectData,
        Self::IframeSrcdoc,
        Self::ScriptSrc,
        Self::ScriptContent,
        Self::OpenInWindow,
        Self::ParseFromString,
        Self::ContextualFragment,
    ];

    /// Returns the dispatch rules for this sink.
    pub const fn policy(self) -> SinkPolicy {
        use TargetRequirement::{LocationLike, NotTags, Unchecked};

        match self {
            Self::InsertAdjacentHtml => SinkPolicy::html(Unchecked, None),
            Self::InnerHtml => SinkPolicy::html(NotTags(SCRIPT_AND_STYLE), Some("innerHTML")),
            Self::InnerHtmlFromConstant => SinkPolicy {
                target: NotTags(SCRIPT_AND_STYLE),
                accepts: &[ValueKind::Constant],
                raw: RawStrings::Reject,
                property: Some("innerHTML"),
                nonce: None,
            },
            Self::OuterHtml => SinkPolicy::html(NotTags(SCRIPT_AND_STYLE), Some("outerHTML")),
            Self::Style => SinkPolicy {
                target: Unchecked,
                accepts: &[ValueKind::Style],
                raw: RawStrings::Reject,
                property: Some("style.cssText"),
                nonce: None,
            },
            Self::DocumentWrite => SinkPolicy::html(Unchecked, None),
            Self::LinkHref => SinkPolicy {
                target: strict("LINK"),
                accepts: &[ValueKind::Url, ValueKind::ResourceUrl],
                raw: RawStrings::Sanitize(None),
                property: Some("href"),
                nonce: None,
            },
            Self::LinkStylesheetHref => SinkPolicy {
                target: strict("LINK"),
                accepts: &[ValueKind::ResourceUrl],
                raw: RawStrings::Reject,
                property: Some("href"),
                nonce: Some(NonceSource::Style),
            },
            Self::LocationHref | Self::LocationReplace | Self::LocationAssign => {
                SinkPolicy::navigable(LocationLike, None, None)
            }
            Self::AnchorHref => SinkPolicy::navigable(strict("A"), Some("href"), None),
            Self::InputFormAction => {
                SinkPolicy::navigable(lenient("INPUT"), Some("formAction"), None)
            }
            Self::ButtonFormAction => {
                SinkPolicy::navigable(lenient("BUTTON"), Some("formAction"), None)
            }
            Self::FormAction => SinkPolicy::navigable(lenient("FORM"), Some("action"), None),
            Self::AudioSrc => {
                SinkPolicy::navigable(strict("AUDIO"), Some("src"), Some(MimePattern::Audio))
            }
            Self::VideoSrc => {
                SinkPolicy::navigable(strict("VIDEO"), Some("src"), Some(MimePattern::Video))
            }
            Self::ImageSrc => {
                SinkPolicy::navigable(strict("IMG"), Some("src"), Some(MimePattern::Image))
            }
            Self::EmbedSrc => SinkPolicy::resource("EMBED", "src"),
            Self::FrameSrc => SinkPolicy::resource("FRAME", "src"),
            Self::IframeSrc => SinkPolicy::resource("IFRAME", "src"),
            Self::ObjectData => SinkPolicy::resource("OBJECT", "data"),
            Self::IframeSrcdoc => SinkPolicy::html(strict("IFRAME"), Some("srcdoc")),
            Self::ScriptSrc => SinkPolicy {
                nonce: Some(NonceSource::Script),
                ..SinkPolicy::resource("SCRIPT", "src")
            },
            Self::ScriptContent => SinkPolicy {
                target: strict("SCRIPT"),
                accepts: &[ValueKind::Script],
                raw: RawStrings::Reject,
                property: Some("textContent"),
                nonce: Some(NonceSource::Script),
            },
            Self::OpenInWindow => SinkPolicy::navigable(Unchecked, None, None),
            Self::ParseFromString | Self::ContextualFragment => SinkPolicy::html(Unchecked, None),
        }
    }

    /// Returns the sink's name, e.g. `set-anchor-href`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::InsertAdjacentHtml => "insert-adjacent-html",
            Self::InnerHtml => "set-inner-html",
            Self::InnerHtmlFromConstant => "set-inner-html-from-constant",
            Self::OuterHtml => "set-outer-html",
            Self::Style => "set-style",
            Self::DocumentWrite => "document-write",
            Self::LinkHref => "set-link-href-and-rel",
            Self::LinkStylesheetHref => "set-link-href-and-rel(stylesheet)",
            Self::LocationHref => "set-location-href",
            Self::LocationReplace => "replace-location",
            Self::LocationAssign => "assign-location",
            Self::AnchorHref => "set-anchor-href",
            Self::InputFormAction => "set-input-form-action",
            Self::ButtonFormAction => "set-button-form-action",
            Self::FormAction => "set-form-element-action",
            Self::AudioSrc => "set-audio-src",
            Self::VideoSrc => "set-video-src",
            Self::ImageSrc => "set-image-src",
            Self::EmbedSrc => "set-embed-src",
            Self::FrameSrc => "set-frame-src",
            Self::IframeSrc => "set-iframe-src",
            Self::ObjectData => "set-object-data",
            Self::IframeSrcdoc => "set-iframe-srcdoc",
            Self::ScriptSrc => "set-script-src",
            Self::ScriptContent => "set-script-content",
            Self::OpenInWindow => "open-in-window",
            Self::ParseFromString => "parse-from-string",
            Self::ContextualFragment => "create-contextual-fragment",
        }
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns true if the `rel` value names a stylesheet.
///
/// Tokens are separated by commas or ASCII whitespace and compared
/// case-insensitively.
pub(crate) fn rel_includes_stylesheet(rel: &str) -> bool {
    rel.split(|c: char| c == ',' || c.is_ascii_whitespace())
        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_only_sinks_never_sanitize() {
        for sink in [
            SinkId::EmbedSrc,
            SinkId::FrameSrc,
            SinkId::IframeSrc,
            SinkId::ObjectData,
            SinkId::ScriptSrc,
            SinkId::LinkStylesheetHref,
        ] {
            let policy = sink.policy();
            assert_eq!(policy.raw, RawStrings::Reject, "{}", sink);
            assert_eq!(policy.accepts, &[ValueKind::ResourceUrl], "{}", sink);
        }
    }

    #[test]
    fn html_sinks_reject_raw_strings() {
        for sink in SinkId::ALL {
            let policy = sink.policy();
            if policy.accepts(ValueKind::Html)
                || policy.accepts(ValueKind::Script)
                || policy.accepts(ValueKind::Style)
            {
                assert_eq!(policy.raw, RawStrings::Reject, "{}", sink);
            }
        }
    }

    #[test]
    fn only_form_action_sinks_are_lenient() {
        // Form targets are commonly duck-typed, so their identity checks are
        // recoverable on purpose. Every other tagged sink is strict.
        let lenient: Vec<SinkId> = SinkId::ALL
            .into_iter()
            .filter(|sink| {
                matches!(
                    sink.policy().target,
                    TargetRequirement::Tag {
                        severity: Severity::Recoverable,
                        ..
                    }
                )
            })
            .collect();

        assert_eq!(
            lenient,
            vec![SinkId::InputFormAction, SinkId::ButtonFormAction, SinkId::FormAction]
        );
    }

    #[test]
    fn media_sinks_allow_their_data_mime_family() {
        assert_eq!(SinkId::AudioSrc.policy().raw, RawStrings::Sanitize(Some(MimePattern::Audio)));
        assert_eq!(SinkId::VideoSrc.policy().raw, RawStrings::Sanitize(Some(MimePattern::Video)));
        assert_eq!(SinkId::ImageSrc.policy().raw, RawStrings::Sanitize(Some(MimePattern::Image)));
        assert_eq!(SinkId::AnchorHref.policy().raw, RawStrings::Sanitize(None));
    }

    #[test]
    fn script_sinks_relay_nonce() {
        for sink in SinkId::ALL {
            let relays = sink.policy().nonce == Some(NonceSource::Script);
            assert_eq!(
                relays,
                matches!(sink, SinkId::ScriptSrc | SinkId::ScriptContent),
                "{}",
                sink
            );
        }
    }

    #[test]
    fn rel_tokens() {
        assert!(rel_includes_stylesheet("stylesheet"));
        assert!(rel_includes_stylesheet("alternate,StyleSheet"));
        assert!(rel_includes_stylesheet("preload STYLESHEET"));
        assert!(!rel_includes_stylesheet("icon"));
        assert!(!rel_includes_stylesheet("stylesheets"));
        assert!(!rel_includes_stylesheet(""));
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = SinkId::ALL.iter().map(|sink| sink.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SinkId::ALL.len());
    }
}
