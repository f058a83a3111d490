use std::fmt;

use crate::vetted::{Const, SafeHtml, SafeScript, SafeStyle, SafeUrl, TrustedResourceUrl};

/// The kind of value handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// [`SafeHtml`]
    Html,
    /// [`SafeScript`]
    Script,
    /// [`SafeStyle`]
    Style,
    /// [`SafeUrl`]
    Url,
    /// [`TrustedResourceUrl`]
    ResourceUrl,
    /// [`Const`]
    Constant,
    /// An unvetted string.
    Raw,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => write!(f, "SafeHtml"),
            Self::Script => write!(f, "SafeScript"),
            Self::Style => write!(f, "SafeStyle"),
            Self::Url => write!(f, "SafeUrl"),
            Self::ResourceUrl => write!(f, "TrustedResourceUrl"),
            Self::Constant => write!(f, "Const"),
            Self::Raw => write!(f, "raw string"),
        }
    }
}

/// Any value a sink may be asked to write.
///
/// Typed sink operations narrow this at compile time; the data-driven entry
/// point [`SafeDom::write_property`](crate::SafeDom::write_property) checks
/// it against the sink's policy at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkValue<'a> {
    /// Vetted HTML
    Html(&'a SafeHtml),
    /// Vetted script source
    Script(&'a SafeScript),
    /// Vetted style declarations
    Style(&'a SafeStyle),
    /// Vetted navigable URL
    Url(&'a SafeUrl),
    /// Vetted resource URL
    ResourceUrl(&'a TrustedResourceUrl),
    /// Compile-time constant
    Constant(Const),
    /// Unvetted string
    Raw(&'a str),
}

impl<'a> SinkValue<'a> {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Html(_) => ValueKind::Html,
            Self::Script(_) => ValueKind::Script,
            Self::Style(_) => ValueKind::Style,
            Self::Url(_) => ValueKind::Url,
            Self::ResourceUrl(_) => ValueKind::ResourceUrl,
            Self::Constant(_) => ValueKind::Constant,
            Self::Raw(_) => ValueKind::Raw,
        }
    }

    /// Returns the wrapped vetted string, or `None` for a raw string.
    pub fn vetted_str(&self) -> Option<&'a str> {
        match *self {
            Self::Html(v) => Some(v.as_ref()),
            Self::Script(v) => Some(v.as_ref()),
            Self::Style(v) => Some(v.as_ref()),
            Self::Url(v) => Some(v.as_ref()),
            Self::ResourceUrl(v) => Some(v.as_ref()),
            Self::Constant(c) => Some(c.as_str()),
            Self::Raw(_) => None,
        }
    }
}

impl<'a> From<&'a SafeHtml> for SinkValue<'a> {
    fn from(value: &'a SafeHtml) -> Self {
        Self::Html(value)
    }
}

impl<'a> From<&'a SafeScript> for SinkValue<'a> {
    fn from(value: &'a SafeScript) -> Self {
        Self::Script(value)
    }
}

impl<'a> From<&'a SafeStyle> for SinkValue<'a> {
    fn from(value: &'a SafeStyle) -> Self {
        Self::Style(value)
    }
}

impl<'a> From<&'a SafeUrl> for SinkValue<'a> {
    fn from(value: &'a SafeUrl) -> Self {
        Self::Url(value)
    }
}

impl<'a> From<&'a TrustedResourceUrl> for SinkValue<'a> {
    fn from(value: &'a TrustedResourceUrl) -> Self {
        Self::ResourceUrl(value)
    }
}

impl From<Const> for SinkValue<'_> {
    fn from(value: Const) -> Self {
        Self::Constant(value)
    }
}

impl<'a> From<&'a str> for SinkValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Raw(value)
    }
}

impl<'a> From<&'a String> for SinkValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Raw(value)
    }
}

/// Input accepted by navigation sinks: a vetted URL or a raw string.
///
/// Raw strings are run through the URL sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlInput<'a> {
    /// Vetted URL, written verbatim
    Safe(&'a SafeUrl),
    /// Unvetted string, sanitized
    Raw(&'a str),
}

impl<'a> From<&'a SafeUrl> for UrlInput<'a> {
    fn from(value: &'a SafeUrl) -> Self {
        Self::Safe(value)
    }
}

impl<'a> From<&'a str> for UrlInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Raw(value)
    }
}

impl<'a> From<&'a String> for UrlInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Raw(value)
    }
}

impl<'a> From<UrlInput<'a>> for SinkValue<'a> {
    fn from(value: UrlInput<'a>) -> Self {
        match value {
            UrlInput::Safe(url) => Self::Url(url),
            UrlInput::Raw(raw) => Self::Raw(raw),
        }
    }
}
