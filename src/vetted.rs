use std::fmt;
use std::marker::PhantomData;

/// Marker for the sink category a [`Vetted`] value was vetted for.
///
/// Implemented only by the zero-sized kinds in this module.
pub trait VettedKind: sealed::Sealed {
    /// Short name of the category, used in diagnostics.
    const NAME: &'static str;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! vetted_kind {
    ($(#[$meta:meta])* $kind:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $kind {
            _private: (),
        }

        impl sealed::Sealed for $kind {}

        impl VettedKind for $kind {
            const NAME: &'static str = $name;
        }
    };
}

vetted_kind!(
    /// HTML fragment markup.
    Html,
    "SafeHtml"
);
vetted_kind!(
    /// Script source text.
    Script,
    "SafeScript"
);
vetted_kind!(
    /// Stylesheet declarations.
    Style,
    "SafeStyle"
);
vetted_kind!(
    /// A URL that is safe to navigate to.
    Url,
    "SafeUrl"
);
vetted_kind!(
    /// A URL that is safe to load code or active content from.
    ResourceUrl,
    "TrustedResourceUrl"
);

/// A string that has already been vetted safe for one category of DOM sink.
///
/// `Vetted<K>` is produced by an external, audited builder which guarantees
/// the content is well-formed and safe for sinks of category `K`. This crate
/// never inspects the content again: sinks accepting `K` write it verbatim.
///
/// # Construction Invariants
///
/// [`new_unchecked`](Self::new_unchecked) is the only constructor. It is
/// public because the builders live outside this crate, and it is named so
/// that every call site is easy to audit. There is no `From<String>`, no
/// `Default` and no `Deref`.
///
/// # Examples
///
/// ```
/// use safe_dom::SafeHtml;
///
/// let html = SafeHtml::new_unchecked("<div>foobar</div>");
/// assert_eq!(html.as_ref(), "<div>foobar</div>");
/// assert_eq!(html.into_inner(), "<div>foobar</div>");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Vetted<K: VettedKind> {
    inner: String,
    _kind: PhantomData<K>,
}

/// HTML vetted for markup sinks.
pub type SafeHtml = Vetted<Html>;
/// Script source vetted for script content sinks.
pub type SafeScript = Vetted<Script>;
/// Style declarations vetted for `style` sinks.
pub type SafeStyle = Vetted<Style>;
/// URL vetted for navigation sinks.
pub type SafeUrl = Vetted<Url>;
/// URL vetted for resource-loading sinks.
pub type TrustedResourceUrl = Vetted<ResourceUrl>;

impl<K: VettedKind> Vetted<K> {
    /// Wraps a value that an audited builder has already vetted.
    ///
    /// # Safety (Policy-Level)
    ///
    /// Performs no validation. Only builders that guarantee the content is
    /// safe for category `K` may call this.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
            _kind: PhantomData,
        }
    }

    /// Consumes the wrapper and returns the vetted string.
    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl<K: VettedKind> AsRef<str> for Vetted<K> {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl<K: VettedKind> fmt::Debug for Vetted<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(K::NAME).field(&self.inner).finish()
    }
}

/// A string known at compile time.
///
/// Only `&'static str` can become a `Const`, so values computed at runtime
/// cannot be smuggled into constant-only sinks.
///
/// # Examples
///
/// ```
/// use safe_dom::Const;
///
/// let name = Const::from_static("popup");
/// assert_eq!(name.as_str(), "popup");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Const(&'static str);

impl Const {
    /// Wraps a string literal.
    pub const fn from_static(value: &'static str) -> Self {
        Self(value)
    }

    /// Returns the constant string.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vetted_as_ref_returns_verbatim_content() {
        let html = SafeHtml::new_unchecked("<b>bold</b>");
        assert_eq!(html.as_ref(), "<b>bold</b>");
        assert_eq!(html.as_ref().len(), 11);
    }

    #[test]
    fn vetted_into_inner_returns_value() {
        let url = SafeUrl::new_unchecked("https://example.com/");
        assert_eq!(url.into_inner(), "https://example.com/");
    }

    #[test]
    fn vetted_debug_names_the_kind() {
        let url = TrustedResourceUrl::new_unchecked("https://cdn.example/app.js");
        let debug_output = format!("{:?}", url);

        assert!(debug_output.starts_with("TrustedResourceUrl("));
        assert!(debug_output.contains("cdn.example"));
    }

    #[test]
    fn vetted_kinds_are_distinct_types() {
        // A SafeUrl cannot be passed where a TrustedResourceUrl is expected:
        // fn takes_resource(_: &TrustedResourceUrl) {}
        // takes_resource(&SafeUrl::new_unchecked("x")); // ← type mismatch
        assert_eq!(Url::NAME, "SafeUrl");
        assert_eq!(ResourceUrl::NAME, "TrustedResourceUrl");
    }

    #[test]
    fn const_is_static() {
        const GREETING: Const = Const::from_static("<p>hi</p>");
        assert_eq!(GREETING.as_str(), "<p>hi</p>");
    }

    mod proptests {
        use super::*;
        use crate::test_utils::arb_markup;
        use proptest::prelude::*;

        proptest! {
            /// Property: wrapping never alters the vetted content
            #[test]
            fn proptest_vetted_preserves_content(markup in arb_markup()) {
                let html = SafeHtml::new_unchecked(markup.clone());
                prop_assert_eq!(html.as_ref(), markup.as_str());
                prop_assert_eq!(html.clone().into_inner(), markup);
            }
        }
    }
}
