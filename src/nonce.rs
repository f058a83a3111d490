//! CSP nonce discovery and propagation.
//!
//! Under a nonce-based Content-Security-Policy, a script configured through
//! `src` or `textContent` only executes if it carries the page's nonce.
//! Browsers do not copy that nonce onto dynamically configured elements, so
//! the script sinks read it from an element that already has it and copy it
//! over.
//!
//! Nonces are read through the live `nonce` property first: once an element
//! is connected, browsers blank the `nonce` attribute, so an attribute-only
//! reader silently finds nothing. Nothing is cached; every call rescans the
//! document.

use std::rc::Rc;

use crate::host::{Document, Element, Identity, Window};
use crate::sink::rel_includes_stylesheet;

/// Which policy directive a nonce is read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceSource {
    /// `script-src`: scanned from `<script>` elements.
    Script,
    /// `style-src`: scanned from `<style>` and stylesheet `<link>` elements.
    Style,
}

impl NonceSource {
    fn tags(self) -> &'static [&'static str] {
        match self {
            Self::Script => &["script"],
            Self::Style => &["style", "link"],
        }
    }
}

/// Returns the first valid nonce of kind `source` present in `document`.
///
/// Returns `None` when no candidate element carries a populated nonce, or
/// when the first populated nonce is malformed.
pub fn read_nonce(document: &dyn Document, source: NonceSource) -> Option<String> {
    let candidate = source
        .tags()
        .iter()
        .flat_map(|tag| document.elements_by_tag_name(tag))
        .filter(|element| source == NonceSource::Script || is_style_carrier(element.as_ref()))
        .find_map(|element| element_nonce(element.as_ref()))?;

    if is_valid_nonce(&candidate) {
        Some(candidate)
    } else {
        tracing::debug!(target: "safe_dom", len = candidate.len(), "ignoring malformed nonce");
        None
    }
}

/// Copies the nonce of the document owning `element` onto `element`.
///
/// Elements without an owner document fall back to `ambient`'s document.
/// Returns true if a nonce was set.
pub(crate) fn relay_nonce(
    element: &dyn Element,
    ambient: &Rc<dyn Window>,
    source: NonceSource,
) -> bool {
    let document = element
        .owner_document()
        .unwrap_or_else(|| ambient.document());

    match read_nonce(document.as_ref(), source) {
        Some(nonce) => {
            element.set_attribute("nonce", &nonce);
            tracing::debug!(target: "safe_dom", ?source, "relayed CSP nonce");
            true
        }
        None => false,
    }
}

fn element_nonce(element: &dyn Element) -> Option<String> {
    element
        .property("nonce")
        .filter(|nonce| !nonce.is_empty())
        .or_else(|| element.attribute("nonce").filter(|nonce| !nonce.is_empty()))
}

fn is_style_carrier(element: &dyn Element) -> bool {
    match element.identity() {
        Identity::Element(tag) if tag.eq_ignore_ascii_case("link") => element
            .property("rel")
            .or_else(|| element.attribute("rel"))
            .is_some_and(|rel| rel_includes_stylesheet(&rel)),
        _ => true,
    }
}

/// Nonces are base64-ish tokens: `[A-Za-z0-9+/_-]+` followed by at most two `=`.
fn is_valid_nonce(nonce: &str) -> bool {
    let body = nonce.trim_end_matches('=');
    let padding = nonce.len() - body.len();
    !body.is_empty()
        && padding <= 2
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWindow;

    #[test]
    fn nonce_validation() {
        assert!(is_valid_nonce("abc123"));
        assert!(is_valid_nonce("a+b/c_d-e=="));
        assert!(!is_valid_nonce(""));
        assert!(!is_valid_nonce("==="));
        assert!(!is_valid_nonce("abc==="));
        assert!(!is_valid_nonce("abc def"));
        assert!(!is_valid_nonce("a=b"));
    }

    #[test]
    fn reads_script_nonce_through_property() {
        let window = MemoryWindow::new();
        let document = window.memory_document();
        let script = document.create_element("script");
        script.set_attribute("nonce", "n0nce");
        document.append(&script);

        // Connected: the attribute is blanked but the property survives.
        assert_eq!(script.attribute("nonce").as_deref(), Some(""));
        assert_eq!(read_nonce(&*document, NonceSource::Script).as_deref(), Some("n0nce"));
    }

    #[test]
    fn missing_nonce_reads_as_none() {
        let window = MemoryWindow::new();
        let document = window.memory_document();
        document.append(&document.create_element("script"));

        assert_eq!(read_nonce(&*document, NonceSource::Script), None);
    }

    #[test]
    fn malformed_nonce_reads_as_none() {
        let window = MemoryWindow::new();
        let document = window.memory_document();
        let script = document.create_element("script");
        script.set_attribute("nonce", "not a nonce");
        document.append(&script);

        assert_eq!(read_nonce(&*document, NonceSource::Script), None);
    }

    #[test]
    fn style_nonce_ignores_non_stylesheet_links() {
        let window = MemoryWindow::new();
        let document = window.memory_document();
        let icon = document.create_element("link");
        icon.set_attribute("rel", "icon");
        icon.set_attribute("nonce", "iconNonce");
        document.append(&icon);

        assert_eq!(read_nonce(&*document, NonceSource::Style), None);

        let sheet = document.create_element("link");
        sheet.set_attribute("rel", "Stylesheet");
        sheet.set_attribute("nonce", "sheetNonce");
        document.append(&sheet);

        assert_eq!(read_nonce(&*document, NonceSource::Style).as_deref(), Some("sheetNonce"));
    }

    #[test]
    fn style_nonce_requires_exact_stylesheet_token() {
        let window = MemoryWindow::new();
        let document = window.memory_document();
        let near_miss = document.create_element("link");
        near_miss.set_attribute("rel", "stylesheets");
        near_miss.set_attribute("nonce", "bmVhck1pc3M=");
        document.append(&near_miss);

        assert_eq!(read_nonce(&*document, NonceSource::Style), None);

        let sheet = document.create_element("link");
        sheet.set_attribute("rel", "preload,stylesheet");
        sheet.set_attribute("nonce", "c2hlZXQ=");
        document.append(&sheet);

        assert_eq!(read_nonce(&*document, NonceSource::Style).as_deref(), Some("c2hlZXQ="));
    }
}
