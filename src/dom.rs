use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorKind, SafeDomError};
use crate::guard;
use crate::host::{
    AdjacentPosition, Blob, Document, DomParser, Element, HostObject, LocationLike, Range, Window,
};
use crate::nonce::{self, NonceSource};
use crate::precondition::{FailureHandler, HandlerGuard, Preconditions};
use crate::sanitizer::{MimePattern, UrlSanitizer};
use crate::sink::{rel_includes_stylesheet, RawStrings, SinkId, TargetRequirement};
use crate::value::{SinkValue, UrlInput};
use crate::vetted::{Const, SafeHtml, SafeScript, SafeStyle, SafeUrl, TrustedResourceUrl};

/// Mediates writes into dangerous DOM sinks.
///
/// Every operation runs the same pipeline, driven by the sink's
/// [`SinkPolicy`](crate::SinkPolicy):
///
/// ```text
/// identity guard --> value coercion (unwrap / sanitize) --> nonce relay --> mutation
/// ```
///
/// Vetted values are written verbatim. Raw strings reach only URL sinks
/// that allow them, through the [`UrlSanitizer`]; a rejected URL is reported
/// to the installed [`FailureHandler`] and, if the handler lets the operation
/// continue, replaced with [`INNOCUOUS_URL`](crate::INNOCUOUS_URL).
///
/// # Examples
///
/// ```
/// use safe_dom::memory::MemoryWindow;
/// use safe_dom::{Element, SafeDom, SafeHtml};
///
/// let window = MemoryWindow::new();
/// let dom = SafeDom::new(window.clone());
///
/// let div = window.memory_document().create_element("div");
/// dom.set_inner_html(&*div, &SafeHtml::new_unchecked("<b>hi</b>")).unwrap();
/// assert_eq!(div.property("innerHTML").as_deref(), Some("<b>hi</b>"));
///
/// // An anchor is required here, not a div:
/// assert!(dom.set_anchor_href(&*div, "https://example.com/").is_err());
/// ```
pub struct SafeDom {
    window: Rc<dyn Window>,
    preconditions: Preconditions,
    sanitizer: UrlSanitizer,
}

impl SafeDom {
    /// Creates a mediator for `window`, the ambient browsing context.
    ///
    /// The ambient window opens new windows, mints object URLs, and supplies
    /// the nonce for elements that have no owner document.
    pub fn new(window: Rc<dyn Window>) -> Self {
        Self {
            window,
            preconditions: Preconditions::new(),
            sanitizer: UrlSanitizer::default(),
        }
    }

    /// Replaces the URL sanitizer.
    pub fn with_url_sanitizer(mut self, sanitizer: UrlSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Returns the ambient window.
    pub fn window(&self) -> &Rc<dyn Window> {
        &self.window
    }

    /// Returns the failure handler slot.
    pub fn preconditions(&self) -> &Preconditions {
        &self.preconditions
    }

    /// Installs `handler` until the returned guard is dropped.
    pub fn install_handler(&self, handler: Rc<dyn FailureHandler>) -> HandlerGuard<'_> {
        self.preconditions.install(handler)
    }

    /// Returns the URL sanitizer.
    pub fn url_sanitizer(&self) -> &UrlSanitizer {
        &self.sanitizer
    }

    /// Sanitizes a raw URL, reporting a rejection as recoverable.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UntrustedUrl`] if the URL is rejected and the
    /// installed handler aborts.
    pub fn sanitize_url(
        &self,
        raw: &str,
        data_mime: Option<MimePattern>,
    ) -> Result<String, SafeDomError> {
        self.sanitizer.sanitize(&self.preconditions, raw, data_mime)
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    /// Checks `target` against the identity `sink` requires.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IdentityMismatch`] or
    /// [`ErrorKind::DisallowedTarget`] when the target does not qualify.
    pub fn check_target<T: HostObject + ?Sized>(
        &self,
        sink: SinkId,
        target: &T,
    ) -> Result<(), SafeDomError> {
        match sink.policy().target {
            TargetRequirement::Unchecked => Ok(()),
            TargetRequirement::NotTags(refused) => {
                guard::assert_not_tags(&self.preconditions, target, refused, sink.name())
            }
            TargetRequirement::Tag { tag, severity } => {
                guard::assert_tag(&self.preconditions, target, tag, severity)
            }
            TargetRequirement::LocationLike => {
                guard::assert_is_location_like(&self.preconditions, target)
            }
        }
    }

    /// Resolves `value` to the literal string `sink` should write.
    ///
    /// Vetted values of an accepted kind are unwrapped without inspection;
    /// raw strings are sanitized if the sink allows them.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::WrongValueKind`] (hard) if the sink does not
    /// accept the value's kind, or [`ErrorKind::UntrustedUrl`] if a raw URL is
    /// rejected and the handler aborts.
    pub fn resolve(&self, sink: SinkId, value: SinkValue<'_>) -> Result<String, SafeDomError> {
        let policy = sink.policy();
        match (value.vetted_str(), value) {
            (Some(vetted), _) if policy.accepts(value.kind()) => Ok(vetted.to_string()),
            (None, SinkValue::Raw(raw)) => match policy.raw {
                RawStrings::Sanitize(data_mime) => self.sanitize_url(raw, data_mime),
                RawStrings::Reject => Err(self.preconditions.hard(
                    ErrorKind::WrongValueKind,
                    format!("{} does not accept raw strings", sink),
                )),
            },
            _ => Err(self.preconditions.hard(
                ErrorKind::WrongValueKind,
                format!("{} does not accept {}", sink, value.kind()),
            )),
        }
    }

    /// Writes `value` into the element property `sink` targets.
    ///
    /// This is the data-driven entry point behind every property sink:
    /// guard, coerce, relay the nonce if the sink requires it, then assign.
    /// For `LINK` targets the sink is re-derived from the element's current
    /// `rel`, so a stylesheet link still accepts only a [`TrustedResourceUrl`].
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition; nothing is written in that case.
    /// Sinks that do not write an element property fail with
    /// [`ErrorKind::WrongValueKind`].
    pub fn write_property(
        &self,
        sink: SinkId,
        element: &dyn Element,
        value: SinkValue<'_>,
    ) -> Result<(), SafeDomError> {
        let sink = match sink {
            SinkId::LinkHref | SinkId::LinkStylesheetHref => link_sink_for(
                &element
                    .property("rel")
                    .or_else(|| element.attribute("rel"))
                    .unwrap_or_default(),
            ),
            other => other,
        };
        let policy = sink.policy();
        let Some(property) = policy.property else {
            return Err(self.preconditions.hard(
                ErrorKind::WrongValueKind,
                format!("{} does not write an element property", sink),
            ));
        };

        self.check_target(sink, element)?;
        let resolved = self.resolve(sink, value)?;
        if let Some(source) = policy.nonce {
            nonce::relay_nonce(element, &self.window, source);
        }
        element.set_property(property, &resolved);
        tracing::debug!(target: "safe_dom", %sink, property, len = resolved.len(), "sink write");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Markup sinks
    // ------------------------------------------------------------------

    /// Inserts vetted HTML relative to `node`.
    ///
    /// # Errors
    ///
    /// Never fails for vetted HTML; the `Result` keeps the sink signatures uniform.
    pub fn insert_adjacent_html(
        &self,
        node: &dyn Element,
        position: AdjacentPosition,
        html: &SafeHtml,
    ) -> Result<(), SafeDomError> {
        let sink = SinkId::InsertAdjacentHtml;
        self.check_target(sink, node)?;
        let resolved = self.resolve(sink, html.into())?;
        node.insert_adjacent_html(position, &resolved);
        tracing::debug!(target: "safe_dom", %sink, %position, len = resolved.len(), "sink write");
        Ok(())
    }

    /// Assigns `innerHTML`.
    ///
    /// # Errors
    ///
    /// Fails unconditionally for SCRIPT and STYLE targets.
    pub fn set_inner_html(
        &self,
        element: &dyn Element,
        html: &SafeHtml,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::InnerHtml, element, html.into())
    }

    /// Assigns `innerHTML` from a compile-time constant, without sanitization.
    ///
    /// # Errors
    ///
    /// Fails unconditionally for SCRIPT and STYLE targets.
    pub fn set_inner_html_from_constant(
        &self,
        element: &dyn Element,
        html: Const,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::InnerHtmlFromConstant, element, html.into())
    }

    /// Assigns `outerHTML`.
    ///
    /// # Errors
    ///
    /// Fails unconditionally for SCRIPT and STYLE targets.
    pub fn set_outer_html(
        &self,
        element: &dyn Element,
        html: &SafeHtml,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::OuterHtml, element, html.into())
    }

    /// Assigns the inline style declarations (`style.cssText`).
    ///
    /// # Errors
    ///
    /// Never fails for vetted styles.
    pub fn set_style(&self, element: &dyn Element, style: &SafeStyle) -> Result<(), SafeDomError> {
        self.write_property(SinkId::Style, element, style.into())
    }

    /// Calls `document.write` with vetted HTML.
    ///
    /// # Errors
    ///
    /// Never fails for vetted HTML.
    pub fn document_write(
        &self,
        document: &dyn Document,
        html: &SafeHtml,
    ) -> Result<(), SafeDomError> {
        let sink = SinkId::DocumentWrite;
        self.check_target(sink, document)?;
        let resolved = self.resolve(sink, html.into())?;
        document.write(&resolved);
        tracing::debug!(target: "safe_dom", %sink, len = resolved.len(), "sink write");
        Ok(())
    }

    /// Assigns `srcdoc` on an IFRAME.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `iframe` is not an IFRAME.
    pub fn set_iframe_srcdoc(
        &self,
        iframe: &dyn Element,
        html: &SafeHtml,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::IframeSrcdoc, iframe, html.into())
    }

    // ------------------------------------------------------------------
    // Navigation sinks
    // ------------------------------------------------------------------

    /// Sets `rel` and `href` on a LINK.
    ///
    /// If `rel` names a stylesheet (tokens split on commas or whitespace,
    /// any case), only a [`TrustedResourceUrl`] is accepted and the document's
    /// style nonce is relayed onto the link. Otherwise a [`SafeUrl`], a
    /// [`TrustedResourceUrl`] or a sanitized raw string is accepted.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `link` is not a LINK; fails hard for a value
    /// kind the `rel` does not allow. `rel` is left untouched on failure.
    pub fn set_link_href_and_rel<'a>(
        &self,
        link: &dyn Element,
        url: impl Into<SinkValue<'a>>,
        rel: &str,
    ) -> Result<(), SafeDomError> {
        let sink = link_sink_for(rel);
        self.check_target(sink, link)?;
        let resolved = self.resolve(sink, url.into())?;

        link.set_property("rel", rel);
        if let Some(source) = sink.policy().nonce {
            nonce::relay_nonce(link, &self.window, source);
        }
        link.set_property("href", &resolved);
        tracing::debug!(target: "safe_dom", %sink, len = resolved.len(), "sink write");
        Ok(())
    }

    /// Assigns `location.href`.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `location` is not location-like; a rejected
    /// raw URL fails unless the handler lets the sentinel through.
    pub fn set_location_href<'a>(
        &self,
        location: &dyn LocationLike,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        let resolved = self.navigate(SinkId::LocationHref, location, url_value(url))?;
        location.set_href(&resolved);
        Ok(())
    }

    /// Calls `location.replace`.
    ///
    /// # Errors
    ///
    /// As [`set_location_href`](Self::set_location_href).
    pub fn replace_location<'a>(
        &self,
        location: &dyn LocationLike,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        let resolved = self.navigate(SinkId::LocationReplace, location, url_value(url))?;
        location.replace(&resolved);
        Ok(())
    }

    /// Calls `location.assign`.
    ///
    /// # Errors
    ///
    /// As [`set_location_href`](Self::set_location_href).
    pub fn assign_location<'a>(
        &self,
        location: &dyn LocationLike,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        let resolved = self.navigate(SinkId::LocationAssign, location, url_value(url))?;
        location.assign(&resolved);
        Ok(())
    }

    fn navigate(
        &self,
        sink: SinkId,
        location: &dyn LocationLike,
        url: SinkValue<'_>,
    ) -> Result<String, SafeDomError> {
        self.check_target(sink, location)?;
        let resolved = self.resolve(sink, url)?;
        tracing::debug!(target: "safe_dom", %sink, len = resolved.len(), "sink write");
        Ok(resolved)
    }

    /// Assigns `href` on an A element.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `anchor` is not an A.
    pub fn set_anchor_href<'a>(
        &self,
        anchor: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::AnchorHref, anchor, url_value(url))
    }

    /// Assigns `formAction` on an INPUT.
    ///
    /// Identity mismatches are recoverable: duck-typed stand-ins are written
    /// to when the handler lets them through.
    ///
    /// # Errors
    ///
    /// Fails when a mismatch or a rejected URL is reported and the handler aborts.
    pub fn set_input_form_action<'a>(
        &self,
        input: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::InputFormAction, input, url_value(url))
    }

    /// Assigns `formAction` on a BUTTON.
    ///
    /// # Errors
    ///
    /// As [`set_input_form_action`](Self::set_input_form_action).
    pub fn set_button_form_action<'a>(
        &self,
        button: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::ButtonFormAction, button, url_value(url))
    }

    /// Assigns `action` on a FORM.
    ///
    /// # Errors
    ///
    /// As [`set_input_form_action`](Self::set_input_form_action).
    pub fn set_form_element_action<'a>(
        &self,
        form: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::FormAction, form, url_value(url))
    }

    /// Opens `url` in a window, using the ambient window unless `opener` is given.
    ///
    /// Returns the opened window handle, if the host produced one.
    ///
    /// # Errors
    ///
    /// A rejected raw URL fails unless the handler lets the sentinel through.
    pub fn open_in_window<'a>(
        &self,
        url: impl Into<UrlInput<'a>>,
        opener: Option<&dyn Window>,
        name: Option<Const>,
        features: &str,
    ) -> Result<Option<Rc<dyn Window>>, SafeDomError> {
        let sink = SinkId::OpenInWindow;
        let resolved = self.resolve(sink, url_value(url))?;
        let name = name.map_or("", |name| name.as_str());
        tracing::debug!(target: "safe_dom", %sink, len = resolved.len(), "sink write");
        Ok(match opener {
            Some(window) => window.open(&resolved, name, features),
            None => self.window.open(&resolved, name, features),
        })
    }

    // ------------------------------------------------------------------
    // Media and resource sinks
    // ------------------------------------------------------------------

    /// Assigns `src` on an AUDIO element; raw `data:audio/*` URLs are allowed.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `audio` is not an AUDIO.
    pub fn set_audio_src<'a>(
        &self,
        audio: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::AudioSrc, audio, url_value(url))
    }

    /// Assigns `src` on a VIDEO element; raw `data:video/*` URLs are allowed.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `video` is not a VIDEO.
    pub fn set_video_src<'a>(
        &self,
        video: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::VideoSrc, video, url_value(url))
    }

    /// Assigns `src` on an IMG element; raw `data:image/*` URLs are allowed.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `image` is not an IMG.
    pub fn set_image_src<'a>(
        &self,
        image: &dyn Element,
        url: impl Into<UrlInput<'a>>,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::ImageSrc, image, url_value(url))
    }

    /// Assigns `src` on an EMBED.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `embed` is not an EMBED.
    pub fn set_embed_src(
        &self,
        embed: &dyn Element,
        url: &TrustedResourceUrl,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::EmbedSrc, embed, url.into())
    }

    /// Assigns `src` on a FRAME.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `frame` is not a FRAME.
    pub fn set_frame_src(
        &self,
        frame: &dyn Element,
        url: &TrustedResourceUrl,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::FrameSrc, frame, url.into())
    }

    /// Assigns `src` on an IFRAME.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `iframe` is not an IFRAME.
    pub fn set_iframe_src(
        &self,
        iframe: &dyn Element,
        url: &TrustedResourceUrl,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::IframeSrc, iframe, url.into())
    }

    /// Assigns `data` on an OBJECT.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `object` is not an OBJECT.
    pub fn set_object_data(
        &self,
        object: &dyn Element,
        url: &TrustedResourceUrl,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::ObjectData, object, url.into())
    }

    /// Assigns `src` on a SCRIPT, relaying the owning document's script nonce first.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `script` is not a SCRIPT.
    pub fn set_script_src(
        &self,
        script: &dyn Element,
        url: &TrustedResourceUrl,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::ScriptSrc, script, url.into())
    }

    /// Assigns the text of a SCRIPT, relaying the owning document's script nonce first.
    ///
    /// # Errors
    ///
    /// Fails unconditionally if `script` is not a SCRIPT.
    pub fn set_script_content(
        &self,
        script: &dyn Element,
        content: &SafeScript,
    ) -> Result<(), SafeDomError> {
        self.write_property(SinkId::ScriptContent, script, content.into())
    }

    /// Creates an image displaying `blob`.
    ///
    /// The object URL is assigned synchronously and revoked when the image
    /// finishes loading.
    ///
    /// # Errors
    ///
    /// Fails hard, before any object URL or image exists, unless the blob's
    /// MIME type is `image/*`.
    pub fn create_image_from_blob(&self, blob: &Blob) -> Result<Rc<dyn Element>, SafeDomError> {
        if !MimePattern::Image.matches(blob.mime_type()) {
            return Err(self.preconditions.hard(
                ErrorKind::InvalidBlob,
                format!(
                    "create-image-from-blob only accepts MIME type image/*, got '{}'",
                    blob.mime_type()
                ),
            ));
        }

        let object_url = self.window.create_object_url(blob);
        let image = self.window.create_image();

        // Weak: the host may keep the image (and so this callback) alive.
        let window = Rc::downgrade(&self.window);
        let revoked = object_url.clone();
        image.set_onload(Box::new(move || {
            if let Some(window) = window.upgrade() {
                window.revoke_object_url(&revoked);
            }
        }));

        // Minted by the host for this blob, so vetted by construction.
        let src = SafeUrl::new_unchecked(object_url.as_str());
        if let Err(error) = self.set_image_src(image.as_ref(), &src) {
            self.window.revoke_object_url(&object_url);
            return Err(error);
        }
        Ok(image)
    }

    // ------------------------------------------------------------------
    // Parsing sinks
    // ------------------------------------------------------------------

    /// Parses vetted HTML as `text/html`.
    ///
    /// # Errors
    ///
    /// Never fails for vetted HTML.
    pub fn parse_from_string_html<P: DomParser>(
        &self,
        parser: &P,
        html: &SafeHtml,
    ) -> Result<P::Output, SafeDomError> {
        self.parse_from_string(parser, html, "text/html")
    }

    /// Parses vetted markup as `mime_type` (e.g. `application/xml`).
    ///
    /// # Errors
    ///
    /// Never fails for vetted markup.
    pub fn parse_from_string<P: DomParser>(
        &self,
        parser: &P,
        content: &SafeHtml,
        mime_type: &str,
    ) -> Result<P::Output, SafeDomError> {
        let sink = SinkId::ParseFromString;
        let resolved = self.resolve(sink, content.into())?;
        tracing::debug!(target: "safe_dom", %sink, mime_type, len = resolved.len(), "sink write");
        Ok(parser.parse_from_string(&resolved, mime_type))
    }

    /// Creates a document fragment from vetted HTML in the context of `range`.
    ///
    /// # Errors
    ///
    /// Never fails for vetted HTML.
    pub fn create_contextual_fragment<R: Range>(
        &self,
        range: &R,
        html: &SafeHtml,
    ) -> Result<R::Fragment, SafeDomError> {
        let sink = SinkId::ContextualFragment;
        let resolved = self.resolve(sink, html.into())?;
        tracing::debug!(target: "safe_dom", %sink, len = resolved.len(), "sink write");
        Ok(range.create_contextual_fragment(&resolved))
    }

    // ------------------------------------------------------------------
    // Nonces
    // ------------------------------------------------------------------

    /// Reads the script nonce of `window` (the ambient window by default).
    ///
    /// Rescans the document on every call.
    pub fn read_script_nonce(&self, window: Option<&dyn Window>) -> Option<String> {
        self.read_nonce(window, NonceSource::Script)
    }

    /// Reads the style nonce of `window` (the ambient window by default).
    pub fn read_style_nonce(&self, window: Option<&dyn Window>) -> Option<String> {
        self.read_nonce(window, NonceSource::Style)
    }

    fn read_nonce(&self, window: Option<&dyn Window>, source: NonceSource) -> Option<String> {
        let document = match window {
            Some(window) => window.document(),
            None => self.window.document(),
        };
        nonce::read_nonce(document.as_ref(), source)
    }
}

/// The link sink is chosen by `rel`, never by the caller.
fn link_sink_for(rel: &str) -> SinkId {
    if rel_includes_stylesheet(rel) {
        SinkId::LinkStylesheetHref
    } else {
        SinkId::LinkHref
    }
}

fn url_value<'a>(url: impl Into<UrlInput<'a>>) -> SinkValue<'a> {
    let url: UrlInput<'a> = url.into();
    url.into()
}

impl fmt::Debug for SafeDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeDom")
            .field("window", &self.window.identity())
            .field("sanitizer", &self.sanitizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryElement, MemoryWindow};
    use crate::precondition::{RecordingHandler, Severity};
    use crate::sanitizer::INNOCUOUS_URL;

    fn setup() -> (Rc<MemoryWindow>, SafeDom) {
        let window = MemoryWindow::new();
        let dom = SafeDom::new(window.clone());
        (window, dom)
    }

    #[test]
    fn resolve_unwraps_accepted_kinds() {
        let (_window, dom) = setup();
        let html = SafeHtml::new_unchecked("<i>x</i>");

        assert_eq!(dom.resolve(SinkId::InnerHtml, (&html).into()).unwrap(), "<i>x</i>");
    }

    #[test]
    fn resolve_rejects_wrong_kinds_hard() {
        let (_window, dom) = setup();
        let url = SafeUrl::new_unchecked("https://example.com/");

        let error = dom.resolve(SinkId::IframeSrc, (&url).into()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongValueKind);
        assert_eq!(error.severity(), Severity::Hard);

        let error = dom.resolve(SinkId::ScriptSrc, SinkValue::Raw("https://x/")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongValueKind);
    }

    #[test]
    fn write_property_refuses_non_property_sinks() {
        let (_window, dom) = setup();
        let div = MemoryElement::detached("div");
        let html = SafeHtml::new_unchecked("<p>");

        let error = dom
            .write_property(SinkId::DocumentWrite, &*div, (&html).into())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongValueKind);
    }

    #[test]
    fn guard_runs_before_coercion() {
        let (_window, dom) = setup();
        let recorder = Rc::new(RecordingHandler::new());
        let _guard = dom.install_handler(recorder.clone());
        let div = MemoryElement::detached("div");

        let error = dom.set_anchor_href(&*div, "javascript:x").unwrap_err();

        // Only the identity failure was reported; the URL was never looked at.
        assert_eq!(error.kind(), ErrorKind::IdentityMismatch);
        assert_eq!(recorder.len(), 1);
        assert_eq!(div.property("href"), None);
    }

    #[test]
    fn rejected_url_writes_sentinel_when_handler_continues() {
        let (window, dom) = setup();
        let _guard = dom.install_handler(Rc::new(RecordingHandler::new()));
        let anchor = window.memory_document().create_element("a");

        dom.set_anchor_href(&*anchor, "javascript:alert(1)").unwrap();
        assert_eq!(anchor.property("href").as_deref(), Some(INNOCUOUS_URL));
    }

    #[test]
    fn custom_sanitizer_is_used() {
        let window = MemoryWindow::new();
        let sanitizer = UrlSanitizer::default().allow_scheme("tel").unwrap();
        let dom = SafeDom::new(window.clone()).with_url_sanitizer(sanitizer);
        let anchor = window.memory_document().create_element("a");

        dom.set_anchor_href(&*anchor, "tel:+15551234").unwrap();
        assert_eq!(anchor.property("href").as_deref(), Some("tel:+15551234"));
    }

    #[test]
    fn failed_blob_assignment_revokes_url() {
        struct OddWindow {
            inner: Rc<MemoryWindow>,
        }

        impl HostObject for OddWindow {
            fn identity(&self) -> crate::host::Identity {
                crate::host::Identity::Window
            }
        }

        impl Window for OddWindow {
            fn document(&self) -> Rc<dyn Document> {
                self.inner.document()
            }
            fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn Window>> {
                self.inner.open(url, name, features)
            }
            fn create_image(&self) -> Rc<dyn Element> {
                // Not an IMG: the image sink refuses it.
                MemoryElement::detached("canvas")
            }
            fn create_object_url(&self, blob: &Blob) -> String {
                self.inner.create_object_url(blob)
            }
            fn revoke_object_url(&self, url: &str) {
                self.inner.revoke_object_url(url)
            }
        }

        let inner = MemoryWindow::new();
        let dom = SafeDom::new(Rc::new(OddWindow {
            inner: inner.clone(),
        }));

        let result = dom.create_image_from_blob(&Blob::new(vec![0u8; 4], "image/png"));

        assert_eq!(result.err().unwrap().kind(), ErrorKind::IdentityMismatch);
        assert_eq!(inner.minted_object_urls(), 1);
        assert!(inner.live_object_urls().is_empty());
    }

    #[test]
    fn debug_output_omits_handler() {
        let (_window, dom) = setup();
        let debug_output = format!("{:?}", dom);
        assert!(debug_output.starts_with("SafeDom"));
        assert!(debug_output.contains("Window"));
    }
}
