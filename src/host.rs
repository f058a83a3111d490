//! Interfaces the host environment implements for the sink operations.
//!
//! This module contains no browser bindings. It defines the minimal surface
//! the sink operations need from DOM nodes, documents, windows and locations;
//! a binding layer (or the in-memory [`memory`](crate::memory) host) supplies
//! the implementations.
//!
//! Every host object reports its runtime [`Identity`] and answers structural
//! capability checks through [`HostObject`], which is what the identity
//! guards inspect before any mutation.

use std::fmt;
use std::rc::Rc;

/// Runtime identity a host object reports for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// An element, with its tag name as reported by the host.
    Element(String),
    /// A genuine `Location`.
    Location,
    /// A genuine `Window`.
    Window,
    /// A genuine `Document`.
    Document,
    /// Any other object, named by its interface or constructor.
    Other(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(tag) => write!(f, "Element <{}>", tag.to_ascii_uppercase()),
            Self::Location => write!(f, "Location"),
            Self::Window => write!(f, "Window"),
            Self::Document => write!(f, "Document"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Behavior shared by every object a sink can target.
pub trait HostObject {
    /// Returns the object's runtime identity.
    fn identity(&self) -> Identity;

    /// Returns true if the object exposes a member called `name`.
    ///
    /// Genuine host objects expose their whole interface; mocks override this
    /// to describe the shape they actually have.
    fn has_member(&self, name: &str) -> bool {
        let _ = name;
        true
    }
}

/// Where [`Element::insert_adjacent_html`] places markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacentPosition {
    /// Before the element itself.
    BeforeBegin,
    /// Inside the element, before its first child.
    AfterBegin,
    /// Inside the element, after its last child.
    BeforeEnd,
    /// After the element itself.
    AfterEnd,
}

impl AdjacentPosition {
    /// Returns the DOM spelling of the position.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
        }
    }
}

impl fmt::Display for AdjacentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DOM element.
///
/// Properties are addressed by their IDL names (`innerHTML`, `src`, `href`,
/// `formAction`, `textContent`, `nonce`, ...). Implementations must keep the
/// `nonce` property readable after the element is connected, even though
/// the `nonce` attribute is blanked at that point.
pub trait Element: HostObject {
    /// Assigns an IDL property.
    fn set_property(&self, name: &str, value: &str);

    /// Reads an IDL property.
    fn property(&self, name: &str) -> Option<String>;

    /// Sets a content attribute.
    fn set_attribute(&self, name: &str, value: &str);

    /// Reads a content attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Parses `html` and inserts it relative to this element.
    fn insert_adjacent_html(&self, position: AdjacentPosition, html: &str);

    /// Returns the document that owns this element, if any.
    fn owner_document(&self) -> Option<Rc<dyn Document>>;

    /// Registers a callback fired once, when the element finishes loading.
    fn set_onload(&self, callback: Box<dyn FnOnce()>);
}

/// A DOM document.
pub trait Document: HostObject {
    /// Appends markup to the document's parser input.
    fn write(&self, html: &str);

    /// Returns the connected elements with tag `tag`, in tree order.
    fn elements_by_tag_name(&self, tag: &str) -> Vec<Rc<dyn Element>>;

    /// Returns the window displaying this document, if any.
    fn default_view(&self) -> Option<Rc<dyn Window>>;
}

/// A browsing context.
pub trait Window: HostObject {
    /// Returns the active document.
    fn document(&self) -> Rc<dyn Document>;

    /// Opens `url` in a new or named browsing context.
    fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn Window>>;

    /// Creates an `HTMLImageElement` in this window's document.
    fn create_image(&self) -> Rc<dyn Element>;

    /// Mints an object URL for `blob`.
    fn create_object_url(&self, blob: &Blob) -> String;

    /// Releases an object URL minted by [`create_object_url`](Self::create_object_url).
    fn revoke_object_url(&self, url: &str);
}

/// A `Location`, or anything with the same navigation shape.
pub trait LocationLike: HostObject {
    /// Assigns `href`.
    fn set_href(&self, url: &str);

    /// Navigates to `url`, adding a history entry.
    fn assign(&self, url: &str);

    /// Navigates to `url`, replacing the current history entry.
    fn replace(&self, url: &str);
}

/// A `DOMParser`.
pub trait DomParser {
    /// What parsing produces (typically a document handle).
    type Output;

    /// Parses `markup` as `mime_type`.
    fn parse_from_string(&self, markup: &str, mime_type: &str) -> Self::Output;
}

/// A DOM `Range`.
pub trait Range {
    /// What fragment creation produces.
    type Fragment;

    /// Parses `html` in the context of the range's start node.
    fn create_contextual_fragment(&self, html: &str) -> Self::Fragment;
}

/// Binary data with a declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    mime_type: String,
    bytes: Vec<u8>,
}

impl Blob {
    /// Creates a blob.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns the declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the blob contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
