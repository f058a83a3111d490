//! In-memory host implementation.
//!
//! A small recording DOM used by tests, demos and doc examples. It models
//! only what the sink operations observe: properties and attributes, the
//! browser's blanking of the `nonce` attribute on connected elements,
//! `document.write` output, navigations, opened windows, object URLs and
//! load callbacks. Markup is stored verbatim and never parsed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::host::{
    AdjacentPosition, Blob, Document, DomParser, Element, HostObject, Identity, LocationLike,
    Range, Window,
};

/// A recorded element.
pub struct MemoryElement {
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    properties: RefCell<BTreeMap<String, String>>,
    adjacent: RefCell<Vec<(AdjacentPosition, String)>>,
    onload: RefCell<Option<Box<dyn FnOnce()>>>,
    owner: RefCell<Weak<MemoryDocument>>,
    connected: Cell<bool>,
}

impl MemoryElement {
    /// Creates a detached element with no owner document.
    pub fn detached(tag: &str) -> Rc<Self> {
        Rc::new(Self {
            tag: tag.to_ascii_uppercase(),
            attributes: RefCell::new(BTreeMap::new()),
            properties: RefCell::new(BTreeMap::new()),
            adjacent: RefCell::new(Vec::new()),
            onload: RefCell::new(None),
            owner: RefCell::new(Weak::new()),
            connected: Cell::new(false),
        })
    }

    /// Returns the uppercase tag name.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Returns true while the element is attached to its document.
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Returns the markup inserted with `insertAdjacentHTML`, in call order.
    pub fn adjacent_html(&self) -> Vec<(AdjacentPosition, String)> {
        self.adjacent.borrow().clone()
    }

    /// Fires the pending load callback, if any. Returns true if one ran.
    pub fn dispatch_load(&self) -> bool {
        // Taken out first so the callback may touch this element again.
        let callback = self.onload.borrow_mut().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl HostObject for MemoryElement {
    fn identity(&self) -> Identity {
        Identity::Element(self.tag.clone())
    }
}

impl Element for MemoryElement {
    fn set_property(&self, name: &str, value: &str) {
        self.properties
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn property(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.borrow().get(name) {
            return Some(value.clone());
        }
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        // Reflected into the IDL property, as browsers do for `nonce`, `src`, `href`...
        self.properties
            .borrow_mut()
            .insert(name.clone(), value.to_string());
        self.attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let value = self.attributes.borrow().get(&name).cloned()?;
        if name == "nonce" && self.connected.get() {
            return Some(String::new());
        }
        Some(value)
    }

    fn insert_adjacent_html(&self, position: AdjacentPosition, html: &str) {
        self.adjacent
            .borrow_mut()
            .push((position, html.to_string()));
    }

    fn owner_document(&self) -> Option<Rc<dyn Document>> {
        self.owner
            .borrow()
            .upgrade()
            .map(|document| document as Rc<dyn Document>)
    }

    fn set_onload(&self, callback: Box<dyn FnOnce()>) {
        *self.onload.borrow_mut() = Some(callback);
    }
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryElement")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes.borrow())
            .field("connected", &self.connected.get())
            .finish_non_exhaustive()
    }
}

/// A recorded document.
pub struct MemoryDocument {
    this: Weak<MemoryDocument>,
    elements: RefCell<Vec<Rc<MemoryElement>>>,
    written: RefCell<String>,
    view: RefCell<Weak<MemoryWindow>>,
}

impl MemoryDocument {
    /// Creates a document with no window.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            elements: RefCell::new(Vec::new()),
            written: RefCell::new(String::new()),
            view: RefCell::new(Weak::new()),
        })
    }

    /// Creates an element owned by this document but not yet connected.
    pub fn create_element(&self, tag: &str) -> Rc<MemoryElement> {
        let element = MemoryElement::detached(tag);
        *element.owner.borrow_mut() = self.this.clone();
        element
    }

    /// Connects `element` to this document.
    pub fn append(&self, element: &Rc<MemoryElement>) {
        *element.owner.borrow_mut() = self.this.clone();
        element.connected.set(true);
        self.elements.borrow_mut().push(Rc::clone(element));
    }

    /// Disconnects `element` from this document.
    pub fn remove(&self, element: &Rc<MemoryElement>) {
        self.elements
            .borrow_mut()
            .retain(|candidate| !Rc::ptr_eq(candidate, element));
        element.connected.set(false);
    }

    /// Returns everything passed to `document.write` so far.
    pub fn written(&self) -> String {
        self.written.borrow().clone()
    }
}

impl HostObject for MemoryDocument {
    fn identity(&self) -> Identity {
        Identity::Document
    }
}

impl Document for MemoryDocument {
    fn write(&self, html: &str) {
        self.written.borrow_mut().push_str(html);
    }

    fn elements_by_tag_name(&self, tag: &str) -> Vec<Rc<dyn Element>> {
        self.elements
            .borrow()
            .iter()
            .filter(|element| element.tag.eq_ignore_ascii_case(tag))
            .map(|element| Rc::clone(element) as Rc<dyn Element>)
            .collect()
    }

    fn default_view(&self) -> Option<Rc<dyn Window>> {
        self.view
            .borrow()
            .upgrade()
            .map(|window| window as Rc<dyn Window>)
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("elements", &self.elements.borrow().len())
            .finish_non_exhaustive()
    }
}

/// How a [`MemoryLocation`] was asked to navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMethod {
    /// `location.href = url`
    Href,
    /// `location.assign(url)`
    Assign,
    /// `location.replace(url)`
    Replace,
}

/// A recorded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// How the navigation was requested
    pub method: NavigationMethod,
    /// Target URL
    pub url: String,
}

/// A recorded `Location`.
#[derive(Debug)]
pub struct MemoryLocation {
    href: RefCell<String>,
    navigations: RefCell<Vec<Navigation>>,
}

impl MemoryLocation {
    /// Creates a location at `about:blank`.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            href: RefCell::new("about:blank".to_string()),
            navigations: RefCell::new(Vec::new()),
        })
    }

    /// Returns the current URL.
    pub fn href(&self) -> String {
        self.href.borrow().clone()
    }

    /// Returns every navigation, oldest first.
    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.borrow().clone()
    }

    fn navigate(&self, method: NavigationMethod, url: &str) {
        *self.href.borrow_mut() = url.to_string();
        self.navigations.borrow_mut().push(Navigation {
            method,
            url: url.to_string(),
        });
    }
}

impl HostObject for MemoryLocation {
    fn identity(&self) -> Identity {
        Identity::Location
    }
}

impl LocationLike for MemoryLocation {
    fn set_href(&self, url: &str) {
        self.navigate(NavigationMethod::Href, url);
    }

    fn assign(&self, url: &str) {
        self.navigate(NavigationMethod::Assign, url);
    }

    fn replace(&self, url: &str) {
        self.navigate(NavigationMethod::Replace, url);
    }
}

/// Arguments of a recorded `window.open` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedWindow {
    /// URL passed to `open`
    pub url: String,
    /// Target browsing context name
    pub name: String,
    /// Window features string
    pub features: String,
}

/// A recorded window with its own document and location.
pub struct MemoryWindow {
    document: Rc<MemoryDocument>,
    location: Rc<MemoryLocation>,
    opened: RefCell<Vec<OpenedWindow>>,
    images: RefCell<Vec<Rc<MemoryElement>>>,
    object_urls: RefCell<Vec<String>>,
    minted: Cell<u64>,
}

impl MemoryWindow {
    /// Creates a window displaying a fresh, empty document.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<MemoryWindow>| {
            let document = MemoryDocument::new();
            *document.view.borrow_mut() = this.clone();
            Self {
                document,
                location: MemoryLocation::new(),
                opened: RefCell::new(Vec::new()),
                images: RefCell::new(Vec::new()),
                object_urls: RefCell::new(Vec::new()),
                minted: Cell::new(0),
            }
        })
    }

    /// Returns the concrete document.
    pub fn memory_document(&self) -> Rc<MemoryDocument> {
        Rc::clone(&self.document)
    }

    /// Returns the window's location.
    pub fn location(&self) -> Rc<MemoryLocation> {
        Rc::clone(&self.location)
    }

    /// Returns every `open` call, oldest first.
    pub fn opened(&self) -> Vec<OpenedWindow> {
        self.opened.borrow().clone()
    }

    /// Returns every image created through [`Window::create_image`].
    pub fn images(&self) -> Vec<Rc<MemoryElement>> {
        self.images.borrow().clone()
    }

    /// Returns the object URLs minted and not yet revoked.
    pub fn live_object_urls(&self) -> Vec<String> {
        self.object_urls.borrow().clone()
    }

    /// Returns how many object URLs were ever minted.
    pub fn minted_object_urls(&self) -> u64 {
        self.minted.get()
    }
}

impl HostObject for MemoryWindow {
    fn identity(&self) -> Identity {
        Identity::Window
    }
}

impl Window for MemoryWindow {
    fn document(&self) -> Rc<dyn Document> {
        Rc::clone(&self.document) as Rc<dyn Document>
    }

    fn open(&self, url: &str, name: &str, features: &str) -> Option<Rc<dyn Window>> {
        self.opened.borrow_mut().push(OpenedWindow {
            url: url.to_string(),
            name: name.to_string(),
            features: features.to_string(),
        });
        let opened: Rc<dyn Window> = MemoryWindow::new();
        Some(opened)
    }

    fn create_image(&self) -> Rc<dyn Element> {
        let image = self.document.create_element("img");
        self.images.borrow_mut().push(Rc::clone(&image));
        image
    }

    fn create_object_url(&self, _blob: &Blob) -> String {
        let serial = self.minted.get() + 1;
        self.minted.set(serial);
        let url = format!("blob:memory/{}", serial);
        self.object_urls.borrow_mut().push(url.clone());
        url
    }

    fn revoke_object_url(&self, url: &str) {
        self.object_urls.borrow_mut().retain(|live| live != url);
    }
}

impl fmt::Debug for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryWindow")
            .field("document", &self.document)
            .field("location", &self.location.href())
            .finish_non_exhaustive()
    }
}

/// Result of [`MemoryParser`]: the markup and the MIME type it was parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Markup handed to the parser
    pub markup: String,
    /// Requested MIME type
    pub mime_type: String,
}

/// A `DOMParser` that records its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryParser;

impl DomParser for MemoryParser {
    type Output = ParsedDocument;

    fn parse_from_string(&self, markup: &str, mime_type: &str) -> ParsedDocument {
        ParsedDocument {
            markup: markup.to_string(),
            mime_type: mime_type.to_string(),
        }
    }
}

/// Fragment produced by [`MemoryRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFragment {
    /// Markup the fragment was created from
    pub markup: String,
}

/// A `Range` that records its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryRange;

impl Range for MemoryRange {
    type Fragment = MemoryFragment;

    fn create_contextual_fragment(&self, html: &str) -> MemoryFragment {
        MemoryFragment {
            markup: html.to_string(),
        }
    }
}
