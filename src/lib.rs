//! Safe wrappers around dangerous DOM sinks.
//!
//! This crate mediates every write into a DOM API that can execute script or
//! load active content (`innerHTML`, `document.write`, `location.href`,
//! `script.src`, `iframe.srcdoc`, ...). Writes succeed only when:
//! - **The value is vetted**: it is wrapped in the [`Vetted`] kind the sink
//!   accepts, or it is a raw URL that passes the [`UrlSanitizer`]
//! - **The target is what it claims**: the identity guards check the host
//!   object before any mutation
//!
//! Script and stylesheet loads additionally receive the page's CSP nonce.
//!
//! # Core Types
//!
//! - [`SafeDom`]: The sink operations, bound to an ambient [`Window`]
//! - [`SafeHtml`], [`SafeScript`], [`SafeStyle`], [`SafeUrl`],
//!   [`TrustedResourceUrl`]: Vetted values, written verbatim
//! - [`Const`]: Compile-time constant strings
//! - [`Preconditions`] / [`FailureHandler`]: How failed checks are reported
//! - [`SinkId`] / [`SinkPolicy`]: The per-sink policy table
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use safe_dom::memory::MemoryWindow;
//! use safe_dom::{Element, RecordingHandler, SafeDom, TrustedResourceUrl, INNOCUOUS_URL};
//!
//! let window = MemoryWindow::new();
//! let dom = SafeDom::new(window.clone());
//! let document = window.memory_document();
//!
//! // The page's script nonce is relayed onto scripts we load.
//! let page_script = document.create_element("script");
//! page_script.set_attribute("nonce", "r4nd0m");
//! document.append(&page_script);
//!
//! let script = document.create_element("script");
//! let src = TrustedResourceUrl::new_unchecked("https://cdn.example/app.js");
//! dom.set_script_src(&*script, &src).unwrap();
//! assert_eq!(script.property("nonce").as_deref(), Some("r4nd0m"));
//!
//! // Unsafe raw URLs are reported; a lenient handler gets the sentinel.
//! let recorder = Rc::new(RecordingHandler::new());
//! let _guard = dom.install_handler(recorder.clone());
//! let anchor = document.create_element("a");
//! dom.set_anchor_href(&*anchor, "javascript:evil()").unwrap();
//! assert_eq!(anchor.property("href").as_deref(), Some(INNOCUOUS_URL));
//! assert_eq!(recorder.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dom;
mod error;
mod guard;
mod host;
pub mod memory;
mod nonce;
mod precondition;
mod sanitizer;
mod sink;
mod value;
mod vetted;

#[cfg(test)]
mod test_utils;

pub use dom::SafeDom;
pub use error::{ErrorKind, SafeDomError};
pub use guard::{TargetClass, assert_is_location_like, assert_not_tags, assert_tag, classify};
pub use host::{
    AdjacentPosition, Blob, Document, DomParser, Element, HostObject, Identity, LocationLike,
    Range, Window,
};
pub use nonce::{NonceSource, read_nonce};
pub use precondition::{
    AbortHandler, Disposition, FailureHandler, HandlerGuard, PreconditionFailure, Preconditions,
    RecordingHandler, Severity,
};
pub use sanitizer::{INNOCUOUS_URL, MimePattern, SanitizationVerdict, UrlSanitizer};
pub use sink::{RawStrings, SinkId, SinkPolicy, TargetRequirement};
pub use value::{SinkValue, UrlInput, ValueKind};
pub use vetted::{
    Const, Html, ResourceUrl, SafeHtml, SafeScript, SafeStyle, SafeUrl, Script, Style,
    TrustedResourceUrl, Url, Vetted, VettedKind,
};
