//! Basic sink mediation demonstration.
//!
//! This example walks through the core pattern of safe-dom:
//! 1. Vetted values are written verbatim
//! 2. Raw URLs are sanitized, falling back to an inert URL
//! 3. Targets are checked before anything is mutated
//! 4. Script loads inherit the page's CSP nonce
//!
//! Run with: `cargo run --example basic_sink_flow`

use std::rc::Rc;

use safe_dom::memory::MemoryWindow;
use safe_dom::{
    Blob, Element, RecordingHandler, SafeDom, SafeHtml, TrustedResourceUrl, UrlSanitizer,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(true)
        .init();

    println!("=== Basic Sink Flow Example ===\n");

    let window = MemoryWindow::new();
    let document = window.memory_document();
    let dom = SafeDom::new(window.clone());

    // Scenario 1: Vetted HTML
    println!("--- Scenario 1: Vetted HTML ---");
    let div = document.create_element("div");
    let html = SafeHtml::new_unchecked("<div>foobar</div>");
    match dom.set_inner_html(&*div, &html) {
        Ok(()) => println!("innerHTML = {:?}", div.property("innerHTML")),
        Err(e) => eprintln!("Write failed: {}", e),
    }

    // Scenario 2: Raw URLs under the default (aborting) handler
    println!("\n--- Scenario 2: Raw URL, Default Handler ---");
    let anchor = document.create_element("a");
    for url in ["https://example.com/", "/relative", "javascript:alert(1)"] {
        match dom.set_anchor_href(&*anchor, url) {
            Ok(()) => println!("{:<24} -> href = {:?}", url, anchor.property("href")),
            Err(e) => println!("{:<24} -> refused: {}", url, e),
        }
    }

    // Scenario 3: Raw URLs under a recording handler
    println!("\n--- Scenario 3: Raw URL, Recording Handler ---");
    {
        let recorder = Rc::new(RecordingHandler::new());
        let _guard = dom.install_handler(recorder.clone());

        if let Err(e) = dom.set_anchor_href(&*anchor, "javascript:alert(1)") {
            eprintln!("Unexpected failure: {}", e);
        }
        println!("href = {:?}", anchor.property("href"));
        for failure in recorder.failures() {
            println!("recorded: {}", failure);
        }
    }

    // Scenario 4: Wrong target
    println!("\n--- Scenario 4: Identity Guard ---");
    let resource = TrustedResourceUrl::new_unchecked("https://cdn.example/app.js");
    match dom.set_script_src(&*div, &resource) {
        Ok(()) => println!("Unexpected success"),
        Err(e) => println!("Refused (expected): {}", e),
    }

    // Scenario 5: Nonce relay
    println!("\n--- Scenario 5: Nonce Relay ---");
    let page_script = document.create_element("script");
    page_script.set_attribute("nonce", "cGFnZU5vbmNl");
    document.append(&page_script);

    let script = document.create_element("script");
    match dom.set_script_src(&*script, &resource) {
        Ok(()) => println!(
            "src = {:?}, nonce = {:?}",
            script.property("src"),
            script.attribute("nonce")
        ),
        Err(e) => eprintln!("Write failed: {}", e),
    }

    // Scenario 6: Blobs
    println!("\n--- Scenario 6: Images From Blobs ---");
    for mime in ["image/png", "badmimetype"] {
        match dom.create_image_from_blob(&Blob::new(vec![0u8; 16], mime)) {
            Ok(image) => println!("{:<12} -> image src = {:?}", mime, image.property("src")),
            Err(e) => println!("{:<12} -> refused: {}", mime, e),
        }
    }
    println!("live object URLs: {:?}", window.live_object_urls());

    // Scenario 7: Custom scheme allow-list
    println!("\n--- Scenario 7: Sanitizer Configuration ---");
    match UrlSanitizer::default().allow_scheme("tel") {
        Ok(sanitizer) => {
            let dom = SafeDom::new(window.clone()).with_url_sanitizer(sanitizer);
            match dom.set_anchor_href(&*anchor, "tel:+15551234") {
                Ok(()) => println!("href = {:?}", anchor.property("href")),
                Err(e) => eprintln!("Write failed: {}", e),
            }
        }
        Err(e) => eprintln!("Configuration refused: {}", e),
    }
    match UrlSanitizer::default().allow_scheme("javascript") {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Configuration refused (expected): {}", e),
    }

    println!("\n=== Example Complete ===");
}
