//! Shared proptest strategies.

use proptest::prelude::*;

/// Small HTML fragments, including quotes and entities.
pub fn arb_markup() -> impl Strategy<Value = String> {
    "<(div|span|p|b)( class=\"[a-z ]{0,8}\")?>[a-zA-Z0-9 &;'\"=]{0,40}</(div|span|p|b)>"
}

/// `javascript:` URLs with the scheme in assorted letter cases.
pub fn arb_javascript_url() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["javascript", "JavaScript", "JAVASCRIPT", "jAvAsCrIpT"]),
        "[a-zA-Z0-9()'/;. ]{0,30}",
    )
        .prop_map(|(scheme, body)| format!("{}:{}", scheme, body))
}

/// Absolute `http`/`https` URLs with optional path and query.
pub fn arb_web_url() -> impl Strategy<Value = String> {
    concat!(
        "https?://[a-z]{1,12}\\.(com|org|example)",
        "(/[a-zA-Z0-9_-]{0,10}){0,3}(\\?[a-z]{1,5}=[a-z0-9]{0,5})?",
    )
}
