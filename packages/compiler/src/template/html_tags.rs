//! HTML Tags
//!
//! Element categories the server backend needs when printing markup.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Elements that never have children nor a closing tag
pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(tag_name.to_ascii_lowercase().as_str())
}
