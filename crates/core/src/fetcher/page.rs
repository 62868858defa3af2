//! Small helpers over `scraper` shared by the page parsers.

use scraper::{ElementRef, Selector};

/// Parse a selector written in this crate.
pub(super) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e}"))
}

/// Concatenated, trimmed text of every `sel` match under `element`.
pub(super) fn child_text(element: ElementRef<'_>, sel: &Selector) -> String {
    element
        .select(sel)
        .flat_map(|child| child.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// First non-blank text node under `element`, trimmed.
pub(super) fn first_text(element: ElementRef<'_>) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Category labels compared without case or whitespace: "Main + Sides" -> "main+sides".
pub(super) fn label_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
