//! Reduce arbitrary HTML to the tag subset Telegram accepts.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Tags Telegram's HTML parse mode understands.
const SUPPORTED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "code",
    "del",
    "em",
    "i",
    "ins",
    "pre",
    "s",
    "span",
    "strike",
    "strong",
    "tg-emoji",
    "tg-spoiler",
    "u",
];

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9-]*)(?:\s[^>]*)?/?>").expect("hardcoded regex")
});

/// Strip every tag Telegram would reject, keeping the inner text.
/// `<br>` becomes a line break.
pub fn telegram_supported_html(html: &str) -> String {
    TAG.replace_all(html, |caps: &Captures| {
        let name = caps[2].to_lowercase();
        if SUPPORTED_TAGS.contains(&name.as_str()) {
            caps[0].to_string()
        } else if name == "br" {
            "\n".to_string()
        } else {
            String::new()
        }
    })
    .into_owned()
}
