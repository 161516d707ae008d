//! Text cleanup for feed content.

use std::borrow::Cow;
use std::sync::OnceLock;

use htmlescape::decode_html;
use regex::Regex;

/// Anything between angle brackets.
const TAG_RE: &str = r"<[^>]*>";

/// Longest entity body we try to decode (`&thetasym;`, `&#x10FFFF;`).
const MAX_ENTITY_LEN: usize = 10;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(TAG_RE).expect("regexp should be valid"))
}

/// Remove markup tags, leaving their text content.
pub fn strip_tags(text: &str) -> Cow<'_, str> {
    tag_regex().replace_all(text, "")
}

/// Decode HTML entities once.
///
/// Every named HTML entity and numeric references are decoded; anything that
/// is not a known entity is left as written. `&amp;lt;` becomes `&lt;`, not
/// `<`.
pub fn unescape_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail[1..]
            .find(';')
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN)
            .filter(|&end| {
                tail[1..=end]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '#')
            })
            .and_then(|end| {
                decode_html(&tail[..end + 2])
                    .ok()
                    .map(|decoded| (decoded, end))
            });

        match decoded {
            Some((decoded, end)) => {
                result.push_str(&decoded);
                rest = &tail[end + 2..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    result
}

/// Strip tags, then decode entities.
///
/// The order matters: `&lt;b&gt;` in a description is text, not markup.
pub fn clean_description(text: &str) -> String {
    unescape_entities(&strip_tags(text))
}
