//! Tag Decoding and Attribute Promotion

use std::collections::HashMap;

/// Key -> value mapping decoded from raw webhook tags, scoped to one
/// invocation
pub(crate) type ParsedTags = HashMap<String, String>;

/// Decode raw `key=value` tag strings.
///
/// Splits on the first `=` only, so values may themselves contain `=`.
/// Entries without a separator are upstream noise and are dropped. The
/// last occurrence of a duplicated key wins.
pub(crate) fn decode(tags: &[String]) -> ParsedTags {
    let mut parsed = ParsedTags::new();
    for tag in tags {
        if let Some((key, value)) = tag.split_once('=') {
            parsed.insert(key.to_string(), value.to_string());
        }
    }
    parsed
}

/// Look up a tag, treating empty values as absent
pub(crate) fn get<'a>(parsed: &'a ParsedTags, key: &str) -> Option<&'a str> {
    parsed.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Copy promotable tags into alert attributes without overwriting
/// values the host already set
pub(crate) fn promote(
    parsed: &ParsedTags,
    promotable: &[String],
    attributes: &mut HashMap<String, String>,
) {
    for key in promotable {
        let Some(value) = get(parsed, key) else {
            continue;
        };
        let occupied = attributes.get(key).is_some_and(|v| !v.is_empty());
        if !occupied {
            attributes.insert(key.clone(), value.to_string());
        }
    }
}
