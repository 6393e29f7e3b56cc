//! Query-string and cookie pair parsing.
//!
//! Both formats share the same discard rule: a pair must split into exactly
//! a key and a value, otherwise it is dropped and parsing continues with
//! the next pair. Malformed input never fails the whole request.

use std::collections::HashMap;

/// Parses a raw query string (the part after `?`) into its pairs.
///
/// Pairs are separated by `&` and split on `=`. `+` decodes to a space and
/// `%XX` escapes are percent-decoded in both key and value; a pair whose
/// escapes do not decode to valid UTF-8 is discarded.
pub(crate) fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in raw.split('&') {
        let Some((key, value)) = split_pair(pair, '=') else {
            continue;
        };
        let (Some(key), Some(value)) = (decode_component(key), decode_component(value)) else {
            continue;
        };
        params.insert(key, value);
    }
    params
}

/// Parses a `Cookie` header value into its pairs.
///
/// Cookies are separated by the literal `"; "` and split on `=`. Values are
/// taken verbatim, without percent-decoding.
pub(crate) fn parse_cookies(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in raw.split("; ") {
        let Some((name, value)) = split_pair(pair, '=') else {
            continue;
        };
        cookies.insert(name.to_string(), value.to_string());
    }
    cookies
}

/// Splits `pair` on `sep` into exactly two parts.
///
/// Returns `None` when the separator is missing or appears more than once.
fn split_pair(pair: &str, sep: char) -> Option<(&str, &str)> {
    let mut parts = pair.splitn(3, sep);
    let key = parts.next()?;
    let value = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((key, value))
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => None,
    }
}
