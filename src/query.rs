//! Query-string assembly for API parameters.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// Everything except ASCII alphanumerics and `-_.!~*'()` is percent-encoded,
/// so encoded values match what browsers produce for URI components (spaces
/// become `%20`, not `+`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode(raw: &str) -> Cow<'_, str> {
    utf8_percent_encode(raw, COMPONENT).into()
}

/// Joins `key=value` pairs with `&`, percent-encoding both sides.
///
/// Pair order is preserved; callers that need a deterministic query string
/// (identical requests must be byte-identical for HTTP caching) pass an
/// iterator with ascending keys, e.g. a `BTreeMap`. An empty input encodes
/// to an empty string and the caller omits the `?` entirely.
pub(crate) fn urlencode<K, V>(params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in params {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&encode(key.as_ref()));
        out.push('=');
        out.push_str(&encode(value.as_ref()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn encodes_uri_components() {
        assert_eq!(encode("full text search"), "full%20text%20search");
        assert_eq!(encode("lastname:asc,firstname:desc"), "lastname%3Aasc%2Cfirstname%3Adesc");
        assert_eq!(encode("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode("unreserved-_.!~*'()"), "unreserved-_.!~*'()");
    }

    #[test]
    fn joins_pairs_with_ampersand() {
        let encoded = urlencode([("limit", "15"), ("page", "2")]);
        assert_eq!(encoded, "limit=15&page=2");
    }

    #[test]
    fn empty_input_encodes_to_empty_string() {
        assert_eq!(urlencode(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn sorted_map_is_invariant_under_insertion_order() {
        let mut forwards = BTreeMap::new();
        forwards.insert("a".to_string(), "1".to_string());
        forwards.insert("m".to_string(), "2".to_string());
        forwards.insert("z".to_string(), "3".to_string());

        let mut backwards = BTreeMap::new();
        backwards.insert("z".to_string(), "3".to_string());
        backwards.insert("m".to_string(), "2".to_string());
        backwards.insert("a".to_string(), "1".to_string());

        assert_eq!(urlencode(&forwards), urlencode(&backwards));
        assert_eq!(urlencode(&forwards), "a=1&m=2&z=3");
    }
}
