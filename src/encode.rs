//! Query-string encoding and URL assembly

use url::{form_urlencoded, Url};

use crate::error::{Error, Result};
use crate::options::Params;

/// Encode a parameter map as a form-urlencoded string.
///
/// Keys come out in map order (lexicographic); values under one key keep
/// their insertion order. The same map always encodes to the same string,
/// with spaces as `+` and reserved characters percent-escaped.
pub fn encode_params(params: &Params) -> String {
    let mut encoder = form_urlencoded::Serializer::new(String::new());

    for (key, values) in params {
        for value in values {
            encoder.append_pair(key, value);
        }
    }

    encoder.finish()
}

/// Parse a base URL and union-merge extra query parameters into it.
///
/// Without extra parameters the base is returned as parsed, its query string
/// untouched. With them, the pre-existing pairs are kept ahead of the
/// supplied values for each key and the whole merged set is re-encoded.
pub fn build_url(base: &str, query: Option<&Params>) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::MalformedUrl(format!("'{base}': {e}")))?;

    let Some(query) = query else {
        return Ok(url);
    };

    let mut merged = Params::new();
    for (key, value) in url.query_pairs() {
        merged
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for (key, values) in query {
        merged
            .entry(key.clone())
            .or_default()
            .extend(values.iter().cloned());
    }

    let encoded = encode_params(&merged);
    url.set_query(if encoded.is_empty() { None } else { Some(&encoded) });

    Ok(url)
}
