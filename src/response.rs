//! Drained HTTP responses

use std::borrow::Cow;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// A fully drained response: status line, headers and the complete body.
///
/// The body is read to the end before this is handed out, so the transport
/// can return the connection to its pool.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    /// Final URL, after any redirects.
    pub url: Url,
    pub body: Vec<u8>,
}

impl Response {
    /// Body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::Deserialization)
    }

    /// Content-Type header value, when present and readable as text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::Response;
    use crate::error::Error;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::{StatusCode, Version};
    use url::Url;

    fn response(body: &[u8]) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Response {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers,
            url: Url::parse("https://example.com/get").expect("valid url"),
            body: body.to_vec(),
        }
    }

    #[test]
    fn text_is_lossy() {
        let res = response(b"ok \xff");
        assert_eq!(res.text(), "ok \u{fffd}");
    }

    #[test]
    fn json_decodes_body() {
        let res = response(br#"{"int":1}"#);
        let value: serde_json::Value = res.json().expect("valid json");
        assert_eq!(value["int"], 1);
    }

    #[test]
    fn json_decode_failure_is_deserialization() {
        let res = response(b"not json");
        let err = res.json::<serde_json::Value>().expect_err("invalid json");
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn content_type_reads_header() {
        let res = response(b"{}");
        assert_eq!(res.content_type(), Some("application/json"));
    }
}
