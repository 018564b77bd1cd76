//! Per-request options and body resolution

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::encode::encode_params;
use crate::error::{Error, Result};

/// Multi-valued parameter map used for query strings, forms and URL-encoded
/// bodies.
///
/// Keys are unique and iterate in lexicographic order, so every encoding of
/// the same map is identical; values under one key keep insertion order.
pub type Params = BTreeMap<String, Vec<String>>;

/// Plain header map. Name casing is left to the transport.
pub type Headers = HashMap<String, String>;

/// Per-request configuration, built by the caller and read once per call.
///
/// Only `url` is required. The client never mutates the value it is given,
/// so one options struct can be reused across calls.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Target URL.
    pub url: String,
    /// HTTP method; empty means GET, anything else is uppercased.
    pub method: String,
    /// Raw body, sent verbatim when non-empty.
    pub body_str: String,
    /// URL-encoded body map.
    pub body: Option<Params>,
    /// URL-encoded form; implies a form-urlencoded Content-Type.
    pub form: Option<Params>,
    /// JSON body; implies an application/json Content-Type.
    pub json: Option<Value>,
    /// Extra query parameters merged into the URL's own query string.
    pub query: Option<Params>,
    /// Literal suffix appended to the built URL, unvalidated.
    pub query_raw: String,
    /// Caller headers, applied last; an empty value clears a header to empty
    /// rather than unsetting it.
    pub headers: Headers,
}

/// Which body source won the precedence race. Drives the implied
/// Content-Type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Raw,
    Json,
    Form,
    UrlEncoded,
    Empty,
}

/// Pick exactly one body source: raw string, then JSON, then form, then body
/// map, then nothing. Later fields are ignored once an earlier one is set.
pub fn resolve_body(opt: &RequestOptions) -> Result<(String, BodyKind)> {
    if !opt.body_str.is_empty() {
        return Ok((opt.body_str.clone(), BodyKind::Raw));
    }

    if let Some(json) = &opt.json {
        let body = serde_json::to_string(json).map_err(Error::Serialization)?;
        return Ok((body, BodyKind::Json));
    }

    if let Some(form) = &opt.form {
        return Ok((encode_params(form), BodyKind::Form));
    }

    if let Some(body) = &opt.body {
        return Ok((encode_params(body), BodyKind::UrlEncoded));
    }

    Ok((String::new(), BodyKind::Empty))
}
