//! Cookie jar bridge: native jar access plus JSON import/export.
//!
//! One `cookie_store::CookieStore` sits behind the transport (fed by
//! Set-Cookie headers, queried for Cookie values) and behind the client's
//! cookie methods, so both sides always see the same state.

use std::sync::RwLock;

use cookie::Cookie;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc2822;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use url::Url;

use crate::client::Client;
use crate::error::{Error, Result};

/// HTTP-date layout used by the Expires cookie attribute.
const EXPIRES_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Cookie store shared between the transport and the bridge methods.
#[derive(Debug, Default)]
pub(crate) struct Jar(RwLock<cookie_store::CookieStore>);

impl Jar {
    /// Store cookies for `url`, as if they arrived in a response from it.
    pub(crate) fn store(&self, url: &Url, cookies: Vec<Cookie<'static>>) {
        if let Ok(mut store) = self.0.write() {
            store.store_response_cookies(cookies.into_iter(), url);
        }
    }

    /// Unexpired cookies the jar would send to `url`.
    pub(crate) fn matching(&self, url: &Url) -> Vec<Cookie<'static>> {
        match self.0.read() {
            Ok(store) => store
                .matches(url)
                .into_iter()
                .map(|cookie| (**cookie).clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl reqwest::cookie::CookieStore for Jar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies: Vec<_> = cookie_headers
            .filter_map(|value| {
                Cookie::parse(value.to_str().unwrap_or(""))
                    .map(Cookie::into_owned)
                    .ok()
            })
            .collect();

        if let Ok(mut store) = self.0.write() {
            store.store_response_cookies(cookies.into_iter(), url);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let values = match self.0.read() {
            Ok(store) => store
                .get_request_values(url)
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
            Err(_) => return None,
        };

        if values.is_empty() {
            return None;
        }

        HeaderValue::from_str(&values).ok()
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// JSON shape of one exported cookie.
///
/// `expires` stays a human-readable HTTP-date string and is parsed
/// opportunistically on import: an unreadable date imports the cookie as a
/// session cookie instead of failing the call. `expires` and `maxage` are
/// omitted from output when unset; the remaining fields are always emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expires: String,
    #[serde(default, rename = "maxage", skip_serializing_if = "is_zero")]
    pub max_age: i64,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, rename = "httponly")]
    pub http_only: bool,
}

impl CookieRecord {
    /// Build a native cookie from this record. A bad `expires` string only
    /// drops the expiry, nothing else.
    pub fn to_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.clone(), self.value.clone());

        if !self.path.is_empty() {
            cookie.set_path(self.path.clone());
        }
        if !self.domain.is_empty() {
            cookie.set_domain(self.domain.clone());
        }
        if let Some(expires) = parse_expires(&self.expires) {
            cookie.set_expires(expires);
        }
        if self.max_age != 0 {
            cookie.set_max_age(time::Duration::seconds(self.max_age));
        }
        if self.secure {
            cookie.set_secure(true);
        }
        if self.http_only {
            cookie.set_http_only(true);
        }

        cookie
    }

    /// Snapshot a native cookie into the JSON record shape.
    pub fn from_cookie(cookie: &Cookie<'_>) -> Self {
        CookieRecord {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            path: cookie.path().unwrap_or("").to_string(),
            domain: cookie.domain().unwrap_or("").to_string(),
            expires: cookie
                .expires_datetime()
                .and_then(format_expires)
                .unwrap_or_default(),
            max_age: cookie.max_age().map(|age| age.whole_seconds()).unwrap_or(0),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
        }
    }
}

/// Accepts the cookie Expires layout first, RFC 2822 as a fallback.
fn parse_expires(raw: &str) -> Option<OffsetDateTime> {
    if raw.is_empty() {
        return None;
    }

    PrimitiveDateTime::parse(raw, EXPIRES_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc2822).ok())
}

fn format_expires(at: OffsetDateTime) -> Option<String> {
    at.to_offset(UtcOffset::UTC).format(EXPIRES_FORMAT).ok()
}

impl Client {
    /// Cookies the jar would send for `domain`.
    pub fn get_cookies(&self, domain: &str) -> Result<Vec<Cookie<'static>>> {
        let url = parse_domain(domain)?;
        Ok(self.jar()?.matching(&url))
    }

    /// Store cookies for `domain`.
    pub fn set_cookies(&self, domain: &str, cookies: Vec<Cookie<'static>>) -> Result<()> {
        let url = parse_domain(domain)?;
        self.jar()?.store(&url, cookies);
        Ok(())
    }

    /// Value of the first cookie named `name` for `domain`; empty string
    /// when no such cookie exists.
    pub fn get_cookie(&self, domain: &str, name: &str) -> Result<String> {
        let cookies = self.get_cookies(domain)?;

        Ok(cookies
            .iter()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_default())
    }

    /// Import a JSON array of cookie records into the jar for `domain`.
    pub fn import_cookies(&self, domain: &str, json: &str) -> Result<()> {
        log::debug!("import cookies for {domain}");

        let records: Vec<CookieRecord> =
            serde_json::from_str(json).map_err(Error::Deserialization)?;

        let url = parse_domain(domain)?;
        let cookies = records.iter().map(CookieRecord::to_cookie).collect();
        self.jar()?.store(&url, cookies);

        Ok(())
    }

    /// Export the jar's cookies for `domain` as a JSON array.
    pub fn export_cookies(&self, domain: &str) -> Result<String> {
        log::debug!("export cookies for {domain}");

        let cookies = self.get_cookies(domain)?;
        let records: Vec<CookieRecord> = cookies.iter().map(CookieRecord::from_cookie).collect();

        serde_json::to_string(&records).map_err(Error::Serialization)
    }
}

fn parse_domain(domain: &str) -> Result<Url> {
    Url::parse(domain).map_err(|e| Error::MalformedUrl(format!("'{domain}': {e}")))
}
