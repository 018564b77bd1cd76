//! HTTP client: transport ownership and the request pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use url::Url;

use crate::cookies::Jar;
use crate::encode::build_url;
use crate::error::{Error, Result};
use crate::options::{resolve_body, BodyKind, Headers, RequestOptions};
use crate::response::Response;

/// Whole-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Default identifying header value; reads as empty on the receiving side.
pub const DEFAULT_USER_AGENT: &str = " ";

/// HTTP client holding one connection pool and, optionally, a cookie jar.
///
/// A `&Client` can be shared across tasks; reconfiguration (`set_timeout`,
/// `set_proxy`, `set_user_agent`) needs exclusive access, so configure
/// before sharing. A failed request leaves the client usable.
pub struct Client {
    http: reqwest::Client,
    jar: Option<Arc<Jar>>,
    timeout: Duration,
    user_agent: String,
}

impl Client {
    /// New client with a cookie jar attached.
    pub fn new() -> Result<Self> {
        Self::build(Some(Arc::new(Jar::default())), None)
    }

    /// New client that never stores cookies.
    pub fn without_cookies() -> Result<Self> {
        Self::build(None, None)
    }

    fn build(jar: Option<Arc<Jar>>, proxy: Option<reqwest::Proxy>) -> Result<Self> {
        let http = Self::transport(jar.as_ref(), proxy)?;

        Ok(Client {
            http,
            jar,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    fn transport(jar: Option<&Arc<Jar>>, proxy: Option<reqwest::Proxy>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();

        if let Some(jar) = jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(Error::Transport)
    }

    /// Replace the whole-request timeout (default 180 seconds).
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Replace the default identifying User-Agent value.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// Route every request through `proxy_url`.
    ///
    /// Rebuilds the transport; the cookie jar and its contents carry over.
    pub fn set_proxy(&mut self, proxy_url: &str) -> Result<()> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::Proxy(format!("'{proxy_url}': {e}")))?;

        self.http = Self::transport(self.jar.as_ref(), Some(proxy))?;
        Ok(())
    }

    pub(crate) fn jar(&self) -> Result<&Arc<Jar>> {
        self.jar.as_ref().ok_or(Error::CookiesDisabled)
    }

    /// Send a request and drain the response into memory.
    ///
    /// Draining is part of the contract: the connection goes back to the
    /// pool only once the body is read to the end.
    pub async fn request(&self, opt: &RequestOptions) -> Result<Response> {
        let res = self.execute(opt).await?;

        let status = res.status();
        let version = res.version();
        let headers = res.headers().clone();
        let url = res.url().clone();
        let body = res.bytes().await.map_err(Error::Transport)?.to_vec();

        Ok(Response {
            status,
            version,
            headers,
            url,
            body,
        })
    }

    /// Send a request and hand back the undrained transport response.
    ///
    /// Streaming mode: the caller owns the response stream and must consume
    /// or drop it on every path; nothing is read here.
    pub async fn execute(&self, opt: &RequestOptions) -> Result<reqwest::Response> {
        let method = resolve_method(&opt.method)?;

        let mut url = build_url(&opt.url, opt.query.as_ref())?;
        if !opt.query_raw.is_empty() {
            let suffixed = format!("{url}{}", opt.query_raw);
            url = Url::parse(&suffixed)
                .map_err(|e| Error::MalformedUrl(format!("'{suffixed}': {e}")))?;
        }

        let (body, kind) = resolve_body(opt)?;
        let headers = self.compose_headers(kind, &opt.headers)?;

        log::debug!("{method} > {url}");
        let started = Instant::now();

        let request = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .timeout(self.timeout)
            .build()
            .map_err(Error::Transport)?;

        match self.http.execute(request).await {
            Ok(res) => {
                log::debug!("{} < {} {:?}", res.status(), res.url(), started.elapsed());
                Ok(res)
            }
            Err(e) => {
                log::warn!("transport error after {:?}: {e}", started.elapsed());
                Err(Error::Transport(e))
            }
        }
    }

    /// Compose the outgoing header set: default User-Agent first, then the
    /// Content-Type implied by the body kind, then caller headers. Each step
    /// overrides the previous one; an empty caller value stays as an empty
    /// header value.
    fn compose_headers(&self, kind: BodyKind, caller: &Headers) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|e| Error::InvalidHeader(format!("User-Agent: {e}")))?,
        );

        match kind {
            BodyKind::Form | BodyKind::UrlEncoded => {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
            }
            BodyKind::Json => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            BodyKind::Raw | BodyKind::Empty => {}
        }

        for (name, value) in caller {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::InvalidHeader(format!("'{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("'{name}': {e}")))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

fn resolve_method(method: &str) -> Result<Method> {
    if method.is_empty() {
        return Ok(Method::GET);
    }

    let upper = method.to_uppercase();
    Method::from_bytes(upper.as_bytes()).map_err(|_| Error::InvalidMethod(upper))
}

#[cfg(test)]
mod tests {
    use super::{resolve_method, Client, DEFAULT_USER_AGENT};
    use crate::error::Error;
    use crate::options::{BodyKind, Headers};
    use reqwest::header::{CONTENT_TYPE, USER_AGENT};
    use reqwest::Method;

    #[test]
    fn empty_method_defaults_to_get() {
        assert_eq!(resolve_method("").expect("method"), Method::GET);
    }

    #[test]
    fn lowercase_method_is_uppercased() {
        assert_eq!(resolve_method("post").expect("method"), Method::POST);
        assert_eq!(resolve_method("delete").expect("method"), Method::DELETE);
    }

    #[test]
    fn unknown_token_still_resolves() {
        assert_eq!(resolve_method("purge").expect("method").as_str(), "PURGE");
    }

    #[test]
    fn invalid_method_token_is_rejected() {
        let err = resolve_method("b@d").expect_err("invalid method");
        assert!(matches!(err, Error::InvalidMethod(token) if token == "B@D"));
    }

    #[test]
    fn default_user_agent_is_single_space() {
        let client = Client::new().expect("client");
        let headers = client
            .compose_headers(BodyKind::Empty, &Headers::new())
            .expect("headers");
        assert_eq!(headers.get(USER_AGENT).map(|v| v.to_str().ok()), Some(Some(DEFAULT_USER_AGENT)));
    }

    #[test]
    fn body_kind_implies_content_type() {
        let client = Client::new().expect("client");

        let form = client
            .compose_headers(BodyKind::Form, &Headers::new())
            .expect("headers");
        assert_eq!(
            form.get(CONTENT_TYPE).map(|v| v.to_str().unwrap()),
            Some("application/x-www-form-urlencoded")
        );

        let json = client
            .compose_headers(BodyKind::Json, &Headers::new())
            .expect("headers");
        assert_eq!(
            json.get(CONTENT_TYPE).map(|v| v.to_str().unwrap()),
            Some("application/json")
        );

        let raw = client
            .compose_headers(BodyKind::Raw, &Headers::new())
            .expect("headers");
        assert_eq!(raw.get(CONTENT_TYPE), None);
    }

    #[test]
    fn caller_header_overrides_defaults_including_empty() {
        let client = Client::new().expect("client");
        let caller: Headers = [
            ("User-Agent".to_string(), String::new()),
            ("Content-Type".to_string(), "text/plain".to_string()),
        ]
        .into_iter()
        .collect();

        let headers = client
            .compose_headers(BodyKind::Json, &caller)
            .expect("headers");
        assert_eq!(headers.get(USER_AGENT).map(|v| v.to_str().unwrap()), Some(""));
        assert_eq!(
            headers.get(CONTENT_TYPE).map(|v| v.to_str().unwrap()),
            Some("text/plain")
        );
    }

    #[test]
    fn invalid_caller_header_name_is_rejected() {
        let client = Client::new().expect("client");
        let caller: Headers = [("bad header".to_string(), "x".to_string())]
            .into_iter()
            .collect();

        let err = client
            .compose_headers(BodyKind::Empty, &caller)
            .expect_err("invalid header");
        assert!(matches!(err, Error::InvalidHeader(_)));
    }
}
