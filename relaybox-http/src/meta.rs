use http::header::{COOKIE, HOST};
use http::uri::Scheme;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, request};
use smol_str::SmolStr;

use crate::query;

/// Owned snapshot of the request attributes used after the request phase.
///
/// The proxy may reuse or free its request buffer before the response
/// arrives, so everything the key builder and the request predicates need
/// is copied here once, when the request headers are seen.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    method: Method,
    scheme: Scheme,
    host: Option<SmolStr>,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestMeta {
    /// Captures the request head.
    ///
    /// The host is taken from the `Host` header and falls back to the URI
    /// authority. The scheme is taken from the URI and defaults to `http`;
    /// use [`with_scheme`](Self::with_scheme) on TLS listeners where the
    /// request line is in origin form.
    pub fn from_parts(parts: &request::Parts) -> Self {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .map(SmolStr::new)
            .or_else(|| parts.uri.authority().map(|a| SmolStr::new(a.as_str())));
        let scheme = parts.uri.scheme().cloned().unwrap_or(Scheme::HTTP);
        Self {
            method: parts.method.clone(),
            scheme,
            host,
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Overrides the request scheme.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Returns the value of the named query parameter.
    pub fn param(&self, name: &str) -> Option<String> {
        self.query()
            .and_then(query::parse)
            .and_then(|params| params.get(name).map(query::Value::to_key_value))
    }

    /// Returns the value of the named cookie, searching every `Cookie`
    /// header in order.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn meta(request: Request<()>) -> RequestMeta {
        let (parts, _) = request.into_parts();
        RequestMeta::from_parts(&parts)
    }

    #[test]
    fn test_host_prefers_header() {
        let meta = meta(
            Request::get("http://upstream.local/a")
                .header(HOST, "example.com")
                .body(())
                .unwrap(),
        );
        assert_eq!(meta.host(), Some("example.com"));
        assert_eq!(meta.scheme(), "http");
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let meta = meta(Request::get("https://example.com:8443/a").body(()).unwrap());
        assert_eq!(meta.host(), Some("example.com:8443"));
        assert_eq!(meta.scheme(), "https");
    }

    #[test]
    fn test_origin_form_has_no_host() {
        let meta = meta(Request::get("/a?b=c").body(()).unwrap());
        assert_eq!(meta.host(), None);
        assert_eq!(meta.path(), "/a");
        assert_eq!(meta.query(), Some("b=c"));
        assert_eq!(meta.with_scheme(Scheme::HTTPS).scheme(), "https");
    }

    #[test]
    fn test_cookie_lookup() {
        let meta = meta(
            Request::get("/")
                .header(COOKIE, "theme=dark; session=abc")
                .header(COOKIE, "lang=en")
                .body(())
                .unwrap(),
        );
        assert_eq!(meta.cookie("session"), Some("abc"));
        assert_eq!(meta.cookie("lang"), Some("en"));
        assert_eq!(meta.cookie("missing"), None);
    }

    #[test]
    fn test_param_lookup() {
        let meta = meta(Request::get("/search?q=rust&page=2").body(()).unwrap());
        assert_eq!(meta.param("q").as_deref(), Some("rust"));
        assert_eq!(meta.param("page").as_deref(), Some("2"));
        assert_eq!(meta.param("missing"), None);
    }
}
