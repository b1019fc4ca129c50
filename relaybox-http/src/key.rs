//! Cache key templates.
//!
//! A [`KeyTemplate`] is an ordered list of [`KeyComponent`]s, written in
//! configuration as dot separated names:
//!
//! ```
//! use relaybox_http::KeyTemplate;
//!
//! let template: KeyTemplate = "method.host.path.param_page".parse().unwrap();
//! assert_eq!(template.to_string(), "method.host.path.param_page");
//! ```
//!
//! | Component       | Value                                        |
//! |-----------------|----------------------------------------------|
//! | `method`        | request method                               |
//! | `scheme`        | `http` or `https`                            |
//! | `host`          | `Host` header (required)                     |
//! | `uri`           | path and query                               |
//! | `path`          | path only                                    |
//! | `delimiter`     | `?` when the request has a query             |
//! | `query`         | raw query string                             |
//! | `param_<name>`  | value of query parameter `<name>`            |
//! | `header_<name>` | value of request header `<name>`             |
//! | `cookie_<name>` | value of cookie `<name>`                     |
//!
//! Optional components that are absent from the request render as their
//! bare name, so `/a` and `/a?page=` still produce different keys.

use std::fmt;
use std::str::FromStr;

use http::HeaderName;
use relaybox_core::{CacheKey, KeyPart, KeyParts};
use smol_str::SmolStr;
use thiserror::Error;

use crate::RequestMeta;

/// Errors from parsing a key template or building a key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// A required component is not present in the request.
    #[error("required key component `{0}` is missing from the request")]
    MissingComponent(&'static str),
    /// A header used by the key is not valid UTF-8.
    #[error("header `{0}` has a non UTF-8 value")]
    InvalidHeader(String),
    /// The template could not be parsed.
    #[error("invalid key template: {0}")]
    InvalidTemplate(String),
}

/// One component of a key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyComponent {
    Method,
    Scheme,
    Host,
    Uri,
    Path,
    Delimiter,
    Query,
    Param(SmolStr),
    Header(HeaderName),
    Cookie(SmolStr),
}

impl KeyComponent {
    fn to_part(&self, meta: &RequestMeta) -> Result<KeyPart, KeyError> {
        let part = match self {
            KeyComponent::Method => KeyPart::new("method", Some(meta.method().as_str())),
            KeyComponent::Scheme => KeyPart::new("scheme", Some(meta.scheme())),
            KeyComponent::Host => {
                let host = meta.host().ok_or(KeyError::MissingComponent("host"))?;
                KeyPart::new("host", Some(host))
            }
            KeyComponent::Uri => {
                let uri = meta
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| meta.path());
                KeyPart::new("uri", Some(uri))
            }
            KeyComponent::Path => KeyPart::new("path", Some(meta.path())),
            KeyComponent::Delimiter => {
                KeyPart::new("delimiter", meta.query().map(|_| "?"))
            }
            KeyComponent::Query => KeyPart::new("query", meta.query()),
            KeyComponent::Param(name) => {
                KeyPart::new(format!("param_{name}"), meta.param(name))
            }
            KeyComponent::Header(name) => {
                let value = meta
                    .header(name)
                    .map(|value| {
                        value
                            .to_str()
                            .map_err(|_| KeyError::InvalidHeader(name.to_string()))
                    })
                    .transpose()?;
                KeyPart::new(format!("header_{name}"), value)
            }
            KeyComponent::Cookie(name) => {
                KeyPart::new(format!("cookie_{name}"), meta.cookie(name))
            }
        };
        Ok(part)
    }
}

impl FromStr for KeyComponent {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let component = match s {
            "method" => KeyComponent::Method,
            "scheme" => KeyComponent::Scheme,
            "host" => KeyComponent::Host,
            "uri" => KeyComponent::Uri,
            "path" => KeyComponent::Path,
            "delimiter" => KeyComponent::Delimiter,
            "query" => KeyComponent::Query,
            other => {
                if let Some(name) = non_empty_suffix(other, "param_")? {
                    KeyComponent::Param(SmolStr::new(name))
                } else if let Some(name) = non_empty_suffix(other, "header_")? {
                    let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                        KeyError::InvalidTemplate(format!("invalid header name `{name}`"))
                    })?;
                    KeyComponent::Header(header)
                } else if let Some(name) = non_empty_suffix(other, "cookie_")? {
                    KeyComponent::Cookie(SmolStr::new(name))
                } else {
                    return Err(KeyError::InvalidTemplate(format!(
                        "unknown key component `{other}`"
                    )));
                }
            }
        };
        Ok(component)
    }
}

fn non_empty_suffix<'a>(s: &'a str, prefix: &str) -> Result<Option<&'a str>, KeyError> {
    match s.strip_prefix(prefix) {
        Some("") => Err(KeyError::InvalidTemplate(format!(
            "`{prefix}` needs a name"
        ))),
        other => Ok(other),
    }
}

impl fmt::Display for KeyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyComponent::Method => f.write_str("method"),
            KeyComponent::Scheme => f.write_str("scheme"),
            KeyComponent::Host => f.write_str("host"),
            KeyComponent::Uri => f.write_str("uri"),
            KeyComponent::Path => f.write_str("path"),
            KeyComponent::Delimiter => f.write_str("delimiter"),
            KeyComponent::Query => f.write_str("query"),
            KeyComponent::Param(name) => write!(f, "param_{name}"),
            KeyComponent::Header(name) => write!(f, "header_{name}"),
            KeyComponent::Cookie(name) => write!(f, "cookie_{name}"),
        }
    }
}

/// An ordered key template.
///
/// The default template is `method.scheme.host.uri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    components: Vec<KeyComponent>,
}

impl KeyTemplate {
    /// Creates a template from its components.
    pub fn new(components: Vec<KeyComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[KeyComponent] {
        &self.components
    }

    /// Builds the cache key for a request.
    ///
    /// The result depends only on the template and the request snapshot, so
    /// identical requests always yield identical keys and hashes.
    pub fn build(&self, meta: &RequestMeta) -> Result<CacheKey, KeyError> {
        let mut parts = KeyParts::new();
        for component in &self.components {
            parts.push(component.to_part(meta)?);
        }
        Ok(parts.into_cache_key())
    }
}

impl Default for KeyTemplate {
    fn default() -> Self {
        Self::new(vec![
            KeyComponent::Method,
            KeyComponent::Scheme,
            KeyComponent::Host,
            KeyComponent::Uri,
        ])
    }
}

impl FromStr for KeyTemplate {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(KeyError::InvalidTemplate("template is empty".to_owned()));
        }
        let components = s
            .split('.')
            .map(|component| component.trim().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(components))
    }
}

impl fmt::Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use http::header::HOST;
    use pretty_assertions::assert_eq;

    fn meta(uri: &str) -> RequestMeta {
        let (parts, _) = Request::get(uri)
            .header(HOST, "example.com")
            .header("x-tenant", "acme")
            .header("cookie", "session=abc")
            .body(())
            .unwrap()
            .into_parts();
        RequestMeta::from_parts(&parts)
    }

    #[test]
    fn test_default_template() {
        let key = KeyTemplate::default().build(&meta("/a?b=1")).unwrap();
        assert_eq!(
            key.as_str(),
            r"method=GET&scheme=http&host=example.com&uri=/a?b\=1"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let template: KeyTemplate = "path.header_x-tenant.cookie_session".parse().unwrap();
        let first = template.build(&meta("/a")).unwrap();
        let second = template.build(&meta("/a")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.hash(), second.hash());
        assert_eq!(
            first.as_str(),
            "path=/a&header_x-tenant=acme&cookie_session=abc"
        );
    }

    #[test]
    fn test_absent_optional_components_render_bare() {
        let template: KeyTemplate = "path.delimiter.query.param_page".parse().unwrap();
        assert_eq!(
            template.build(&meta("/a")).unwrap().as_str(),
            "path=/a&delimiter&query&param_page"
        );
        assert_eq!(
            template.build(&meta("/a?page=2")).unwrap().as_str(),
            r"path=/a&delimiter=?&query=page\=2&param_page=2"
        );
    }

    #[test]
    fn test_header_values_cannot_forge_other_components() {
        let template: KeyTemplate = "header_x-a.header_x-b".parse().unwrap();
        let build = |headers: &[(&str, &str)]| {
            let mut request = Request::get("/a");
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            let (parts, _) = request.body(()).unwrap().into_parts();
            template.build(&RequestMeta::from_parts(&parts)).unwrap()
        };

        let forged = build(&[("x-a", "1&header_x-b=2")]);
        let genuine = build(&[("x-a", "1"), ("x-b", "2&header_x-b")]);
        assert_ne!(forged, genuine);
        assert_ne!(forged.hash(), genuine.hash());
        assert_eq!(forged.as_str(), r"header_x-a=1\&header_x-b\=2&header_x-b");
    }

    #[test]
    fn test_missing_host_fails() {
        let (parts, _) = Request::get("/a").body(()).unwrap().into_parts();
        let meta = RequestMeta::from_parts(&parts);
        assert_eq!(
            KeyTemplate::default().build(&meta),
            Err(KeyError::MissingComponent("host"))
        );
        let path_only: KeyTemplate = "path".parse().unwrap();
        assert!(path_only.build(&meta).is_ok());
    }

    #[test]
    fn test_non_utf8_header_fails() {
        let (parts, _) = Request::get("/a")
            .header("x-bin", http::HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap())
            .body(())
            .unwrap()
            .into_parts();
        let template: KeyTemplate = "header_x-bin".parse().unwrap();
        assert_eq!(
            template.build(&RequestMeta::from_parts(&parts)),
            Err(KeyError::InvalidHeader("x-bin".to_owned()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "method.nope".parse::<KeyTemplate>(),
            Err(KeyError::InvalidTemplate(_))
        ));
        assert!(matches!(
            "param_".parse::<KeyTemplate>(),
            Err(KeyError::InvalidTemplate(_))
        ));
        assert!(matches!(
            "".parse::<KeyTemplate>(),
            Err(KeyError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_display_round_trips_template_text() {
        let text = "method.scheme.host.path.delimiter.query.param_a.header_accept.cookie_b";
        let template: KeyTemplate = text.parse().unwrap();
        assert_eq!(template.to_string(), text);
    }
}
