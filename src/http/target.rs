//! The broker every request is forwarded to.

use axum::http::Uri;
use thiserror::Error;
use url::Url;

/// Reasons a broker URL is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme '{0}'")]
    Scheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Parsed, absolute broker URL. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    url: Url,
    authority: String,
}

impl BackendTarget {
    /// Parse an absolute `http`/`https` URL.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TargetError::Scheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or(TargetError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self { url, authority })
    }

    /// The URL as configured.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host (and explicit port) sent as the `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Resolve a path and query against the broker.
    ///
    /// The broker's own path is joined with `path` by exactly one slash and
    /// both query strings are kept, broker first.
    pub fn join(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.url.clone();
        url.set_path(&join_paths(self.url.path(), path));

        let base_query = self.url.query().filter(|q| !q.is_empty());
        let query = query.filter(|q| !q.is_empty());
        let merged = match (base_query, query) {
            (Some(a), Some(b)) => Some(format!("{}&{}", a, b)),
            (Some(a), None) => Some(a.to_string()),
            (None, Some(b)) => Some(b.to_string()),
            (None, None) => None,
        };
        url.set_query(merged.as_deref());
        url.set_fragment(None);
        url
    }

    /// Resolve an inbound request URI against the broker.
    pub fn resolve(&self, uri: &Uri) -> Url {
        self.join(uri.path(), uri.query())
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_relative() {
        assert!(matches!(
            BackendTarget::parse("notaurl"),
            Err(TargetError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert_eq!(
            BackendTarget::parse("ftp://broker.example.com"),
            Err(TargetError::Scheme("ftp".into()))
        );
    }

    #[test]
    fn test_authority_keeps_explicit_port() {
        let target = BackendTarget::parse("http://127.0.0.1:9000").unwrap();
        assert_eq!(target.authority(), "127.0.0.1:9000");

        let target = BackendTarget::parse("https://broker.example.com:443/").unwrap();
        assert_eq!(target.authority(), "broker.example.com");
    }

    #[test]
    fn test_join_paths() {
        let target = BackendTarget::parse("https://broker.example.com").unwrap();
        assert_eq!(
            target.join("/v2/catalog", None).as_str(),
            "https://broker.example.com/v2/catalog"
        );

        let target = BackendTarget::parse("https://broker.example.com/api/").unwrap();
        assert_eq!(
            target.join("/v2/catalog", None).as_str(),
            "https://broker.example.com/api/v2/catalog"
        );

        let target = BackendTarget::parse("https://broker.example.com/api").unwrap();
        assert_eq!(
            target.join("/v2/service_instances/1", None).as_str(),
            "https://broker.example.com/api/v2/service_instances/1"
        );
    }

    #[test]
    fn test_join_queries() {
        let target = BackendTarget::parse("https://broker.example.com/?region=eu").unwrap();
        let uri: Uri = "/v2/service_instances/abc?accepts_incomplete=true".parse().unwrap();
        assert_eq!(
            target.resolve(&uri).as_str(),
            "https://broker.example.com/v2/service_instances/abc?region=eu&accepts_incomplete=true"
        );

        let target = BackendTarget::parse("https://broker.example.com").unwrap();
        let uri: Uri = "/v2/catalog".parse().unwrap();
        assert_eq!(target.resolve(&uri).query(), None);
    }
}
