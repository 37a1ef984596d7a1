use std::collections::HashMap;
use std::fmt;

/// A configured source split into scheme, target and query parameters.
///
/// Bare paths (no `://`) are treated as `file` sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUri {
    pub scheme: String,
    pub target: String,
    pub params: HashMap<String, String>,
}

impl SourceUri {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (scheme, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
            None => ("file".to_string(), raw),
        };

        let (target, query) = match rest.split_once('?') {
            Some((target, query)) => (target, Some(query)),
            None => (rest, None),
        };

        let params = query
            .map(|q| {
                q.split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((k, v)) => (k.to_string(), v.to_string()),
                        None => (pair.to_string(), String::new()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            scheme,
            target: target.to_string(),
            params,
        }
    }

    pub fn param<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key).and_then(|v| v.parse().ok())
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.target)
    }
}
