//! Cache key construction

use std::collections::BTreeMap;
use std::fmt;

/// A deterministic, namespaced cache key
///
/// Keys have the shape `namespace/segment/segment[:name=value:name=value]`.
/// Segments and parameters are escaped so that distinct inputs can never
/// produce the same key, and parameters are sorted by name so that the same
/// logical request always produces the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts building a key in the given namespace
    pub fn builder(namespace: impl Into<String>) -> CacheKeyBuilder {
        CacheKeyBuilder {
            namespace: namespace.into(),
            segments: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Low-cardinality label for metrics (`namespace/first-segment`)
    pub fn label(&self) -> &str {
        key_label(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Builder for [`CacheKey`]
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    namespace: String,
    segments: Vec<String>,
    params: BTreeMap<String, String>,
}

impl CacheKeyBuilder {
    /// Appends a path segment (e.g. an entity kind or id)
    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(escape(&segment.to_string()));
        self
    }

    /// Adds a named parameter; parameters are emitted in name order
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params
            .insert(escape(&name.into()), escape(&value.to_string()));
        self
    }

    pub fn build(self) -> CacheKey {
        let mut key = escape(&self.namespace);

        for segment in &self.segments {
            key.push('/');
            key.push_str(segment);
        }

        for (name, value) in &self.params {
            key.push(':');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }

        CacheKey(key)
    }
}

/// Extracts the `namespace/first-segment` prefix of a raw key
pub fn key_label(key: &str) -> &str {
    let head = key.split(':').next().unwrap_or(key);

    match head.match_indices('/').nth(1) {
        Some((idx, _)) => &head[..idx],
        None => head,
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            ':' => out.push_str("%3A"),
            '=' => out.push_str("%3D"),
            '*' => out.push_str("%2A"),
            _ => out.push(c),
        }
    }

    out
}
