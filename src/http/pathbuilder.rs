//! Request path construction.
//!
//! A fetch consumes its path exactly once, before any I/O. Anything that
//! can produce the final path string implements [`BuildPath`]; plain
//! strings do, and [`PathBuilder`] assembles a base path with
//! form-urlencoded query parameters.

use std::collections::BTreeMap;

/// Produces the absolute request path (`/path?query`).
pub trait BuildPath {
    fn build_path(&self) -> String;
}

impl BuildPath for str {
    fn build_path(&self) -> String {
        self.to_string()
    }
}

impl BuildPath for String {
    fn build_path(&self) -> String {
        self.clone()
    }
}

impl<T: BuildPath + ?Sized> BuildPath for &T {
    fn build_path(&self) -> String {
        (**self).build_path()
    }
}

/// Base path plus named query parameters.
///
/// Parameters are emitted in key order, so the same set of parameters
/// always builds the same path.
///
/// ```
/// use tlsfetch::http::{BuildPath, PathBuilder};
///
/// let mut path = PathBuilder::new("/search");
/// path.add_param("q", "rust tls");
/// path.add_param("page", "2");
/// assert_eq!(path.build_path(), "/search?page=2&q=rust+tls");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathBuilder {
    base: String,
    params: BTreeMap<String, String>,
}

impl PathBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter; an existing value for `key` is kept.
    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn remove_param(&mut self, key: &str) {
        self.params.remove(key);
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl BuildPath for PathBuilder {
    fn build_path(&self) -> String {
        let mut path = if self.base.starts_with('/') {
            self.base.clone()
        } else {
            format!("/{}", self.base)
        };

        if !self.params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.params)
                .finish();
            path.push('?');
            path.push_str(&query);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_params() {
        assert_eq!(PathBuilder::new("/status").build_path(), "/status");
        assert_eq!(PathBuilder::new("status").build_path(), "/status");
        assert_eq!(PathBuilder::default().build_path(), "/");
    }

    #[test]
    fn test_add_remove_clear() {
        let mut path = PathBuilder::new("/api");
        path.add_param("b", "2");
        path.add_param("a", "1");
        assert_eq!(path.build_path(), "/api?a=1&b=2");

        // First insert wins, as with a plain map insert.
        path.add_param("a", "other");
        assert_eq!(path.param("a"), Some("1"));

        path.remove_param("a");
        assert_eq!(path.build_path(), "/api?b=2");

        path.clear();
        assert!(path.is_empty());
        assert_eq!(path.build_path(), "/api");
    }

    #[test]
    fn test_encoding() {
        let mut path = PathBuilder::new("/q");
        path.add_param("x y", "a&b=c");
        assert_eq!(path.build_path(), "/q?x+y=a%26b%3Dc");
    }

    #[test]
    fn test_strings_build_themselves() {
        assert_eq!("/plain".build_path(), "/plain");
        assert_eq!(String::from("/owned").build_path(), "/owned");
    }
}
