//! Route matching logic.
//!
//! # Responsibilities
//! - Match exact paths, optionally restricted to read methods
//! - Match path prefixes on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex, so every match is a linear scan
//! - `/api` prefix matches `/api` and `/api/...`, never `/apiary`

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if a request with this method and path matches.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches one of a set of exact paths, for `GET` and `HEAD` only.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    paths: Vec<&'static str>,
}

impl ExactPathMatcher {
    pub fn new(paths: &[&'static str]) -> Self {
        Self {
            paths: paths.to_vec(),
        }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        (*method == Method::GET || *method == Method::HEAD) && self.paths.iter().any(|p| *p == path)
    }
}

/// Matches the request path prefix, any method.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing `/` is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Matches everything.
#[derive(Debug, Clone, Copy)]
pub struct AnyMatcher;

impl Matcher for AnyMatcher {
    fn matches(&self, _method: &Method, _path: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher() {
        let matcher = ExactPathMatcher::new(&["/", "/health"]);

        assert!(matcher.matches(&Method::GET, "/"));
        assert!(matcher.matches(&Method::HEAD, "/health"));
        assert!(!matcher.matches(&Method::GET, "/health/"));
        assert!(!matcher.matches(&Method::GET, "/HEALTH"));
        assert!(!matcher.matches(&Method::POST, "/health"));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api/");

        assert!(matcher.matches(&Method::GET, "/api"));
        assert!(matcher.matches(&Method::DELETE, "/api/v1/random"));
        assert!(matcher.matches(&Method::POST, "/api/"));
        assert!(!matcher.matches(&Method::GET, "/apiary"));
        assert!(!matcher.matches(&Method::GET, "/images/api"));
    }

    #[test]
    fn test_any_matcher() {
        assert!(AnyMatcher.matches(&Method::PATCH, "/whatever"));
        assert!(AnyMatcher.matches(&Method::GET, ""));
    }
}
