//! URL handling module for Rockpool
//!
//! This module turns raw hrefs into canonical same-domain URLs: it resolves
//! relative references, applies the normalization rules that define the
//! dedup key, and gates everything against the job's domain scope.

mod normalize;
mod scope;

pub use normalize::{normalize, normalize_url};
pub use scope::DomainScope;

use url::Url;

/// Canonicalizes a raw href against a base URL within a domain scope
///
/// This is the single entry point link discovery goes through. It:
///
/// 1. Resolves `raw` against `base` (handles relative paths, `..`, etc.)
/// 2. Rejects non-HTTP(S) schemes and malformed references
/// 3. Applies the normalization rules (see [`normalize_url`])
/// 4. Rejects hosts outside the job's [`DomainScope`]
///
/// Rejection is silent by design: a page full of mailto links, off-domain
/// links, or garbage hrefs is normal input, not an error condition.
///
/// # Arguments
///
/// * `raw` - The href as found in the document (may be relative)
/// * `base` - The URL of the page the href was found on
/// * `scope` - The job's domain scope
///
/// # Returns
///
/// * `Some(Url)` - The canonical in-scope URL
/// * `None` - The href is unusable or out of scope
///
/// # Examples
///
/// ```
/// use rockpool::url::{canonicalize, DomainScope};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/a/b").unwrap();
/// let scope = DomainScope::new("example.com", false);
///
/// let child = canonicalize("../c/", &base, &scope).unwrap();
/// assert_eq!(child.as_str(), "https://example.com/c");
///
/// assert!(canonicalize("https://other.com/", &base, &scope).is_none());
/// ```
pub fn canonicalize(raw: &str, base: &Url, scope: &DomainScope) -> Option<Url> {
    let href = raw.trim();
    if href.is_empty() {
        return None;
    }

    let joined = base.join(href).ok()?;
    let normalized = normalize(joined).ok()?;

    let host = normalized.host_str()?;
    if !scope.contains(host) {
        return None;
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/section/page").unwrap()
    }

    fn scope() -> DomainScope {
        DomainScope::new("example.com", false)
    }

    #[test]
    fn test_absolute_same_domain() {
        let result = canonicalize("https://example.com/other", &base(), &scope());
        assert_eq!(result.unwrap().as_str(), "https://example.com/other");
    }

    #[test]
    fn test_relative_resolved_against_base() {
        let result = canonicalize("sibling", &base(), &scope());
        assert_eq!(result.unwrap().as_str(), "https://example.com/section/sibling");
    }

    #[test]
    fn test_root_relative() {
        let result = canonicalize("/top", &base(), &scope());
        assert_eq!(result.unwrap().as_str(), "https://example.com/top");
    }

    #[test]
    fn test_parent_relative() {
        let result = canonicalize("../elsewhere/", &base(), &scope());
        assert_eq!(result.unwrap().as_str(), "https://example.com/elsewhere");
    }

    #[test]
    fn test_off_domain_dropped() {
        assert!(canonicalize("https://other.com/page", &base(), &scope()).is_none());
    }

    #[test]
    fn test_subdomain_dropped_without_policy() {
        assert!(canonicalize("https://blog.example.com/post", &base(), &scope()).is_none());
    }

    #[test]
    fn test_subdomain_accepted_with_policy() {
        let scope = DomainScope::new("example.com", true);
        let result = canonicalize("https://blog.example.com/post", &base(), &scope);
        assert_eq!(result.unwrap().as_str(), "https://blog.example.com/post");
    }

    #[test]
    fn test_mailto_dropped() {
        assert!(canonicalize("mailto:a@example.com", &base(), &scope()).is_none());
    }

    #[test]
    fn test_javascript_dropped() {
        assert!(canonicalize("javascript:void(0)", &base(), &scope()).is_none());
    }

    #[test]
    fn test_empty_href_dropped() {
        assert!(canonicalize("   ", &base(), &scope()).is_none());
    }

    #[test]
    fn test_fragment_only_resolves_to_base_page() {
        // A bare fragment resolves to the page itself; the fragment is then
        // stripped, so the result equals the canonical base page.
        let result = canonicalize("#section", &base(), &scope());
        assert_eq!(result.unwrap().as_str(), "https://example.com/section/page");
    }

    #[test]
    fn test_canonical_input_unchanged() {
        let canonical = "https://example.com/a/b?x=1&y=2";
        let result = canonicalize(canonical, &base(), &scope());
        assert_eq!(result.unwrap().as_str(), canonical);
    }
}
