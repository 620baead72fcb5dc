use crate::UrlError;
use url::Url;

/// The set of hosts a crawl job is allowed to visit
///
/// A scope is derived from the root URL's host. By default only that exact
/// host is in scope; with `include_subdomains` enabled, any host ending in
/// `.{root_host}` is accepted as well. Links outside the scope are dropped
/// at canonicalization time and never enter the frontier.
#[derive(Debug, Clone)]
pub struct DomainScope {
    root_host: String,
    include_subdomains: bool,
}

impl DomainScope {
    /// Creates a scope for the given host
    ///
    /// The host is lowercased so scope checks are case-insensitive.
    pub fn new(root_host: &str, include_subdomains: bool) -> Self {
        Self {
            root_host: root_host.to_lowercase(),
            include_subdomains,
        }
    }

    /// Derives a scope from the crawl's root URL
    ///
    /// # Arguments
    ///
    /// * `root_url` - The job's starting URL
    /// * `include_subdomains` - Whether subdomains of the root host are in scope
    ///
    /// # Returns
    ///
    /// * `Ok(DomainScope)` - Scope covering the root URL's host
    /// * `Err(UrlError)` - The root URL has no host
    pub fn from_root_url(root_url: &Url, include_subdomains: bool) -> Result<Self, UrlError> {
        let host = root_url.host_str().ok_or(UrlError::MissingHost)?;
        Ok(Self::new(host, include_subdomains))
    }

    /// Returns the root host this scope was derived from
    pub fn root_host(&self) -> &str {
        &self.root_host
    }

    /// Checks whether a host falls inside this scope
    pub fn contains(&self, host: &str) -> bool {
        let host = host.to_lowercase();

        if host == self.root_host {
            return true;
        }

        if self.include_subdomains {
            let suffix = format!(".{}", self.root_host);
            return host.ends_with(&suffix);
        }

        false
    }
}
