//! Per-origin robots.txt cache entries
//!
//! One entry is created lazily the first time an origin is queried and kept
//! for the life of the crawl job; robots.txt is assumed stable for the crawl
//! duration, so entries are never invalidated mid-job.

use crate::robots::RobotsRules;
use chrono::{DateTime, Utc};

/// Cached robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The evaluated rules (allow-all when the fetch failed)
    pub rules: RobotsRules,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a cache entry stamped with the current time
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_keeps_rules() {
        let entry = CachedRobots::new(RobotsRules::from_content("User-agent: *\nDisallow: /x"));
        assert!(!entry.rules.is_allowed("https://example.com/x", "Bot"));
        assert!(entry.rules.is_allowed("https://example.com/y", "Bot"));
    }

    #[test]
    fn test_entry_is_stamped() {
        let before = Utc::now();
        let entry = CachedRobots::new(RobotsRules::allow_all());
        assert!(entry.fetched_at >= before);
    }
}
