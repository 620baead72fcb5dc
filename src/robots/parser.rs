//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate, which
//! implements the standard precedence rules: the longest matching prefix
//! wins, with ties broken in favor of Allow, and user-agent groups falling
//! back to `*` when no specific group matches. Crawl-delay is not part of
//! that standard, so it is parsed here directly.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Evaluated robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates permissive rules that allow everything
    ///
    /// Used whenever robots.txt could not be fetched: absence of robots
    /// data never blocks a crawl.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A `Crawl-delay` directive applies to the user-agent group it appears
    /// in; a group-specific delay takes precedence over the `*` group.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The delay requested by the site
    /// * `None` - No crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.content.is_empty() {
            return None;
        }

        let mut current_user_agents: Vec<String> = Vec::new();
        let mut delay_for_wildcard: Option<f64> = None;
        let mut delay_for_agent: Option<f64> = None;

        let normalized_agent = user_agent.to_lowercase();

        for line in self.content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = trimmed.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim();

                match key.as_str() {
                    "user-agent" => {
                        // Consecutive User-agent lines form one group
                        current_user_agents.push(value.to_lowercase());
                    }
                    "crawl-delay" => {
                        if let Ok(delay) = value.parse::<f64>() {
                            if current_user_agents
                                .iter()
                                .any(|ua| ua == "*" || normalized_agent.contains(ua))
                            {
                                if current_user_agents.contains(&"*".to_string()) {
                                    delay_for_wildcard = Some(delay);
                                } else {
                                    delay_for_agent = Some(delay);
                                }
                            }
                        }
                        // The next User-agent directive starts a new group
                        current_user_agents.clear();
                    }
                    _ => {}
                }
            }
        }

        delay_for_agent
            .or(delay_for_wildcard)
            .filter(|d| *d >= 0.0)
            .map(Duration::from_secs_f64)
    }
}
