//! Configuration loading and management

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page size used when neither the URL nor the caller picks one
pub const DEFAULT_LIMIT: usize = 20;

/// Page sizes a list view may request
pub const ALLOWED_LIMITS: [usize; 4] = [10, 20, 50, 100];

/// Configuration shared by the codec, the controller and list endpoints
///
/// # Example
///
/// ```yaml
/// default_limit: 20
/// allowed_limits: [10, 20, 50, 100]
/// debounce_ms: 300
/// max_visible_pages: 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Page size omitted from URLs and assumed when `limit` is absent
    pub default_limit: usize,

    /// Page sizes accepted from URLs and list requests
    pub allowed_limits: Vec<usize>,

    /// Quiet period before the address bar catches up with the state
    pub debounce_ms: u64,

    /// Page buttons shown before the pager collapses ranges into ellipses
    pub max_visible_pages: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            allowed_limits: ALLOWED_LIMITS.to_vec(),
            debounce_ms: 300,
            max_visible_pages: 5,
        }
    }
}

impl ListConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed_limits.is_empty() || self.allowed_limits.contains(&0) {
            bail!("allowed_limits must be a non-empty list of positive page sizes");
        }
        if !self.is_allowed_limit(self.default_limit) {
            bail!(
                "default_limit {} is not one of allowed_limits {:?}",
                self.default_limit,
                self.allowed_limits
            );
        }
        if self.max_visible_pages < 3 {
            bail!("max_visible_pages must be at least 3 (first, current, last)");
        }
        Ok(())
    }

    pub fn is_allowed_limit(&self, limit: usize) -> bool {
        self.allowed_limits.contains(&limit)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Copy with a different default page size, added to the allowed set
    ///
    /// List views that default to an unusual page size (e.g. a 12-card grid)
    /// still need that size to survive a URL round-trip.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        if !self.allowed_limits.contains(&limit) {
            self.allowed_limits.push(limit);
            self.allowed_limits.sort_unstable();
        }
        self.default_limit = limit;
        self
    }
}
