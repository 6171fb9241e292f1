//! Timing and policy configuration for the read and write paths.
//!
//! Every field has a default, so an empty `[read]` table (or none at all)
//! yields the stock behaviour.

use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::Quiescence;
use crate::namespace::NamespaceSet;

/// Configuration shared by the resolver, loader, aggregators and writer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Consult the legacy namespace on reads.
    pub legacy_namespace: bool,
    /// Origin used when building share links (e.g. `https://linko.example`).
    pub base_url: String,
    pub resolver: ResolverConfig,
    pub loader: LoaderConfig,
    pub aggregation: AggregationConfig,
    pub writer: WriterConfig,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            legacy_namespace: true,
            base_url: String::new(),
            resolver: ResolverConfig::default(),
            loader: LoaderConfig::default(),
            aggregation: AggregationConfig::default(),
            writer: WriterConfig::default(),
        }
    }
}

impl ReadConfig {
    /// Namespaces to consult, in precedence order.
    pub fn namespaces(&self) -> NamespaceSet {
        if self.legacy_namespace {
            NamespaceSet::migrating()
        } else {
            NamespaceSet::current_only()
        }
    }
}

/// Slug resolution retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Extra probes after the first one.
    pub retries: u32,
    /// How long a single namespace read may take before it counts as a miss.
    pub probe_timeout_ms: u64,
    /// Pause between probes.
    pub retry_delay_ms: u64,
    /// Hard cap on the whole resolution.
    pub deadline_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            probe_timeout_ms: 1000,
            retry_delay_ms: 1000,
            deadline_ms: 8000,
        }
    }
}

impl ResolverConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub load_timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 5000,
        }
    }
}

impl LoaderConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

/// Strategy used to decide that a subscription has gone quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuiescenceMode {
    /// Commit `window_ms` after the subscription starts.
    Fixed,
    /// Commit after `idle_ms` without a new or changed key, capped at `max_ms`.
    Debounce,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub quiescence: QuiescenceMode,
    pub window_ms: u64,
    pub idle_ms: u64,
    pub max_ms: u64,
    /// Commit as soon as the store reports its snapshot delivered.
    pub use_sync_marker: bool,
    /// Budget for checking standalone component tombstones at commit.
    pub standalone_timeout_ms: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            quiescence: QuiescenceMode::Debounce,
            window_ms: 1500,
            idle_ms: 400,
            max_ms: 1500,
            use_sync_marker: true,
            standalone_timeout_ms: 1000,
        }
    }
}

impl AggregationConfig {
    pub fn quiescence(&self) -> Quiescence {
        match self.quiescence {
            QuiescenceMode::Fixed => Quiescence::Fixed(Duration::from_millis(self.window_ms)),
            QuiescenceMode::Debounce => Quiescence::Debounce {
                idle: Duration::from_millis(self.idle_ms),
                max: Duration::from_millis(self.max_ms),
            },
        }
    }

    pub fn standalone_timeout(&self) -> Duration {
        Duration::from_millis(self.standalone_timeout_ms)
    }
}

/// What happens to a page's slug mapping when the page is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugRetention {
    /// Clear the mapping so the slug can be claimed again.
    #[default]
    Release,
    /// Keep the mapping; the slug stays bound to the deleted page.
    Reserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub availability_timeout_ms: u64,
    pub slug_retention: SlugRetention,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            availability_timeout_ms: 1000,
            slug_retention: SlugRetention::Release,
        }
    }
}

impl WriterConfig {
    pub fn availability_timeout(&self) -> Duration {
        Duration::from_millis(self.availability_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReadConfig::default();
        assert_eq!(config.resolver.retries, 3);
        assert_eq!(config.namespaces(), NamespaceSet::migrating());
        assert_eq!(
            config.aggregation.quiescence(),
            Quiescence::Debounce {
                idle: Duration::from_millis(400),
                max: Duration::from_millis(1500),
            }
        );
        assert_eq!(config.writer.slug_retention, SlugRetention::Release);
    }

    #[test]
    fn test_partial_json_overrides() -> anyhow::Result<()> {
        let config: ReadConfig = serde_json::from_value(serde_json::json!({
            "legacy_namespace": false,
            "aggregation": {"quiescence": "fixed", "window_ms": 1000},
            "writer": {"slug_retention": "reserve"}
        }))?;
        assert_eq!(config.namespaces(), NamespaceSet::current_only());
        assert_eq!(
            config.aggregation.quiescence(),
            Quiescence::Fixed(Duration::from_millis(1000))
        );
        assert!(config.aggregation.use_sync_marker);
        assert_eq!(config.writer.slug_retention, SlugRetention::Reserve);
        assert_eq!(config.resolver.deadline(), Duration::from_millis(8000));
        Ok(())
    }
}
