use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::DashboardConfig;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Per-environment entry limit.
    pub maxsize: usize,
    /// Bucket duration per environment, fixed at process start.
    pub durations: BTreeMap<String, Duration>,
}

impl CacheConfig {
    pub fn from_settings(settings: &DashboardConfig) -> Self {
        Self {
            maxsize: settings.cache.maxsize,
            durations: settings.durations(),
        }
    }
}
