use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub hits: u64,
    pub misses: u64,
}

/// Per-environment hit/miss accounting. Counters survive bucket rollover and
/// are dropped only by an explicit clear.
#[derive(Default)]
pub struct StatsRegistry {
    per_env: HashMap<String, Counters>,
}

impl StatsRegistry {
    pub fn record_hit(&mut self, env: &str) {
        self.per_env.entry(env.to_string()).or_default().hits += 1;
    }

    pub fn record_miss(&mut self, env: &str) {
        self.per_env.entry(env.to_string()).or_default().misses += 1;
    }

    pub fn counters(&self, env: &str) -> Counters {
        self.per_env.get(env).copied().unwrap_or_default()
    }

    /// Summed across environments at query time, never maintained incrementally.
    pub fn totals(&self) -> Counters {
        self.per_env
            .values()
            .fold(Counters::default(), |acc, c| Counters {
                hits: acc.hits + c.hits,
                misses: acc.misses + c.misses,
            })
    }

    pub fn forget(&mut self, env: &str) {
        self.per_env.remove(env);
    }

    pub fn forget_all(&mut self) {
        self.per_env.clear();
    }
}

/// Snapshot returned by the cache's `stats` surface, per environment or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub maxsize: usize,
    pub currsize: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_across_environments() {
        let mut stats = StatsRegistry::default();
        stats.record_hit("poc");
        stats.record_hit("poc");
        stats.record_miss("poc");
        stats.record_miss("dev");

        assert_eq!(stats.counters("poc"), Counters { hits: 2, misses: 1 });
        assert_eq!(stats.counters("dev"), Counters { hits: 0, misses: 1 });
        assert_eq!(stats.totals(), Counters { hits: 2, misses: 2 });

        stats.forget("poc");
        assert_eq!(stats.totals(), Counters { hits: 0, misses: 1 });
    }
}
