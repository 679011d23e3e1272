use std::collections::HashMap;
use std::time::SystemTime;

/// (subject, epoch). At most one entry exists per key within an environment.
pub type CacheKey = (String, SystemTime);

/// Per-environment bounded store. Eviction cares only about epoch ordering:
/// the entry in the oldest bucket goes first, ties broken on the smaller
/// subject so the outcome never depends on insertion order.
pub struct CacheStore<V> {
    maxsize: usize,
    envs: HashMap<String, HashMap<CacheKey, V>>,
}

impl<V> CacheStore<V> {
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            envs: HashMap::new(),
        }
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn get(&self, env: &str, key: &CacheKey) -> Option<&V> {
        self.envs.get(env)?.get(key)
    }

    /// Inserts, then evicts the oldest entry if the environment exceeds
    /// `maxsize`. Returns the evicted key, if any. A `put` within capacity is
    /// insertion only.
    pub fn put(&mut self, env: &str, key: CacheKey, value: V) -> Option<CacheKey> {
        let entries = self.envs.entry(env.to_string()).or_default();
        entries.insert(key, value);

        if entries.len() <= self.maxsize {
            return None;
        }

        let oldest = entries
            .keys()
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .cloned();
        if let Some(oldest) = &oldest {
            entries.remove(oldest);
        }
        oldest
    }

    /// Drops an environment's entries without forgetting the environment.
    /// Used on bucket rollover, where statistics must survive.
    pub fn clear_entries(&mut self, env: &str) {
        if let Some(entries) = self.envs.get_mut(env) {
            entries.clear();
        }
    }

    pub fn remove_env(&mut self, env: &str) {
        self.envs.remove(env);
    }

    pub fn clear_all(&mut self) {
        self.envs.clear();
    }

    pub fn len(&self, env: &str) -> usize {
        self.envs.get(env).map_or(0, HashMap::len)
    }

    pub fn total_len(&self) -> usize {
        self.envs.values().map(HashMap::len).sum()
    }
}
