use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime};

use crate::errors::Error;

/// Maps (environment, now) to the start of the current cache bucket.
///
/// The first call for an environment pins `last_access` to `now`, so buckets are
/// aligned to each environment's first call rather than a fixed origin. Later
/// calls derive the most recent bucket boundary at or before `now` without
/// touching state.
pub struct TimeBucketer {
    durations: BTreeMap<String, Duration>,
    last_access: HashMap<String, SystemTime>,
}

impl TimeBucketer {
    pub fn new(durations: BTreeMap<String, Duration>) -> Self {
        Self {
            durations,
            last_access: HashMap::new(),
        }
    }

    /// Bucket duration for a configured environment. Durations are validated
    /// to be non-zero at config load, so this never divides by zero.
    pub fn duration(&self, env: &str) -> Result<Duration, Error> {
        self.durations
            .get(env)
            .copied()
            .ok_or_else(|| Error::UnknownEnvironment {
                environment: env.to_string(),
            })
    }

    pub fn current_epoch(&mut self, env: &str, now: SystemTime) -> Result<SystemTime, Error> {
        let duration = self.duration(env)?;

        match self.last_access.get(env) {
            None => {
                self.last_access.insert(env.to_string(), now);
                Ok(now)
            }
            Some(&last) => {
                // A clock that went backwards lands in interval zero.
                let elapsed = now.duration_since(last).unwrap_or_default();
                let intervals = elapsed.as_millis() / duration.as_millis();
                let offset = (intervals as u64).saturating_mul(duration.as_millis() as u64);
                Ok(last + Duration::from_millis(offset))
            }
        }
    }

    /// Re-pins the environment's bucket alignment, used on rollover.
    pub fn reset(&mut self, env: &str, now: SystemTime) {
        self.last_access.insert(env.to_string(), now);
    }

    pub fn forget(&mut self, env: &str) {
        self.last_access.remove(env);
    }

    pub fn forget_all(&mut self) {
        self.last_access.clear();
    }

    pub fn last_access(&self, env: &str) -> Option<SystemTime> {
        self.last_access.get(env).copied()
    }
}
