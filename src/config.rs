use std::env;
use std::time::Duration;

pub fn get_env_var(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("env var \"{}\" not set", name))
}

/// Engine tuning knobs, read from the environment with sane defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a caller may wait for an auction's critical section before
    /// the request is bounced with `Contention`.
    pub lock_timeout: Duration,
    /// Snapshots buffered per fan-out channel before lagging subscribers
    /// start losing the oldest ones.
    pub notify_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            lock_timeout: Duration::from_secs(5),
            notify_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// `LOCK_TIMEOUT_MS` and `NOTIFY_CAPACITY`; unset or unparsable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let lock_timeout = get_env_var("LOCK_TIMEOUT_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.lock_timeout);
        let notify_capacity = get_env_var("NOTIFY_CAPACITY")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(defaults.notify_capacity);
        EngineConfig {
            lock_timeout,
            notify_capacity,
        }
    }
}
