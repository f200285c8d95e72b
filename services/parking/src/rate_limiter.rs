//! Failed-login throttle for slowing down password guessing
//!
//! Keys combine the username with the client address, so failures from one
//! client never lock the account for everyone else. Entries whose window or
//! lockout has passed are swept out at most once per window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Login throttle configuration
#[derive(Debug, Clone)]
pub struct LoginThrottleConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Lockout duration in seconds
    pub lockout_seconds: u64,
}

impl Default for LoginThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,  // 5 minutes
            lockout_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct ThrottleEntry {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

impl ThrottleEntry {
    /// Nothing left to remember once the lockout or the window has passed
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.locked_until {
            Some(until) => now >= until,
            None => now.duration_since(self.window_start) >= window,
        }
    }
}

#[derive(Debug)]
struct ThrottleState {
    entries: HashMap<String, ThrottleEntry>,
    last_sweep: Instant,
}

/// Throttle key for a login attempt
pub fn throttle_key(username: &str, client: Option<IpAddr>) -> String {
    match client {
        Some(ip) => format!("{}@{}", username, ip),
        None => username.to_string(),
    }
}

/// Per-key failed login counter
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: LoginThrottleConfig,
    state: Arc<Mutex<ThrottleState>>,
}

impl LoginThrottle {
    pub fn new(config: LoginThrottleConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ThrottleState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Whether a login attempt for `key` may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now()).await
    }

    /// Record a failed attempt; locks the key once the limit is reached
    pub async fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now()).await
    }

    /// Forget the key after a successful login
    pub async fn reset(&self, key: &str) {
        self.state.lock().await.entries.remove(key);
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    fn sweep(&self, state: &mut ThrottleState, now: Instant) {
        let window = self.window();
        if now.duration_since(state.last_sweep) < window {
            return;
        }

        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_stale(now, window));
        state.last_sweep = now;

        let removed = before - state.entries.len();
        if removed > 0 {
            debug!("Dropped {} stale login throttle entries", removed);
        }
    }

    async fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.state.lock().await;
        self.sweep(&mut state, now);

        let locked_until = match state.entries.get(key) {
            Some(entry) => entry.locked_until,
            None => return true,
        };

        match locked_until {
            Some(until) if now < until => false,
            Some(_) => {
                // Lockout expired
                state.entries.remove(key);
                true
            }
            None => true,
        }
    }

    async fn record_failure_at(&self, key: &str, now: Instant) {
        let mut state = self.state.lock().await;
        self.sweep(&mut state, now);
        let window = self.window();

        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert(ThrottleEntry {
                failures: 0,
                window_start: now,
                locked_until: None,
            });

        if entry.locked_until.is_none() && now.duration_since(entry.window_start) >= window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_attempts && entry.locked_until.is_none() {
            entry.locked_until = Some(now + Duration::from_secs(self.config.lockout_seconds));
            warn!(
                "Locked logins for {} for {} seconds after {} failures",
                key, self.config.lockout_seconds, entry.failures
            );
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(LoginThrottleConfig::default())
    }
}
