//! Failed-login throttle, keyed by normalized email.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::AuthConfig;

/// Above this many tracked emails a failure sweeps out stale entries first.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
struct Entry {
    failed_attempts: u32,
    last_failure: Instant,
    locked: bool,
}

impl Entry {
    /// A lockout, or a run of failures, lasts `lockout` past the latest failure.
    fn is_stale(&self, now: Instant, lockout: Duration) -> bool {
        now >= self.last_failure + lockout
    }
}

#[derive(Debug, Clone)]
pub struct LoginThrottle {
    attempts: Arc<DashMap<String, Entry>>,
    /// 0 disables the throttle.
    max_attempts: u32,
    lockout: Duration,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.max_failed_logins, Duration::from_secs(cfg.lockout_secs))
    }

    /// `false` while the email is locked out. Stale entries are dropped on the way.
    pub fn check(&self, email: &str) -> bool {
        if self.max_attempts == 0 {
            return true;
        }
        let now = Instant::now();
        let (stale, locked) = match self.attempts.get(email) {
            Some(entry) => (entry.is_stale(now, self.lockout), entry.locked),
            None => return true,
        };
        if stale {
            // the read guard above is gone, so the shard lock is free
            self.attempts.remove_if(email, |_, e| e.is_stale(now, self.lockout));
            return true;
        }
        !locked
    }

    pub fn record_failure(&self, email: &str) {
        if self.max_attempts == 0 {
            return;
        }
        let now = Instant::now();
        if self.attempts.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }

        let mut entry = self.attempts.entry(email.to_owned()).or_insert(Entry {
            failed_attempts: 0,
            last_failure: now,
            locked: false,
        });
        if entry.is_stale(now, self.lockout) {
            entry.failed_attempts = 0;
            entry.locked = false;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;
        if entry.failed_attempts >= self.max_attempts {
            entry.locked = true;
            warn!(email = %email, attempts = entry.failed_attempts, "login locked out");
        }
    }

    pub fn record_success(&self, email: &str) {
        self.attempts.remove(email);
    }

    /// Number of emails currently tracked.
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    fn prune(&self, now: Instant) {
        let before = self.attempts.len();
        self.attempts.retain(|_, e| !e.is_stale(now, self.lockout));
        debug!(before, after = self.attempts.len(), "pruned login throttle");
    }
}
