//! Cooldown ledger
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Remaining time follows the command's current cooldown
//! - 2.0.0: Stamp-per-invocation ledger with expiry pruning
//! - 1.0.0: Sliding window limiter

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// How often the bot sweeps expired stamps
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Composite key: (command name, user id)
type CooldownKey = (String, u64);

#[derive(Debug, Clone, Copy)]
struct Stamp {
    last: Instant,
    /// Latest cooldown checked against this stamp, only used for pruning
    window: Duration,
}

impl Stamp {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.window
    }
}

#[derive(Debug, Default)]
pub struct CooldownLedger {
    stamps: DashMap<CooldownKey, Stamp>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self {
            stamps: DashMap::new(),
        }
    }

    /// Check and record an invocation
    ///
    /// Returns `Err(remaining)` when the user used `command` less than `cooldown`
    /// ago. The window is measured with the `cooldown` passed now, so a reloaded
    /// definition with a shorter cooldown applies at once. Rejected attempts do
    /// not refresh the stamp. A zero cooldown is never limited and leaves no
    /// entry behind.
    pub fn check(
        &self,
        command: &str,
        user_id: u64,
        cooldown: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        if cooldown.is_zero() {
            return Ok(());
        }

        match self.stamps.entry((command.to_string(), user_id)) {
            Entry::Occupied(mut occupied) => {
                let stamp = occupied.get_mut();
                stamp.window = cooldown;
                let elapsed = now.saturating_duration_since(stamp.last);
                if elapsed < cooldown {
                    return Err(cooldown - elapsed);
                }
                stamp.last = now;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Stamp {
                    last: now,
                    window: cooldown,
                });
            }
        }
        Ok(())
    }

    /// When `user_id` last ran `command`, if still tracked
    pub fn last_used(&self, command: &str, user_id: u64) -> Option<Instant> {
        self.stamps
            .get(&(command.to_string(), user_id))
            .map(|s| s.last)
    }

    /// Drop every stamp whose cooldown has run out; returns how many went
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.stamps.len();
        self.stamps.retain(|_, stamp| !stamp.expired(now));
        before.saturating_sub(self.stamps.len())
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Periodically prune `ledger` until the runtime shuts down
pub fn spawn_prune_loop(ledger: Arc<CooldownLedger>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = ledger.prune(Instant::now());
            if removed > 0 {
                debug!("🧹 Pruned {removed} expired cooldown(s), {} tracked", ledger.len());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const PING: &str = "ping";

    #[test]
    fn test_first_use_is_allowed() {
        let ledger = CooldownLedger::new();
        let now = Instant::now();

        assert!(ledger.check(PING, 1, Duration::from_secs(3), now).is_ok());
        assert_eq!(ledger.last_used(PING, 1), Some(now));
    }

    #[test]
    fn test_second_use_within_window_reports_remaining() {
        let ledger = CooldownLedger::new();
        let t0 = Instant::now();
        let cooldown = Duration::from_secs(3);

        ledger.check(PING, 1, cooldown, t0).unwrap();
        let remaining = ledger
            .check(PING, 1, cooldown, t0 + Duration::from_millis(1200))
            .unwrap_err();

        assert_eq!(remaining, Duration::from_millis(1800));
    }

    #[test]
    fn test_rejection_does_not_extend_cooldown() {
        let ledger = CooldownLedger::new();
        let t0 = Instant::now();
        let cooldown = Duration::from_secs(3);

        ledger.check(PING, 1, cooldown, t0).unwrap();
        assert!(ledger.check(PING, 1, cooldown, t0 + Duration::from_secs(2)).is_err());
        assert!(ledger.check(PING, 1, cooldown, t0 + Duration::from_secs(3)).is_ok());
    }

    #[test]
    fn test_lowered_cooldown_applies_to_existing_stamp() {
        let ledger = CooldownLedger::new();
        let t0 = Instant::now();

        ledger.check(PING, 1, Duration::from_secs(60), t0).unwrap();
        // Definition reloaded with a 3s cooldown
        assert!(ledger
            .check(PING, 1, Duration::from_secs(3), t0 + Duration::from_secs(10))
            .is_ok());
        assert_eq!(ledger.last_used(PING, 1), Some(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_raised_cooldown_extends_remaining() {
        let ledger = CooldownLedger::new();
        let t0 = Instant::now();

        ledger.check(PING, 1, Duration::from_secs(3), t0).unwrap();
        let remaining = ledger
            .check(PING, 1, Duration::from_secs(30), t0 + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(remaining, Duration::from_secs(20));
    }

    #[test]
    fn test_other_users_and_commands_are_independent() {
        let ledger = CooldownLedger::new();
        let now = Instant::now();
        let cooldown = Duration::from_secs(3);

        ledger.check(PING, 1, cooldown, now).unwrap();
        assert!(ledger.check(PING, 2, cooldown, now).is_ok());
        assert!(ledger.check("info", 1, cooldown, now).is_ok());
        assert!(ledger.check(PING, 1, cooldown, now).is_err());
    }

    #[test]
    fn test_zero_cooldown_never_limits() {
        let ledger = CooldownLedger::new();
        let now = Instant::now();

        for _ in 0..5 {
            assert!(ledger.check(PING, 1, Duration::ZERO, now).is_ok());
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let ledger = CooldownLedger::new();
        let t0 = Instant::now();

        ledger.check("short", 1, Duration::from_secs(1), t0).unwrap();
        ledger.check("long", 1, Duration::from_secs(60), t0).unwrap();

        assert_eq!(ledger.prune(t0 + Duration::from_secs(2)), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_used("long", 1).is_some());
        assert!(ledger.last_used("short", 1).is_none());
    }

    #[tokio::test]
    async fn test_prune_loop_sweeps_in_background() {
        let ledger = Arc::new(CooldownLedger::new());
        ledger
            .check(PING, 1, Duration::from_millis(20), Instant::now())
            .unwrap();

        let handle = spawn_prune_loop(Arc::clone(&ledger), Duration::from_millis(50));
        sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(ledger.is_empty());
    }
}
