//! Conflict handling policies for optimistic updates.

use std::num::NonZeroU32;
use std::time::Duration;

/// Controls how [`Client::update_with`](crate::Client::update_with) reacts to
/// conflicting writes.
///
/// The default policy matches [`Client::update`](crate::Client::update): retry
/// forever with no delay, on the assumption that each retry starts from a
/// fresh snapshot and interleaved writers make progress between attempts.
#[derive(Debug, Clone, Default)]
pub struct ConflictPolicy {
    max_attempts: Option<NonZeroU32>,
    backoff: Option<Backoff>,
}

#[derive(Debug, Clone)]
struct Backoff {
    initial: Duration,
    max: Duration,
}

impl ConflictPolicy {
    /// Unbounded policy with no delay between attempts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up with [`Error::ConflictExhausted`](crate::Error::ConflictExhausted)
    /// once `attempts` full fetch/apply/put cycles have all conflicted.
    pub fn with_max_attempts(mut self, attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sleep between conflicting attempts, doubling from `initial` up to `max`.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = Some(Backoff { initial, max });
        self
    }

    /// Whether another cycle may start after `attempts` cycles have conflicted.
    pub(crate) fn allows_another(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max.get(),
            None => true,
        }
    }

    /// Delay to apply before the cycle following `attempts` conflicted ones.
    pub(crate) fn delay_after(&self, attempts: u32) -> Option<Duration> {
        let backoff = self.backoff.as_ref()?;
        let factor = 2u32.saturating_pow(attempts.saturating_sub(1));
        Some(backoff.initial.saturating_mul(factor).min(backoff.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_never_gives_up() {
        let policy = ConflictPolicy::new();
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(10_000));
        assert_eq!(policy.delay_after(3), None);
    }

    #[test]
    fn bounded_policy_stops_at_the_limit() {
        let policy = ConflictPolicy::new().with_max_attempts(NonZeroU32::new(3).unwrap());
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = ConflictPolicy::new()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_after(3), Some(Duration::from_millis(350)));
        assert_eq!(policy.delay_after(4), Some(Duration::from_millis(350)));
    }

    #[test]
    fn huge_attempt_counts_do_not_overflow() {
        let policy =
            ConflictPolicy::new().with_backoff(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(policy.delay_after(64), Some(Duration::from_secs(30)));
    }
}
