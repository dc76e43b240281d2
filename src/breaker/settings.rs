//! Breaker settings and their defaults.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::counts::Counts;
use super::state::StateType;
use crate::config::BreakerConfig;

/// Closed-state reset interval used when none is configured (no reset).
pub const DEFAULT_INTERVAL: Duration = Duration::ZERO;

/// Open-state timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Decides, after a failure while closed, whether the breaker should open.
pub type ReadyToTrip = Arc<dyn Fn(Counts) -> bool + Send + Sync>;

/// Decides whether an error returned by the work still counts as a success.
pub type IsSuccessful = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Observes every state change as `(name, from, to)`.
///
/// Runs while the transition lock is held; it must not call back into the
/// breaker that invoked it.
pub type OnStateChange = Arc<dyn Fn(&str, StateType, StateType) + Send + Sync>;

/// Trips once more than five consecutive failures are seen.
pub fn default_ready_to_trip(counts: Counts) -> bool {
    counts.consecutive_failures > 5
}

/// Any returned error is a failure.
pub fn default_is_successful(_err: &(dyn Error + 'static)) -> bool {
    false
}

/// Configures a [`CircuitBreaker`](super::CircuitBreaker).
///
/// Zero values and unset callbacks fall back to the defaults above.
#[derive(Clone, Default)]
pub struct Settings {
    /// Passed through to `on_state_change` and logs.
    pub name: String,

    /// Consecutive probe successes required to close from half-open.
    /// Zero means 1.
    pub max_half_open_requests: u32,

    /// Period at which counts are cleared while closed.
    /// Zero disables the periodic reset.
    pub closed_reset_interval: Duration,

    /// Time spent open before probing. Zero means 60 seconds.
    pub open_timeout: Duration,

    /// Decides, after each closed-state failure, whether to open.
    pub ready_to_trip: Option<ReadyToTrip>,

    /// Decides whether an `Err` from the work still counts as a success.
    pub is_successful: Option<IsSuccessful>,

    /// Called with `(name, from, to)` on every state change.
    pub on_state_change: Option<OnStateChange>,
}

impl Settings {
    /// Default settings for a breaker called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the consecutive probe successes needed to close.
    pub fn max_half_open_requests(mut self, max: u32) -> Self {
        self.max_half_open_requests = max;
        self
    }

    /// Set the closed-state count reset period.
    pub fn closed_reset_interval(mut self, interval: Duration) -> Self {
        self.closed_reset_interval = interval;
        self
    }

    /// Set how long the breaker stays open before probing.
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Replace the trip predicate.
    pub fn ready_to_trip(mut self, f: impl Fn(Counts) -> bool + Send + Sync + 'static) -> Self {
        self.ready_to_trip = Some(Arc::new(f));
        self
    }

    /// Replace the success classifier.
    pub fn is_successful(
        mut self,
        f: impl Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_successful = Some(Arc::new(f));
        self
    }

    /// Install the state change hook.
    ///
    /// The hook runs while the transition lock is held and must not call
    /// back into the breaker.
    pub fn on_state_change(
        mut self,
        f: impl Fn(&str, StateType, StateType) + Send + Sync + 'static,
    ) -> Self {
        self.on_state_change = Some(Arc::new(f));
        self
    }

    pub(crate) fn resolve(self) -> Resolved {
        Resolved {
            name: self.name,
            max_half_open_requests: self.max_half_open_requests.max(1),
            closed_reset_interval: self.closed_reset_interval,
            open_timeout: if self.open_timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                self.open_timeout
            },
            ready_to_trip: self
                .ready_to_trip
                .unwrap_or_else(|| Arc::new(default_ready_to_trip)),
            is_successful: self
                .is_successful
                .unwrap_or_else(|| Arc::new(default_is_successful)),
            on_state_change: self.on_state_change,
        }
    }
}

impl From<&BreakerConfig> for Settings {
    fn from(config: &BreakerConfig) -> Self {
        Settings::new(config.name.clone())
            .max_half_open_requests(config.max_half_open_requests)
            .closed_reset_interval(Duration::from_millis(config.closed_reset_interval_ms))
            .open_timeout(Duration::from_millis(config.open_timeout_ms))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("max_half_open_requests", &self.max_half_open_requests)
            .field("closed_reset_interval", &self.closed_reset_interval)
            .field("open_timeout", &self.open_timeout)
            .field("ready_to_trip", &self.ready_to_trip.is_some())
            .field("is_successful", &self.is_successful.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

/// Settings with every default applied.
pub(crate) struct Resolved {
    pub(crate) name: String,
    pub(crate) max_half_open_requests: u32,
    pub(crate) closed_reset_interval: Duration,
    pub(crate) open_timeout: Duration,
    pub(crate) ready_to_trip: ReadyToTrip,
    pub(crate) is_successful: IsSuccessful,
    pub(crate) on_state_change: Option<OnStateChange>,
}

impl Resolved {
    pub(crate) fn is_success<T, E>(&self, result: &Result<T, E>) -> bool
    where
        E: Error + 'static,
    {
        match result {
            Ok(_) => true,
            Err(err) => (self.is_successful)(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    #[test]
    fn test_defaults_applied() {
        let resolved = Settings::default().resolve();
        assert_eq!(resolved.name, "");
        assert_eq!(resolved.max_half_open_requests, 1);
        assert_eq!(resolved.closed_reset_interval, DEFAULT_INTERVAL);
        assert_eq!(resolved.open_timeout, DEFAULT_TIMEOUT);
        assert!(resolved.on_state_change.is_none());
        assert!(!(resolved.ready_to_trip)(Counts::new(5, 0, 5, 0, 5)));
        assert!((resolved.ready_to_trip)(Counts::new(6, 0, 6, 0, 6)));
    }

    #[test]
    fn test_custom_values_kept() {
        let resolved = Settings::new("cb")
            .max_half_open_requests(3)
            .closed_reset_interval(Duration::from_secs(3))
            .open_timeout(Duration::from_secs(2))
            .resolve();
        assert_eq!(resolved.name, "cb");
        assert_eq!(resolved.max_half_open_requests, 3);
        assert_eq!(resolved.closed_reset_interval, Duration::from_secs(3));
        assert_eq!(resolved.open_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_default_classifier() {
        let resolved = Settings::default().resolve();
        assert!(resolved.is_success::<(), NotFound>(&Ok(())));
        assert!(!resolved.is_success::<(), NotFound>(&Err(NotFound)));
    }

    #[test]
    fn test_custom_classifier_can_accept_errors() {
        let resolved = Settings::default()
            .is_successful(|err| err.downcast_ref::<NotFound>().is_some())
            .resolve();
        assert!(resolved.is_success::<(), NotFound>(&Err(NotFound)));
    }

    #[test]
    fn test_from_config() {
        let config = BreakerConfig {
            name: "db".into(),
            max_half_open_requests: 2,
            closed_reset_interval_ms: 1500,
            open_timeout_ms: 0,
        };
        let settings = Settings::from(&config);
        assert_eq!(settings.name, "db");
        assert_eq!(settings.closed_reset_interval, Duration::from_millis(1500));
        assert_eq!(settings.resolve().open_timeout, DEFAULT_TIMEOUT);
    }
}
