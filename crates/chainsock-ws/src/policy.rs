//! Bounded-failure reconnect policy.

use std::time::Duration;

use crate::failure::{ConnectionFailure, FailureClass};

/// Configuration for the reconnect policy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Consecutive failures that stop the transport permanently.
    pub fail_threshold: u32,
    /// Fixed delay before reconnecting.
    pub backoff: Duration,
    /// When false, the first connection failure ends the run loop.
    pub restart: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            fail_threshold: 10,
            backoff: Duration::from_secs(1),
            restart: true,
        }
    }
}

/// What to do after a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Reconnect { after: Duration },
    Stop,
}

/// Stateless policy: the caller owns the consecutive-failure counter.
#[derive(Debug, Clone, Default)]
pub struct ReconnectPolicy {
    pub config: ReconnectConfig,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self { config }
    }

    /// Decide after the `consecutive`-th failure in a row (1-based).
    pub fn decide(&self, failure: &ConnectionFailure, consecutive: u32) -> Decision {
        if !self.config.restart
            || failure.class() == FailureClass::Fatal
            || consecutive >= self.config.fail_threshold
        {
            return Decision::Stop;
        }
        Decision::Reconnect {
            after: self.config.backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dropped() -> ConnectionFailure {
        ConnectionFailure::Closed {
            code: 1006,
            reason: "abnormal".into(),
        }
    }

    #[test]
    fn tolerable_failure_reconnects_until_threshold() {
        let policy = ReconnectPolicy::new(ReconnectConfig {
            fail_threshold: 3,
            backoff: Duration::from_millis(250),
            restart: true,
        });
        let after = Duration::from_millis(250);
        assert_eq!(policy.decide(&dropped(), 1), Decision::Reconnect { after });
        assert_eq!(policy.decide(&dropped(), 2), Decision::Reconnect { after });
        assert_eq!(policy.decide(&dropped(), 3), Decision::Stop);
    }

    #[test]
    fn fatal_failure_stops_immediately() {
        let policy = ReconnectPolicy::default();
        let fatal = ConnectionFailure::Closed {
            code: 1011,
            reason: "internal error".into(),
        };
        assert_eq!(policy.decide(&fatal, 1), Decision::Stop);
    }

    #[test]
    fn no_restart_stops_on_first_failure() {
        let policy = ReconnectPolicy::new(ReconnectConfig {
            restart: false,
            ..Default::default()
        });
        assert_eq!(policy.decide(&dropped(), 1), Decision::Stop);
    }
}
