use std::time::Duration;

/// What the channel does after its socket drops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Stay closed.
    #[default]
    Never,
    /// Retry with exponentially growing delays, capped at `max`.
    Backoff {
        initial: Duration,
        max: Duration,
        /// Give up after this many consecutive failed attempts.
        max_attempts: Option<u32>,
    },
}

impl ReconnectPolicy {
    pub fn backoff() -> Self {
        ReconnectPolicy::Backoff {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            max_attempts: None,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based), `None` to give up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::Backoff {
                initial,
                max,
                max_attempts,
            } => {
                if attempt == 0 || max_attempts.is_some_and(|limit| attempt > limit) {
                    return None;
                }
                let factor = 2u32.saturating_pow(attempt - 1);
                Some(initial.saturating_mul(factor).min(*max))
            }
        }
    }
}
