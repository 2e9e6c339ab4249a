//! Rate-controller hook.
//!
//! Sources invoke the controller before each remote query so traffic can be
//! paced below the remote throttling threshold. The pacing is advisory: it
//! reduces the odds of a throttled (partial) response, it does not prevent
//! one.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::model::QueryKind;

/// Injects a delay before each remote query.
pub trait RateController {
    /// Called by the source immediately before issuing a query of `kind`.
    /// Blocks the calling thread for however long the controller decides.
    fn wait_before_query(&mut self, kind: QueryKind);
}

/// Sleeps a uniformly random number of seconds within the configured bounds.
pub struct RandomDelay {
    min_secs: u64,
    max_secs: u64,
}

impl RandomDelay {
    /// Creates a controller sleeping between `min_secs` and `max_secs`
    /// (inclusive) before each query. Bounds are swapped if reversed.
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let (min_secs, max_secs) = if min_secs <= max_secs {
            (min_secs, max_secs)
        } else {
            (max_secs, min_secs)
        };
        Self { min_secs, max_secs }
    }
}

impl RateController for RandomDelay {
    fn wait_before_query(&mut self, kind: QueryKind) {
        let secs = rand::rng().random_range(self.min_secs..=self.max_secs);
        debug!(query = %kind, wait_secs = secs, "waiting before query");
        std::thread::sleep(Duration::from_secs(secs));
    }
}

/// Controller that never waits. Used in tests and scripted runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl RateController for NoDelay {
    fn wait_before_query(&mut self, _kind: QueryKind) {}
}
