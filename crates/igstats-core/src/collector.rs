//! List collection with completeness checks and retries.
//!
//! The remote source may answer a throttled query with a partial page set,
//! so every collected list is checked against the count the profile
//! advertises and re-queried with backoff while it falls short. Transient
//! connection loss triggers re-authentication and a full re-fetch (source
//! iterators are not restartable). Both retry families are bounded by
//! [`RetryConfig`].

use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::model::{AccountSet, ProfileInfo, QueryKind};
use crate::session::Session;
use crate::source::{AccountSource, SourceError};

/// Error type for list collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// A source error that survived the retry policy.
    Source(SourceError),
    /// Re-authentication after a connection loss failed.
    Relogin(SourceError),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Source(err) => write!(f, "collection failed: {}", err),
            CollectError::Relogin(err) => write!(f, "re-authentication failed: {}", err),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Source(err) | CollectError::Relogin(err) => Some(err),
        }
    }
}

/// True iff a collected list reached the advertised count.
///
/// The advertised count may drift mid-run, so a `false` result is a retry
/// hint, never a hard error.
pub fn is_complete(collected_count: usize, expected_count: usize) -> bool {
    collected_count >= expected_count
}

/// Wait before the next completeness retry: the base wait plus 10 seconds
/// for every ten attempts already made.
pub fn backoff_wait(base_wait: Duration, attempt: u32) -> Duration {
    base_wait + Duration::from_secs(10 * u64::from(attempt / 10))
}

/// Collects account lists through an authenticated session.
pub struct Collector<'a, S: AccountSource> {
    session: &'a mut Session<S>,
    config: &'a RetryConfig,
}

impl<'a, S: AccountSource> Collector<'a, S> {
    pub fn new(session: &'a mut Session<S>, config: &'a RetryConfig) -> Self {
        Self { session, config }
    }

    /// Looks up the subject profile, retrying transient failures.
    pub fn profile(&mut self, handle: &str) -> Result<ProfileInfo, CollectError> {
        let mut reconnects = 0u32;
        loop {
            match self.session.source_mut().profile(handle) {
                Ok(info) => return Ok(info),
                Err(err) if err.is_transient() && reconnects < self.config.max_reconnects => {
                    reconnects += 1;
                    warn!(error = %err, reconnects, "profile lookup interrupted, re-authenticating");
                    self.session.relogin().map_err(CollectError::Relogin)?;
                }
                Err(err) => return Err(CollectError::Source(err)),
            }
        }
    }

    /// Collects one list, re-querying while it is incomplete.
    ///
    /// `expected` is the advertised count; `None` disables the completeness
    /// check (similar accounts have no advertised count). When the retry
    /// budget runs out the partial result is returned with a warning.
    pub fn collect(
        &mut self,
        kind: QueryKind,
        handle: &str,
        expected: Option<usize>,
    ) -> Result<AccountSet, CollectError> {
        let mut attempt = 0u32;
        loop {
            let collected = self.fetch_with_reconnect(kind, handle)?;
            let Some(expected) = expected else {
                return Ok(collected);
            };
            if is_complete(collected.len(), expected) {
                return Ok(collected);
            }
            if attempt >= self.config.max_collect_retries {
                warn!(
                    query = %kind,
                    collected = collected.len(),
                    expected,
                    "retry budget exhausted, proceeding with partial result"
                );
                return Ok(collected);
            }
            attempt += 1;
            let wait = backoff_wait(self.config.base_wait, attempt);
            warn!(
                query = %kind,
                collected = collected.len(),
                expected,
                attempt,
                wait_secs = wait.as_secs(),
                "incomplete collection, retrying after backoff"
            );
            std::thread::sleep(wait);
        }
    }

    /// One full fetch of a list, re-authenticating and re-fetching from
    /// scratch on transient connection loss.
    fn fetch_with_reconnect(
        &mut self,
        kind: QueryKind,
        handle: &str,
    ) -> Result<AccountSet, CollectError> {
        let mut reconnects = 0u32;
        loop {
            match self.fetch_once(kind, handle) {
                Ok(set) => return Ok(set),
                Err(err) if err.is_transient() && reconnects < self.config.max_reconnects => {
                    reconnects += 1;
                    warn!(
                        query = %kind,
                        error = %err,
                        reconnects,
                        max_reconnects = self.config.max_reconnects,
                        "connection lost, re-authenticating and re-fetching"
                    );
                    self.session.relogin().map_err(CollectError::Relogin)?;
                }
                Err(err) => return Err(CollectError::Source(err)),
            }
        }
    }

    /// Drains one source iterator into a set.
    fn fetch_once(&mut self, kind: QueryKind, handle: &str) -> Result<AccountSet, SourceError> {
        let source = self.session.source_mut();
        let iter = match kind {
            QueryKind::Followers => source.followers(handle)?,
            QueryKind::Followees => source.followees(handle)?,
            QueryKind::SimilarAccounts => source.similar_accounts(handle)?,
            QueryKind::Profile => unreachable!("profile lookups are not list queries"),
        };
        iter.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::source::mock::{MockProfile, MockSource};
    use crate::source::Credential;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn login(source: MockSource) -> Session<MockSource> {
        Session::login(
            source,
            "alice",
            Credential::Password("hunter2".to_string()),
            &RetryConfig::without_waits(),
            &mut ScriptedPrompter::new(),
        )
        .unwrap()
    }

    fn profile_with_followers(followers: &[&str]) -> MockProfile {
        MockProfile {
            followers: ids(followers),
            ..MockProfile::default()
        }
    }

    #[test]
    fn is_complete_compares_against_expected() {
        assert!(is_complete(100, 100));
        assert!(is_complete(101, 100));
        assert!(!is_complete(99, 100));
        assert!(!is_complete(0, 1));
        assert!(is_complete(0, 0));
    }

    #[test]
    fn backoff_wait_grows_every_ten_attempts() {
        let base = Duration::from_secs(60);
        assert_eq!(backoff_wait(base, 1), Duration::from_secs(60));
        assert_eq!(backoff_wait(base, 9), Duration::from_secs(60));
        assert_eq!(backoff_wait(base, 10), Duration::from_secs(70));
        assert_eq!(backoff_wait(base, 20), Duration::from_secs(80));
    }

    #[test]
    fn incomplete_fetch_is_retried_once_until_complete() {
        // First fetch is throttled down to 2 of 3 followers; the second is
        // complete and accepted, with exactly one retry issued.
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile_with_followers(&["a", "b", "c"]))
            .script_short_page(QueryKind::Followers, 2);
        let mut session = login(source);
        let config = RetryConfig::without_waits();

        let set = Collector::new(&mut session, &config)
            .collect(QueryKind::Followers, "alice", Some(3))
            .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(session.close().query_count(QueryKind::Followers), 2);
    }

    #[test]
    fn exhausted_retry_budget_accepts_partial_result() {
        let mut config = RetryConfig::without_waits();
        config.max_collect_retries = 2;

        // Every fetch returns 2 of an advertised 5.
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile_with_followers(&["a", "b"]));
        let mut session = login(source);

        let set = Collector::new(&mut session, &config)
            .collect(QueryKind::Followers, "alice", Some(5))
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(session.close().query_count(QueryKind::Followers), 3);
    }

    #[test]
    fn connection_loss_triggers_relogin_and_full_refetch() {
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile_with_followers(&["a", "b", "c"]))
            .script_mid_iteration_failure(QueryKind::Followers, 1);
        let mut session = login(source);
        let config = RetryConfig::without_waits();

        let set = Collector::new(&mut session, &config)
            .collect(QueryKind::Followers, "alice", Some(3))
            .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(session.close().query_count(QueryKind::Followers), 2);
    }

    #[test]
    fn connection_loss_beyond_reconnect_bound_is_fatal() {
        let mut config = RetryConfig::without_waits();
        config.max_reconnects = 1;

        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile_with_followers(&["a"]))
            .script_query_failure(QueryKind::Followers, 2);
        let mut session = login(source);

        let err = Collector::new(&mut session, &config)
            .collect(QueryKind::Followers, "alice", Some(1))
            .unwrap_err();
        assert!(matches!(err, CollectError::Source(SourceError::Connection(_))));
    }

    #[test]
    fn missing_profile_is_not_retried() {
        let source = MockSource::new().with_account("alice", "hunter2");
        let mut session = login(source);
        let config = RetryConfig::without_waits();

        let err = Collector::new(&mut session, &config)
            .profile("ghost")
            .unwrap_err();
        assert_eq!(
            err,
            CollectError::Source(SourceError::ProfileNotFound("ghost".to_string()))
        );
        assert_eq!(session.close().query_count(QueryKind::Profile), 1);
    }

    #[test]
    fn similar_accounts_skip_the_completeness_check() {
        let profile = MockProfile {
            similar: ids(&["x", "y"]),
            ..MockProfile::default()
        };
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile)
            .script_short_page(QueryKind::SimilarAccounts, 1);
        let mut session = login(source);
        let config = RetryConfig::without_waits();

        let set = Collector::new(&mut session, &config)
            .collect(QueryKind::SimilarAccounts, "alice", None)
            .unwrap();

        // The short page is accepted as-is: nothing advertises a count.
        assert_eq!(set.len(), 1);
        assert_eq!(session.close().query_count(QueryKind::SimilarAccounts), 1);
    }
}
