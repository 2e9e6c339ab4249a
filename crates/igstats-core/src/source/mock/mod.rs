//! Scripted in-memory account source.
//!
//! `MockSource` implements [`AccountSource`](super::AccountSource) entirely
//! in memory, allowing the full pipeline — login, two-factor verification,
//! throttled partial pages, connection drops — to be exercised without a
//! network transport. It backs both the test suite and the binary's `--demo`
//! transport.

mod scenarios;

use std::collections::{HashMap, VecDeque};

use crate::model::{AccountId, ProfileInfo, QueryKind};
use crate::source::rate::RateController;
use crate::source::{AccountIter, AccountSource, Credential, SourceError};

/// Follower/followee/similar lists registered for one profile handle.
#[derive(Debug, Clone, Default)]
pub struct MockProfile {
    pub followers: Vec<AccountId>,
    pub followees: Vec<AccountId>,
    pub similar: Vec<AccountId>,
}

/// Login material registered for one account.
#[derive(Debug, Clone, Default)]
struct MockAccount {
    password: Option<String>,
    session_id: Option<String>,
    two_factor_code: Option<String>,
}

/// In-memory account source with scriptable failure behavior.
///
/// Accounts, profiles, and failures are registered through builder methods;
/// every remote query is recorded so tests can assert on retry counts.
#[derive(Default)]
pub struct MockSource {
    accounts: HashMap<String, MockAccount>,
    profiles: HashMap<String, MockProfile>,
    rate: Option<Box<dyn RateController>>,
    logged_in: Option<String>,
    pending_two_factor: Option<String>,
    /// Upcoming fetches of a kind yield only the first N identifiers.
    short_pages: HashMap<QueryKind, VecDeque<usize>>,
    /// Upcoming queries of a kind fail with a connection error at issue time.
    query_failures: HashMap<QueryKind, u32>,
    /// Upcoming fetches of a kind yield N identifiers, then a connection error.
    mid_iteration_failures: HashMap<QueryKind, VecDeque<usize>>,
    /// Upcoming logins fail with a connection error.
    login_failures: u32,
    queries: Vec<QueryKind>,
    close_count: u32,
}

impl MockSource {
    /// Creates an empty source with no registered accounts or profiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account that logs in with `password`.
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.entry(username.to_string()).or_default().password =
            Some(password.to_string());
        self
    }

    /// Registers an account that logs in with pre-established session tokens
    /// carrying `session_id`.
    pub fn with_session_account(mut self, username: &str, session_id: &str) -> Self {
        self.accounts
            .entry(username.to_string())
            .or_default()
            .session_id = Some(session_id.to_string());
        self
    }

    /// Requires a two-factor verification code after a password login for
    /// `username`.
    pub fn with_two_factor(mut self, username: &str, code: &str) -> Self {
        self.accounts
            .entry(username.to_string())
            .or_default()
            .two_factor_code = Some(code.to_string());
        self
    }

    /// Registers the lists served for `handle`.
    pub fn with_profile(mut self, handle: &str, profile: MockProfile) -> Self {
        self.profiles.insert(handle.to_string(), profile);
        self
    }

    /// Installs a rate controller invoked before each query.
    pub fn with_rate_controller(mut self, rate: Box<dyn RateController>) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Scripts the next fetch of `kind` to yield only the first `count`
    /// identifiers, simulating a throttled partial page set. Repeated calls
    /// queue up for consecutive fetches.
    pub fn script_short_page(mut self, kind: QueryKind, count: usize) -> Self {
        self.short_pages.entry(kind).or_default().push_back(count);
        self
    }

    /// Scripts the next `times` queries of `kind` to fail with a connection
    /// error at issue time.
    pub fn script_query_failure(mut self, kind: QueryKind, times: u32) -> Self {
        *self.query_failures.entry(kind).or_default() += times;
        self
    }

    /// Scripts the next fetch of `kind` to yield `after` identifiers and then
    /// fail with a connection error mid-iteration.
    pub fn script_mid_iteration_failure(mut self, kind: QueryKind, after: usize) -> Self {
        self.mid_iteration_failures
            .entry(kind)
            .or_default()
            .push_back(after);
        self
    }

    /// Scripts the next `times` logins to fail with a connection error.
    pub fn script_login_failures(mut self, times: u32) -> Self {
        self.login_failures += times;
        self
    }

    /// All queries issued so far, in order.
    pub fn queries(&self) -> &[QueryKind] {
        &self.queries
    }

    /// Number of queries of `kind` issued so far.
    pub fn query_count(&self, kind: QueryKind) -> usize {
        self.queries.iter().filter(|q| **q == kind).count()
    }

    /// Number of times `close` has been called.
    pub fn close_count(&self) -> u32 {
        self.close_count
    }

    /// True while a login is active.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.is_some()
    }

    fn record_query(&mut self, kind: QueryKind) -> Result<(), SourceError> {
        if self.logged_in.is_none() {
            return Err(SourceError::NotLoggedIn);
        }
        if let Some(rate) = self.rate.as_mut() {
            rate.wait_before_query(kind);
        }
        self.queries.push(kind);
        if let Some(remaining) = self.query_failures.get_mut(&kind)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(SourceError::Connection(format!(
                "scripted {} query failure",
                kind
            )));
        }
        Ok(())
    }

    fn fetch(&mut self, kind: QueryKind, handle: &str) -> Result<AccountIter<'_>, SourceError> {
        self.record_query(kind)?;

        let profile = self
            .profiles
            .get(handle)
            .ok_or_else(|| SourceError::ProfileNotFound(handle.to_string()))?;
        let mut ids: Vec<AccountId> = match kind {
            QueryKind::Followers => profile.followers.clone(),
            QueryKind::Followees => profile.followees.clone(),
            QueryKind::SimilarAccounts => profile.similar.clone(),
            QueryKind::Profile => Vec::new(),
        };

        if let Some(counts) = self.short_pages.get_mut(&kind)
            && let Some(count) = counts.pop_front()
        {
            ids.truncate(count);
        }

        let fail_after = self
            .mid_iteration_failures
            .get_mut(&kind)
            .and_then(|after| after.pop_front());

        let iter = ids.into_iter().map(Ok);
        match fail_after {
            Some(after) => Ok(Box::new(iter.take(after).chain(std::iter::once(Err(
                SourceError::Connection(format!("scripted {} stream interruption", kind)),
            ))))),
            None => Ok(Box::new(iter)),
        }
    }
}

impl AccountSource for MockSource {
    fn login(&mut self, username: &str, credential: &Credential) -> Result<(), SourceError> {
        if self.login_failures > 0 {
            self.login_failures -= 1;
            return Err(SourceError::Connection(
                "scripted login failure".to_string(),
            ));
        }

        let account = self
            .accounts
            .get(username)
            .ok_or(SourceError::BadCredentials)?;

        match credential {
            Credential::Password(password) => {
                if account.password.as_deref() != Some(password.as_str()) {
                    return Err(SourceError::BadCredentials);
                }
                if account.two_factor_code.is_some() {
                    self.pending_two_factor = Some(username.to_string());
                    return Err(SourceError::TwoFactorRequired);
                }
            }
            Credential::Session(tokens) => {
                if account.session_id.as_deref() != Some(tokens.session_id.as_str()) {
                    return Err(SourceError::BadCredentials);
                }
            }
        }

        self.logged_in = Some(username.to_string());
        Ok(())
    }

    fn two_factor_login(&mut self, code: &str) -> Result<(), SourceError> {
        let username = self
            .pending_two_factor
            .clone()
            .ok_or(SourceError::NotLoggedIn)?;
        let expected = self
            .accounts
            .get(&username)
            .and_then(|a| a.two_factor_code.clone())
            .ok_or(SourceError::NotLoggedIn)?;

        if code != expected {
            return Err(SourceError::TwoFactorInvalid(
                "verification code mismatch".to_string(),
            ));
        }

        self.pending_two_factor = None;
        self.logged_in = Some(username);
        Ok(())
    }

    fn profile(&mut self, handle: &str) -> Result<ProfileInfo, SourceError> {
        self.record_query(QueryKind::Profile)?;

        let profile = self
            .profiles
            .get(handle)
            .ok_or_else(|| SourceError::ProfileNotFound(handle.to_string()))?;
        Ok(ProfileInfo {
            username: handle.to_string(),
            follower_count: profile.followers.len(),
            followee_count: profile.followees.len(),
        })
    }

    fn followers(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError> {
        self.fetch(QueryKind::Followers, handle)
    }

    fn followees(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError> {
        self.fetch(QueryKind::Followees, handle)
    }

    fn similar_accounts(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError> {
        self.fetch(QueryKind::SimilarAccounts, handle)
    }

    fn close(&mut self) {
        self.logged_in = None;
        self.pending_two_factor = None;
        self.close_count += 1;
    }
}
