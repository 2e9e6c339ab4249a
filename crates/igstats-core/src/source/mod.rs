//! External account-source contract.
//!
//! The network transport (authentication, pagination, throttling responses)
//! is an external collaborator. This module defines the minimal contract the
//! rest of the crate consumes — the `AccountSource` trait — together with the
//! credential types and the error taxonomy a source reports. A scripted
//! in-memory implementation lives in [`mock`]; real transports are expected
//! to be provided by separate crates implementing [`AccountSource`].

pub mod mock;
pub mod rate;

pub use mock::MockSource;
pub use rate::{NoDelay, RandomDelay, RateController};

use serde::{Deserialize, Serialize};

use crate::model::{AccountId, ProfileInfo};

/// Error reported by an account source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Invalid credentials, or the remote side refused the login outright.
    BadCredentials,
    /// The login requires a two-factor verification code.
    TwoFactorRequired,
    /// The submitted two-factor verification code was rejected.
    TwoFactorInvalid(String),
    /// The requested profile does not exist.
    ProfileNotFound(String),
    /// Transient connection loss; the operation may succeed after
    /// re-authentication.
    Connection(String),
    /// A query was issued without an authenticated session.
    NotLoggedIn,
}

impl SourceError {
    /// True for errors that may clear after re-authentication.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Connection(_))
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::BadCredentials => write!(f, "invalid credentials"),
            SourceError::TwoFactorRequired => {
                write!(f, "two-factor verification code required")
            }
            SourceError::TwoFactorInvalid(msg) => {
                write!(f, "two-factor verification code rejected: {}", msg)
            }
            SourceError::ProfileNotFound(handle) => {
                write!(f, "profile {} does not exist", handle)
            }
            SourceError::Connection(msg) => write!(f, "connection lost: {}", msg),
            SourceError::NotLoggedIn => write!(f, "not logged in"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Pre-established session context accepted instead of a password.
///
/// Field names follow the cookie names the remote service issues, so a
/// session file exported from a browser can be loaded as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    #[serde(rename = "csrftoken")]
    pub csrf_token: String,
    pub ds_user_id: String,
    pub ig_did: String,
    pub mid: String,
    #[serde(rename = "sessionid")]
    pub session_id: String,
}

/// Credential material for [`AccountSource::login`].
#[derive(Debug, Clone)]
pub enum Credential {
    /// Plain password login; may trigger two-factor verification.
    Password(String),
    /// Pre-established session tokens; never triggers two-factor verification.
    Session(SessionTokens),
}

/// Lazy sequence of account identifiers produced by one remote query.
///
/// Finite and not restartable: once drained (or failed), a new sequence must
/// be requested from the source, which re-queries the remote side from
/// scratch.
pub type AccountIter<'a> = Box<dyn Iterator<Item = Result<AccountId, SourceError>> + 'a>;

/// Minimal contract of the external data source.
///
/// Implementations own the wire protocol, pagination, and throttling
/// responses; callers see only authenticated queries and lazy identifier
/// sequences. A source is used strictly sequentially — one in-flight query
/// stream per session.
pub trait AccountSource {
    /// Authenticates the session.
    ///
    /// # Errors
    /// - `BadCredentials` — credential rejected; never retried by callers
    /// - `TwoFactorRequired` — password accepted, verification code needed
    /// - `Connection` — transient; callers may retry
    fn login(&mut self, username: &str, credential: &Credential) -> Result<(), SourceError>;

    /// Completes a pending two-factor login with a verification code.
    fn two_factor_login(&mut self, code: &str) -> Result<(), SourceError>;

    /// Looks up profile metadata (advertised follower/followee counts).
    fn profile(&mut self, handle: &str) -> Result<ProfileInfo, SourceError>;

    /// Starts a followers query for `handle`.
    fn followers(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError>;

    /// Starts a followees query for `handle`.
    fn followees(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError>;

    /// Starts a similar-accounts query for `handle`.
    fn similar_accounts(&mut self, handle: &str) -> Result<AccountIter<'_>, SourceError>;

    /// Releases the remote session. Idempotent.
    fn close(&mut self);
}
