//! Authenticated session lifecycle.
//!
//! A `Session` owns the account source for the whole run: it performs the
//! login flow (bounded retries on transient errors, the two-factor prompt
//! loop), re-authenticates transparently after connection loss, and releases
//! the remote session exactly once on every exit path.

use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::prompt::Prompter;
use crate::source::{AccountSource, Credential, SourceError};

/// Exclusive owner of an authenticated account source.
///
/// The source is released through [`Session::close`]; dropping an unclosed
/// session releases it as a backstop, so error paths never leak the remote
/// session.
pub struct Session<S: AccountSource> {
    source: Option<S>,
    username: String,
    credential: Credential,
    max_login_attempts: u32,
}

impl<S: AccountSource> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("source", &self.source.is_some())
            .field("username", &self.username)
            .field("max_login_attempts", &self.max_login_attempts)
            .finish_non_exhaustive()
    }
}

impl<S: AccountSource> Session<S> {
    /// Logs `username` into `source` and wraps the authenticated source.
    ///
    /// Connection errors are retried up to `config.max_login_attempts`; bad
    /// credentials fail immediately. A two-factor challenge enters a prompt
    /// loop: empty codes are asked again, rejected codes are asked again, and
    /// a declined prompt aborts the login. On any fatal error the source is
    /// released before returning.
    pub fn login(
        mut source: S,
        username: &str,
        credential: Credential,
        config: &RetryConfig,
        prompter: &mut dyn Prompter,
    ) -> Result<Self, SourceError> {
        info!(account = username, "logging in");

        if let Err(err) = authenticate(
            &mut source,
            username,
            &credential,
            config.max_login_attempts,
            Some(prompter),
        ) {
            source.close();
            return Err(err);
        }

        Ok(Self {
            source: Some(source),
            username: username.to_string(),
            credential,
            max_login_attempts: config.max_login_attempts,
        })
    }

    /// Handle the session was authenticated as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The underlying source, for issuing queries.
    pub fn source_mut(&mut self) -> &mut S {
        self.source.as_mut().expect("session already closed")
    }

    /// Re-authenticates after a transient connection loss.
    ///
    /// Uses the credential from the original login. A two-factor challenge at
    /// this point is fatal: there is no prompt seam in the middle of a
    /// collection.
    pub fn relogin(&mut self) -> Result<(), SourceError> {
        info!(account = %self.username, "re-authenticating after connection loss");
        let username = self.username.clone();
        let credential = self.credential.clone();
        let max_attempts = self.max_login_attempts;
        authenticate(self.source_mut(), &username, &credential, max_attempts, None)
    }

    /// Releases the remote session and returns the source.
    pub fn close(mut self) -> S {
        let mut source = self.source.take().expect("session already closed");
        source.close();
        source
    }
}

impl<S: AccountSource> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(source) = self.source.as_mut() {
            source.close();
        }
    }
}

/// Shared login loop for the initial login and re-authentication.
///
/// `prompter` is `None` during re-authentication, where a two-factor
/// challenge cannot be answered and is propagated as-is.
fn authenticate<S: AccountSource>(
    source: &mut S,
    username: &str,
    credential: &Credential,
    max_attempts: u32,
    mut prompter: Option<&mut dyn Prompter>,
) -> Result<(), SourceError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match source.login(username, credential) {
            Ok(()) => return Ok(()),
            Err(SourceError::TwoFactorRequired) => {
                let Some(prompter) = prompter.take() else {
                    return Err(SourceError::TwoFactorRequired);
                };
                return complete_two_factor(source, prompter);
            }
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(error = %err, attempt, max_attempts, "login failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Prompt loop for a pending two-factor challenge.
fn complete_two_factor<S: AccountSource>(
    source: &mut S,
    prompter: &mut dyn Prompter,
) -> Result<(), SourceError> {
    loop {
        let Some(code) = prompter.verification_code() else {
            return Err(SourceError::TwoFactorRequired);
        };
        let code = code.trim();
        if code.is_empty() {
            error!("verification code is empty, try again");
            continue;
        }
        match source.two_factor_login(code) {
            Ok(()) => return Ok(()),
            Err(SourceError::TwoFactorInvalid(msg)) => {
                error!(error = %msg, "verification code rejected, try again");
            }
            Err(err) => return Err(err),
        }
    }
}
