//! Pre-built mock source scenarios.
//!
//! Used by the binary's `--demo` transport and by end-to-end tests that do
//! not need hand-scripted failures.

use super::{MockProfile, MockSource};

impl MockSource {
    /// A small account with a deterministic cast of followers and followees,
    /// three of which do not follow back.
    ///
    /// The account logs in with `password`; its profile is served under the
    /// same handle as `username`.
    pub fn demo(username: &str, password: &str) -> Self {
        let followers = [
            "maria.santos",
            "joao_pereira",
            "ana.claraa",
            "pedro_h",
            "juliana.melo",
            "lucas.ferreira",
        ];
        let not_following_back = ["carlos_edu", "beatriz.lima", "rafa_oliveira"];
        let similar = ["gabi.costa", "thiago.alves"];

        let mut followees: Vec<String> = followers[..4].iter().map(|s| s.to_string()).collect();
        followees.extend(not_following_back.iter().map(|s| s.to_string()));

        let profile = MockProfile {
            followers: followers.iter().map(|s| s.to_string()).collect(),
            followees,
            similar: similar.iter().map(|s| s.to_string()).collect(),
        };

        Self::new()
            .with_account(username, password)
            .with_profile(username, profile)
    }

    /// An account whose profile has no followers, followees, or similar
    /// accounts.
    pub fn empty(username: &str, password: &str) -> Self {
        Self::new()
            .with_account(username, password)
            .with_profile(username, MockProfile::default())
    }
}
