//! Core data model shared by the collector, differencer, and exporter.

use std::collections::HashSet;

/// Opaque, case-sensitive identifier of a remote account.
pub type AccountId = String;

/// An unordered set of account identifiers produced by one collection
/// operation. Created fresh each run; immutable once collected.
pub type AccountSet = HashSet<AccountId>;

/// Subject profile metadata as advertised by the remote source.
///
/// The advertised counts are the expected sizes for the completeness check;
/// they may legitimately drift while a collection is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Canonical handle of the profile.
    pub username: String,
    /// Number of accounts following the profile.
    pub follower_count: usize,
    /// Number of accounts the profile follows.
    pub followee_count: usize,
}

/// Which remote list a query targets.
///
/// Passed to the rate controller before each remote query and used to label
/// retries in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Profile metadata lookup.
    Profile,
    /// Accounts following the subject.
    Followers,
    /// Accounts the subject follows.
    Followees,
    /// Accounts similar to the subject.
    SimilarAccounts,
}

impl QueryKind {
    /// Short label used in log messages and retry warnings.
    pub fn label(self) -> &'static str {
        match self {
            QueryKind::Profile => "profile",
            QueryKind::Followers => "followers",
            QueryKind::Followees => "followees",
            QueryKind::SimilarAccounts => "similar_accounts",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
