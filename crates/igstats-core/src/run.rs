//! Run context, operation dispatch, and the run summary.
//!
//! A run owns the authenticated session, the retry configuration, and the
//! exporter for its whole lifetime: created at run start, torn down at run
//! end. Operations are a closed enum dispatched through one `match`, each
//! arm producing a [`RunSummary`] for reporting.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::collector::{CollectError, Collector};
use crate::config::RetryConfig;
use crate::export::{DEFAULT_HEADER, ExportError, Exporter};
use crate::fmt::format_runtime;
use crate::gap::follow_back_gap;
use crate::model::{AccountSet, ProfileInfo, QueryKind};
use crate::prompt::Prompter;
use crate::session::Session;
use crate::source::{AccountSource, SourceError};

/// The set of supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Collect followers, followees, the follow-back gap, and similar
    /// accounts, exporting each as CSV.
    FollowerStats,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::FollowerStats => "follower_stats",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error type for a run.
#[derive(Debug)]
pub enum RunError {
    /// A collection step failed beyond its retry policy.
    Collect(CollectError),
    /// An export step failed; earlier output files are left in place.
    Export(ExportError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Collect(err) => write!(f, "{}", err),
            RunError::Export(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Collect(err) => Some(err),
            RunError::Export(err) => Some(err),
        }
    }
}

/// What one run did, for end-of-run reporting.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub operation: Operation,
    /// Handle of the profile that was fetched.
    pub profile: String,
    pub followers: usize,
    pub followees: usize,
    pub gap: usize,
    pub similar: usize,
    pub started_at: DateTime<Utc>,
    pub runtime: Duration,
}

impl RunSummary {
    /// Logs the numbers block the way the run ends on screen.
    pub fn log(&self) {
        debug!("---------------- numbers: {} ----------------", self.operation);
        debug!(profile = %self.profile, followers = self.followers, "followers");
        debug!(profile = %self.profile, followees = self.followees, "followees");
        debug!(
            profile = %self.profile,
            gap = self.gap,
            "people that do not follow back"
        );
        debug!(profile = %self.profile, similar = self.similar, "similar accounts");
        info!(runtime = %format_runtime(self.runtime), "run finished");
    }
}

/// Owns everything one run needs: session, retry policy, exporter.
pub struct RunContext<S: AccountSource> {
    session: Session<S>,
    retry: RetryConfig,
    exporter: Exporter,
}

impl<S: AccountSource> RunContext<S> {
    pub fn new(session: Session<S>, retry: RetryConfig, exporter: Exporter) -> Self {
        Self {
            session,
            retry,
            exporter,
        }
    }

    /// Executes `operation` and returns its summary.
    ///
    /// `target` is the profile to fetch; when absent the prompter is asked,
    /// and an empty answer (or a declined prompt) falls back to the logged-in
    /// account.
    pub fn run(
        &mut self,
        operation: Operation,
        target: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let started = Instant::now();

        match operation {
            Operation::FollowerStats => self.follower_stats(target, prompter, started_at, started),
        }
    }

    /// Releases the session and returns the source.
    pub fn finish(self) -> S {
        self.session.close()
    }

    fn follower_stats(
        &mut self,
        target: Option<&str>,
        prompter: &mut dyn Prompter,
        started_at: DateTime<Utc>,
        started: Instant,
    ) -> Result<RunSummary, RunError> {
        let profile = self.resolve_profile(target, prompter)?;
        info!(
            profile = %profile.username,
            followers = profile.follower_count,
            followees = profile.followee_count,
            "profile loaded"
        );

        let followers = self.collect_and_export(
            QueryKind::Followers,
            &profile.username,
            Some(profile.follower_count),
            "followers",
        )?;
        let followees = self.collect_and_export(
            QueryKind::Followees,
            &profile.username,
            Some(profile.followee_count),
            "followees",
        )?;

        let gap = follow_back_gap(&followers, &followees);
        info!(count = gap.len(), "computed people that do not follow back");
        self.exporter
            .export("people_that_do_not_follow_back", DEFAULT_HEADER, &gap)
            .map_err(RunError::Export)?;

        let similar = self.collect_and_export(
            QueryKind::SimilarAccounts,
            &profile.username,
            None,
            "similar_accounts",
        )?;

        let summary = RunSummary {
            operation: Operation::FollowerStats,
            profile: profile.username,
            followers: followers.len(),
            followees: followees.len(),
            gap: gap.len(),
            similar: similar.len(),
            started_at,
            runtime: started.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    /// Resolves the profile to fetch, re-prompting while the handle does not
    /// exist. An empty handle means the logged-in account.
    fn resolve_profile(
        &mut self,
        target: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> Result<ProfileInfo, RunError> {
        let mut handle = match target {
            Some(t) => t.to_string(),
            None => prompter.profile_to_fetch().unwrap_or_default(),
        };

        loop {
            let resolved = match handle.trim() {
                "" => self.session.username().to_string(),
                h => h.to_string(),
            };
            info!(profile = %resolved, "loading profile");

            match Collector::new(&mut self.session, &self.retry).profile(&resolved) {
                Ok(info) => return Ok(info),
                Err(CollectError::Source(SourceError::ProfileNotFound(_))) => {
                    error!(profile = %resolved, "profile does not exist, try again");
                    match prompter.profile_to_fetch() {
                        Some(next) => handle = next,
                        None => {
                            return Err(RunError::Collect(CollectError::Source(
                                SourceError::ProfileNotFound(resolved),
                            )));
                        }
                    }
                }
                Err(err) => return Err(RunError::Collect(err)),
            }
        }
    }

    /// Collects one list and exports it immediately.
    fn collect_and_export(
        &mut self,
        kind: QueryKind,
        handle: &str,
        expected: Option<usize>,
        file_stem: &str,
    ) -> Result<AccountSet, RunError> {
        info!(query = %kind, profile = handle, "collecting list");
        let set = Collector::new(&mut self.session, &self.retry)
            .collect(kind, handle, expected)
            .map_err(RunError::Collect)?;
        self.exporter
            .export(file_stem, DEFAULT_HEADER, &set)
            .map_err(RunError::Export)?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::source::Credential;
    use crate::source::mock::{MockProfile, MockSource};
    use std::path::Path;
    use tempfile::TempDir;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn context(source: MockSource, out_dir: &Path) -> RunContext<MockSource> {
        let session = Session::login(
            source,
            "alice",
            Credential::Password("hunter2".to_string()),
            &RetryConfig::without_waits(),
            &mut ScriptedPrompter::new(),
        )
        .unwrap();
        RunContext::new(session, RetryConfig::without_waits(), Exporter::new(out_dir))
    }

    fn read_rows(path: &Path) -> (String, Vec<String>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader.headers().unwrap().get(0).unwrap().to_string();
        let rows = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        (header, rows)
    }

    #[test]
    fn follower_stats_exports_all_four_files() {
        let dir = TempDir::new().unwrap();
        let profile = MockProfile {
            followers: ids(&["alice", "bob"]),
            followees: ids(&["bob", "carol", "dave"]),
            similar: ids(&["eve"]),
        };
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile);
        let mut ctx = context(source, dir.path());

        let summary = ctx
            .run(
                Operation::FollowerStats,
                Some("alice"),
                &mut ScriptedPrompter::new(),
            )
            .unwrap();

        assert_eq!(summary.followers, 2);
        assert_eq!(summary.followees, 3);
        assert_eq!(summary.gap, 2);
        assert_eq!(summary.similar, 1);

        let (header, rows) = read_rows(&dir.path().join("people_that_do_not_follow_back.csv"));
        assert_eq!(header, "Username");
        assert_eq!(rows, vec!["carol", "dave"]);

        for file in ["followers.csv", "followees.csv", "similar_accounts.csv"] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }

        let source = ctx.finish();
        assert_eq!(source.close_count(), 1);
    }

    #[test]
    fn gap_covers_everyone_when_nobody_follows_back() {
        let dir = TempDir::new().unwrap();
        let profile = MockProfile {
            followees: ids(&["x"]),
            ..MockProfile::default()
        };
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", profile);
        let mut ctx = context(source, dir.path());

        let summary = ctx
            .run(
                Operation::FollowerStats,
                Some("alice"),
                &mut ScriptedPrompter::new(),
            )
            .unwrap();

        assert_eq!(summary.gap, 1);
        let (_, rows) = read_rows(&dir.path().join("people_that_do_not_follow_back.csv"));
        assert_eq!(rows, vec!["x"]);
    }

    #[test]
    fn failed_login_leaves_no_output_files() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("data");
        let source = MockSource::new().with_account("alice", "hunter2");

        let err = Session::login(
            source,
            "alice",
            Credential::Password("wrong".to_string()),
            &RetryConfig::without_waits(),
            &mut ScriptedPrompter::new(),
        );

        assert!(err.is_err());
        // The exporter creates the output directory lazily, so a run that
        // dies at login leaves nothing behind.
        assert!(!out_dir.exists());
    }

    #[test]
    fn unknown_target_reprompts_until_a_profile_exists() {
        let dir = TempDir::new().unwrap();
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", MockProfile::default());
        let mut ctx = context(source, dir.path());
        let mut prompter = ScriptedPrompter::new().with_profile("alice");

        let summary = ctx
            .run(Operation::FollowerStats, Some("ghost"), &mut prompter)
            .unwrap();
        assert_eq!(summary.profile, "alice");
    }

    #[test]
    fn unknown_target_without_prompt_answers_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", MockProfile::default());
        let mut ctx = context(source, dir.path());

        let err = ctx
            .run(
                Operation::FollowerStats,
                Some("ghost"),
                &mut ScriptedPrompter::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Collect(CollectError::Source(SourceError::ProfileNotFound(_)))
        ));
    }

    #[test]
    fn missing_target_defaults_to_the_logged_in_account() {
        let dir = TempDir::new().unwrap();
        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", MockProfile::default());
        let mut ctx = context(source, dir.path());

        let summary = ctx
            .run(Operation::FollowerStats, None, &mut ScriptedPrompter::new())
            .unwrap();
        assert_eq!(summary.profile, "alice");
    }

    #[test]
    fn export_failure_aborts_the_run() {
        let dir = TempDir::new().unwrap();
        // Root the exporter at a regular file so every write fails.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"x").unwrap();

        let source = MockSource::new()
            .with_account("alice", "hunter2")
            .with_profile("alice", MockProfile::default());
        let session = Session::login(
            source,
            "alice",
            Credential::Password("hunter2".to_string()),
            &RetryConfig::without_waits(),
            &mut ScriptedPrompter::new(),
        )
        .unwrap();
        let mut ctx = RunContext::new(
            session,
            RetryConfig::without_waits(),
            Exporter::new(&blocked),
        );

        let err = ctx
            .run(
                Operation::FollowerStats,
                Some("alice"),
                &mut ScriptedPrompter::new(),
            )
            .unwrap_err();
        assert!(matches!(err, RunError::Export(_)));
    }
}
