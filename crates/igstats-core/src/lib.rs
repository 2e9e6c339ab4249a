//! igstats-core — shared library for the igstats tools.
//!
//! Provides:
//! - `source` — the external account-source contract, credentials, the
//!   rate-controller hook, and a scripted in-memory implementation
//! - `session` — login flow and scoped release of the remote session
//! - `collector` — list collection with completeness checks and retries
//! - `gap` — the follow-back differential
//! - `export` — CSV materialization of collected sets
//! - `run` — run context, operation dispatch, and the run summary
//! - `config` — retry/backoff configuration
//! - `prompt` — interactive input seam (profile handle, verification code)
//! - `fmt` — shared formatting helpers

pub mod collector;
pub mod config;
pub mod export;
pub mod fmt;
pub mod gap;
pub mod model;
pub mod prompt;
pub mod run;
pub mod session;
pub mod source;
