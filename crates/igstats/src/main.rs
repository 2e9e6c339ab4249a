//! igstats - follow-back statistics for a remote account.
//!
//! Logs into an account source, fetches a profile's followers, followees,
//! and similar accounts, computes the set of people that do not follow back,
//! and writes each list as a single-column CSV.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use igstats_core::config::RetryConfig;
use igstats_core::export::Exporter;
use igstats_core::prompt::Prompter;
use igstats_core::run::{Operation, RunContext};
use igstats_core::session::Session;
use igstats_core::source::{Credential, MockSource, RandomDelay, SessionTokens};

/// Follow-back statistics collector.
#[derive(Parser)]
#[command(name = "igstats", about = "Follow-back statistics collector", version)]
struct Args {
    /// Account to log into.
    username: String,

    /// Password for the account. Ignored when --session-file is given.
    credential: String,

    /// Profile to fetch. Prompted interactively when omitted (an empty
    /// answer fetches the logged-in account).
    #[arg(long)]
    profile: Option<String>,

    /// Output directory for the CSV files.
    #[arg(short, long, default_value = "data")]
    output_dir: String,

    /// JSON file with pre-established session tokens, used instead of the
    /// password.
    #[arg(long, value_name = "PATH")]
    session_file: Option<PathBuf>,

    /// Run against the built-in scripted account source.
    ///
    /// This binary carries no network transport; transports implement
    /// igstats-core's AccountSource trait.
    #[arg(long)]
    demo: bool,

    /// Maximum login attempts on transient connection errors.
    #[arg(long, default_value = "3")]
    max_login_attempts: u32,

    /// Maximum re-authentication cycles per list after connection loss.
    #[arg(long, default_value = "3")]
    max_reconnects: u32,

    /// Retry budget for incomplete collections before accepting a partial
    /// result.
    #[arg(long, default_value = "5")]
    max_fetch_retries: u32,

    /// Base wait in seconds before re-querying an incomplete collection.
    #[arg(long, default_value = "60")]
    base_wait: u64,

    /// Minimum rate-controller wait in seconds before each remote query.
    #[arg(long, default_value = "2")]
    min_wait: u64,

    /// Maximum rate-controller wait in seconds before each remote query.
    #[arg(long, default_value = "6")]
    max_wait: u64,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is
    /// info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("igstats={}", level).parse().unwrap())
        .add_directive(format!("igstats_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Prompter reading answers from stdin.
struct StdinPrompter;

impl StdinPrompter {
    fn ask(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) => None, // EOF
            Ok(_) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }
}

impl Prompter for StdinPrompter {
    fn profile_to_fetch(&mut self) -> Option<String> {
        self.ask("Profile to fetch (skip to fetch the logged account): ")
    }

    fn verification_code(&mut self) -> Option<String> {
        self.ask("Verification Code: ")
    }
}

/// Parses a session-token JSON document.
fn parse_session_tokens(json: &str) -> Result<SessionTokens, serde_json::Error> {
    serde_json::from_str(json)
}

/// Prints a colored notice explaining that no transport is linked.
fn print_transport_notice() {
    const RED: &str = "\x1b[1;31m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    eprintln!("{RED}igstats: no account-source transport is linked into this binary{RESET}");
    eprintln!();
    eprintln!("{YELLOW}  The remote protocol is provided by external crates implementing");
    eprintln!("  igstats_core::source::AccountSource.");
    eprintln!();
    eprintln!("  Run with --demo to exercise the pipeline against the built-in");
    eprintln!("  scripted source.{RESET}");
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    info!("igstats {} starting", env!("CARGO_PKG_VERSION"));

    if !args.demo {
        print_transport_notice();
        return 2;
    }

    let credential = match &args.session_file {
        Some(path) => {
            let json = match std::fs::read_to_string(path) {
                Ok(json) => json,
                Err(err) => {
                    error!(file = %path.display(), error = %err, "cannot read session file");
                    return 2;
                }
            };
            match parse_session_tokens(&json) {
                Ok(tokens) => Credential::Session(tokens),
                Err(err) => {
                    error!(file = %path.display(), error = %err, "invalid session file");
                    return 2;
                }
            }
        }
        None => Credential::Password(args.credential.clone()),
    };

    let retry = RetryConfig::new(
        args.max_login_attempts,
        args.max_reconnects,
        args.max_fetch_retries,
        Duration::from_secs(args.base_wait),
    );

    info!(
        "Config: output={}, base_wait={}s, rate_wait={}..{}s",
        args.output_dir, args.base_wait, args.min_wait, args.max_wait
    );

    let mut source = MockSource::demo(&args.username, &args.credential);
    if let Credential::Session(tokens) = &credential {
        source = source.with_session_account(&args.username, &tokens.session_id);
    }
    let source =
        source.with_rate_controller(Box::new(RandomDelay::new(args.min_wait, args.max_wait)));

    let mut prompter = StdinPrompter;

    let session = match Session::login(source, &args.username, credential, &retry, &mut prompter) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "login failed, cannot proceed");
            return 1;
        }
    };

    let mut ctx = RunContext::new(session, retry, Exporter::new(&args.output_dir));
    let result = ctx.run(Operation::FollowerStats, args.profile.as_deref(), &mut prompter);
    ctx.finish();

    match result {
        Ok(summary) => {
            info!(
                profile = %summary.profile,
                followers = summary.followers,
                followees = summary.followees,
                gap = summary.gap,
                similar = summary.similar,
                output = args.output_dir,
                "all lists exported"
            );
            0
        }
        Err(err) => {
            error!(error = %err, "run failed");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_session_tokens;

    #[test]
    fn parse_session_tokens_accepts_cookie_field_names() {
        let json = r#"{
            "csrftoken": "c",
            "ds_user_id": "42",
            "ig_did": "d",
            "mid": "m",
            "sessionid": "s"
        }"#;

        let tokens = parse_session_tokens(json).unwrap();
        assert_eq!(tokens.csrf_token, "c");
        assert_eq!(tokens.session_id, "s");
    }

    #[test]
    fn parse_session_tokens_rejects_missing_fields() {
        assert!(parse_session_tokens(r#"{"sessionid": "s"}"#).is_err());
    }
}
