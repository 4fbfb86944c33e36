//! Command-line parsing and dispatch for model-audit

use super::Host;
use super::evaluate::{EvaluateOptions, evaluate_file};
use crate::Result;
use crate::fetch::{AuthTokens, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, RetryPolicy};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use core::time::Duration;
use std::path::PathBuf;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "model-audit", version, author, display_name = "model-audit")]
#[command(about = "Audit machine-learning artifacts and score their quality")]
#[command(styles = CLAP_STYLES)]
pub struct Args {
    /// File of newline-separated artifact URLs, one evaluation per line
    #[arg(value_name = "URL_FILE")]
    pub url_file: PathBuf,

    /// Run metrics one at a time instead of on the worker pool
    #[arg(long, env = "MODEL_AUDIT_SEQUENTIAL")]
    pub sequential: bool,

    /// Log verbosity: 0 silent, 1 info, 2 debug
    #[arg(long, value_name = "LEVEL", env = "LOG_LEVEL", default_value_t = 0)]
    pub log_level: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitLab personal access token
    #[arg(long, value_name = "TOKEN", env = "GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// Hugging Face access token
    #[arg(long, value_name = "TOKEN", env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Additional retry attempts for transient HTTP failures
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout: u64,
}

/// Parse command-line arguments and run the evaluation.
///
/// Designed to be called from main.rs with the program arguments; tests call
/// it with a synthetic argument list and a capturing [`Host`].
///
/// # Errors
///
/// Returns an error when the input file cannot be read, a startup invariant
/// fails, or any input line fails to evaluate.
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let args = Args::parse_from(args);

    super::evaluate::init_logging(args.log_level, args.log_file.as_deref());

    let options = EvaluateOptions {
        url_file: args.url_file,
        sequential: args.sequential,
        tokens: AuthTokens {
            github: args.github_token,
            gitlab: args.gitlab_token,
            hugging_face: args.hf_token,
        },
        policy: RetryPolicy {
            max_retries: args.max_retries,
            ..RetryPolicy::default()
        },
        timeout: Duration::from_secs(args.timeout),
    };

    evaluate_file(host, &options).await
}
