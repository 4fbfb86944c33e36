//! The evaluation loop: read a URL file, audit each line, emit NDJSON.

use super::Host;
use crate::Result;
use crate::error::Error;
use crate::fetch::{ArtifactKind, AuthTokens, EvalContext, FetchOptions, ResourceBundle, RetryPolicy, probe_artifact};
use crate::metrics::{self, EngineOptions};
use crate::record::flatten_record;
use core::time::Duration;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolved configuration for one run.
#[derive(Debug)]
pub struct EvaluateOptions {
    pub url_file: PathBuf,
    pub sequential: bool,
    pub tokens: AuthTokens,
    pub policy: RetryPolicy,
    pub timeout: Duration,
}

/// Initialize the logger from the verbosity level (0 silent, 1 info,
/// 2 debug) and optional file destination. Silent means no logger at all;
/// the file target is only honored when verbosity is above silent.
pub(super) fn init_logging(level: u8, file: Option<&Path>) {
    let filter = match level {
        0 => return,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    let _ = builder
        .filter_level(filter)
        .format_timestamp(None)
        .format_module_path(false);

    if let Some(path) = file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::File::create(path) {
            Ok(f) => {
                let _ = builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            Err(e) => eprintln!("could not open log file {}: {e}; logging to stderr", path.display()),
        }
    }

    // Ignore double-init: tests may run several evaluations per process.
    let _ = builder.try_init();
}

/// Evaluate every non-comment line of the URL file, writing one NDJSON
/// record per line to the host's output. A model-level failure aborts only
/// its own line; the run continues and the error is surfaced at the end.
pub(crate) async fn evaluate_file<H: Host>(host: &mut H, options: &EvaluateOptions) -> Result<()> {
    // Designed invariants, checked once per run before any network traffic.
    metrics::validate_registry()?;
    metrics::validate_weights()?;

    let fetch = FetchOptions::new(options.policy, options.timeout)?;
    run_lines(host, options, &fetch).await
}

async fn run_lines<H: Host>(host: &mut H, options: &EvaluateOptions, fetch: &FetchOptions) -> Result<()> {
    let content = std::fs::read_to_string(&options.url_file)
        .map_err(|e| Error::io(format!("reading {}", options.url_file.display()), e))?;

    let engine = EngineOptions {
        sequential: options.sequential,
    };

    let mut failed = 0_usize;
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match evaluate_line(line, fetch, &options.tokens, engine).await {
            Ok(record) => {
                let _ = writeln!(host.output(), "{record}");
            }
            Err(e) => {
                failed += 1;
                log::info!("line {}: {e}", index + 1);
                let _ = writeln!(host.error(), "line {}: {e}", index + 1);
            }
        }
    }

    if failed > 0 {
        return Err(Error::Evaluation { failed });
    }
    Ok(())
}

async fn evaluate_line(line: &str, fetch: &FetchOptions, tokens: &AuthTokens, engine: EngineOptions) -> Result<serde_json::Value> {
    let bundle = ResourceBundle::from_line(line, tokens)?;

    // The model is required: an unreachable model aborts this line before
    // any metric runs. Optional resources degrade inside their metrics.
    probe_artifact(fetch, &bundle.model).await?;

    let name = bundle.model.name();
    let ctx = EvalContext {
        bundle,
        fetch: fetch.clone(),
    };

    let results = metrics::evaluate(&ctx, None, engine).await;
    let net = metrics::aggregate(&results);

    Ok(flatten_record(&name, ArtifactKind::Model, &results, &net))
}
