//! Command-line interface and orchestration for model-audit
//!
//! The tool has one job: read a file of artifact URLs and emit one NDJSON
//! evaluation record per line. The `run` function parses arguments with
//! clap (environment variables provide defaults for tokens and logging),
//! configures logging, and hands off to the evaluation loop.
//!
//! Output goes through the [`Host`] abstraction so tests can capture it
//! without touching the process's real stdout/stderr.

mod evaluate;
mod host;
mod run;

pub use host::Host;
pub use run::run;
