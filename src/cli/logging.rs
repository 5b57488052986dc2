// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Log setup for the hybdex binary.
//!
//! Logs go to stderr so that stdout stays clean for results and `--json`.
//!
//! # Filter priority
//!
//! 1. `HYBDEX_LOG` (directives, e.g. `hybdex::search=debug,warn`)
//! 2. `RUST_LOG`
//! 3. `-v` (debug for this crate) or `-q` (errors only)
//! 4. `warn`

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HYBDEX_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// `-v` beats `-q` when both are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: Verbosity) {
    let filter = env_filter(verbosity, std::env::var(LOG_ENV).ok().as_deref());
    let use_ansi = std::env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stderr);

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true);

    let result = if verbosity == Verbosity::Verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time().compact())
            .try_init()
    };
    // Already installed (tests, embedding): keep the existing one.
    let _ = result;
}

/// Unparseable directives fall through to the next source.
fn env_filter(verbosity: Verbosity, directives: Option<&str>) -> EnvFilter {
    if let Some(filter) = directives.and_then(|d| EnvFilter::try_new(d).ok()) {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = verbosity.default_level();
    let directive = if verbosity == Verbosity::Verbose {
        format!("{},hybdex=debug", Level::INFO)
    } else {
        level.to_string()
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
