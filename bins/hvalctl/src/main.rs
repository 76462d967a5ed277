// hval - Typed HTTP Header Values
// Copyright (C) 2025 The hval contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod config;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use hval_core::HeaderValueError;
use hval_observe::{set_parse_metrics, CountingParseMetrics};
use hval_parse::{parse_header_line, unfold_lines, Header};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Parses HTTP header lines and prints them in canonical form
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop at the first rejected header
    #[arg(long)]
    strict: bool,
    /// File with one header per line; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Only print rejected headers and the summary
    #[arg(long)]
    quiet: bool,
    /// Treat headers without a typed value as errors
    #[arg(long)]
    reject_unknown: bool,
    /// Longest accepted physical line, in bytes
    #[arg(long)]
    max_line_length: Option<usize>,
}

/// Outcome of checking one header section.
#[derive(Debug, Default)]
struct Report {
    accepted: Vec<Header>,
    rejected: Vec<(String, String)>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let metrics = Arc::new(CountingParseMetrics::default());
    set_parse_metrics(metrics.clone());

    let Args {
        config,
        strict,
        input,
        quiet,
        reject_unknown,
        max_line_length,
    } = Args::parse();

    let mut config = match config {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    config.strict |= strict;
    config.reject_unknown |= reject_unknown;
    if let Some(max) = max_line_length {
        if max == 0 {
            return Err(anyhow!("--max-line-length must be positive"));
        }
        config.max_line_length = max;
    }

    let text = read_input(input.as_ref())?;
    let report = check_headers(&text, &config)?;

    if !quiet {
        for header in &report.accepted {
            println!("{}", header.to_header_line());
        }
    }
    for (line, error) in &report.rejected {
        eprintln!("rejected {:?}: {}", line, error);
    }
    info!(
        parsed = metrics.parsed(),
        rejected = metrics.rejected(),
        formatted = metrics.formatted(),
        "done"
    );
    eprintln!(
        "{} accepted, {} rejected",
        report.accepted.len(),
        report.rejected.len()
    );

    if report.rejected.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("{} header(s) rejected", report.rejected.len()))
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Parses every header line in `text`. Bare LF line endings are accepted.
fn check_headers(text: &str, config: &Config) -> Result<Report> {
    let text = text.replace("\r\n", "\n").replace('\n', "\r\n");
    let lines = unfold_lines(&text, config.max_line_length)?;
    let mut report = Report::default();
    for line in lines {
        let result = parse_header_line(&line).and_then(|header| {
            if config.permits(&header.name) {
                Ok(header)
            } else {
                Err(HeaderValueError::not_acceptable(format!(
                    "Header {} is not allowed",
                    header.name
                )))
            }
        });
        match result {
            Ok(header) => report.accepted.push(header),
            Err(e) => {
                warn!(line = %line, error = %e, "header rejected");
                if config.strict {
                    return Err(anyhow!("{:?}: {}", line, e));
                }
                report.rejected.push((line, e.to_string()));
            }
        }
    }
    Ok(report)
}
