// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spaltwerk — split multi-column document pages
//
// Entry point. Parses arguments, initialises logging, and runs the document
// splitter.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use spaltwerk_core::SplitReport;
use spaltwerk_core::error::Result;
use spaltwerk_document::DocumentSplitter;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(report) => {
            tracing::info!(
                input_pages = report.input_pages,
                output_pages = report.output_pages,
                output = %cli.output.display(),
                "Split complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(?err, "Split failed");
            eprintln!("error: {err}");
            ExitCode::from(cli::exit_code(&err))
        }
    }
}

async fn run(cli: &Cli) -> Result<SplitReport> {
    let config = cli.split_config()?;
    let splits = cli.split_count()?;
    tracing::info!(
        input = %cli.input.display(),
        %splits,
        batch_size = cli.batch_size,
        dpi = config.render_dpi,
        "Spaltwerk starting"
    );

    let splitter = DocumentSplitter::new(config)?;
    splitter
        .split(&cli.input, &cli.output, splits, cli.batch_size)
        .await
}
