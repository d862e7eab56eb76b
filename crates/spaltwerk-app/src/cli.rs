// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their mapping onto the split configuration.

use std::path::PathBuf;

use clap::Parser;
use spaltwerk_core::error::Result;
use spaltwerk_core::{ErrorKind, SpaltwerkError, SplitConfig, SplitCount};

/// Split multi-column document pages into one output page per column.
#[derive(Parser, Debug)]
#[command(name = "spaltwerk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source document (PDF, or a PNG/JPEG/TIFF scan)
    pub input: PathBuf,

    /// Destination PDF
    pub output: PathBuf,

    /// Number of vertical sections per page
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=3))]
    pub splits: u8,

    /// Upper bound on pages processed concurrently
    #[arg(long, default_value_t = 5)]
    pub batch_size: usize,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render and output resolution, overriding the configuration
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration from `--config` (or defaults) with `--dpi` applied.
    pub fn split_config(&self) -> Result<SplitConfig> {
        let config = match &self.config {
            Some(path) => SplitConfig::load(path)?,
            None => SplitConfig::default(),
        };
        let config = match self.dpi {
            Some(dpi) => config.with_dpi(dpi),
            None => config,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn split_count(&self) -> Result<SplitCount> {
        SplitCount::try_from(self.splits as usize)
    }
}

/// Process exit code for a failed run.
pub fn exit_code(err: &SpaltwerkError) -> u8 {
    match err.kind() {
        ErrorKind::InvalidArgument => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::ResourceExhaustion => 4,
        ErrorKind::Encoding | ErrorKind::Io => 1,
    }
}
