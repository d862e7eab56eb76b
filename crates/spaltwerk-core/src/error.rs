// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spaltwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Spaltwerk operations.
#[derive(Debug, Error)]
pub enum SpaltwerkError {
    // -- Argument validation --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Input / output --
    #[error("input document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page of {width}x{height} pixels exceeds the limit of {limit} pixels")]
    ResourceExhausted { width: u32, height: u32, limit: u64 },

    // -- Document errors --
    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("page encoding failed: {0}")]
    Encoding(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Concurrency --
    #[error("page worker failed: {0}")]
    Worker(String),
}

/// Coarse error classes reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    ResourceExhaustion,
    Encoding,
    Io,
}

impl SpaltwerkError {
    /// Classify this error for exit-status and reporting purposes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::ConfigError(_) | Self::Serialization(_) => {
                ErrorKind::InvalidArgument
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(err) if err.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Self::ResourceExhausted { .. } => ErrorKind::ResourceExhaustion,
            Self::Encoding(_) | Self::PdfError(_) => ErrorKind::Encoding,
            Self::Io(_) | Self::Render(_) | Self::Worker(_) => ErrorKind::Io,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpaltwerkError>;
