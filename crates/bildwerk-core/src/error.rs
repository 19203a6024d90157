// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Bildwerk operations.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Import errors (per image, non-fatal) --
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("cannot read image {}: {reason}", path.display())]
    UnreadableImage { path: PathBuf, reason: String },

    // -- Export errors (abort the export) --
    #[error("page area too small after margins: {width}x{height} px")]
    InvalidGeometry { width: i64, height: i64 },

    #[error("no included, readable images to export")]
    NothingToExport,

    #[error("failed to write document: {0}")]
    WriteFailure(String),

    #[error("invalid export configuration: {0}")]
    InvalidConfig(String),

    // -- Rendering --
    #[error("no watermark font could be loaded: {0}")]
    FontUnavailable(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a caller should surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Collected into a list next to whatever succeeded.
    Warning,
    /// Aborts the operation; shown as a single blocking message.
    Fatal,
}

impl BildwerkError {
    /// Classify the error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) | Self::UnreadableImage { .. } | Self::FontUnavailable(_) => {
                ErrorKind::Warning
            }
            _ => ErrorKind::Fatal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
