// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use thiserror::Error;

/// Top-level error type for all Blattwerk operations.
///
/// Detector-level "not found" outcomes are ordinary result values consumed by
/// the orchestrator's fallback logic; only the orchestrator's terminal states
/// surface here.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    /// Both detection strategies failed to produce a valid quadrilateral.
    /// Recovered only by re-capturing the page; never retried internally
    /// beyond the bounded Hough threshold search.
    #[error("no document boundary detected; please retry capture")]
    NoBoundaryDetected,

    /// Three or more detected corners are collinear, making the output
    /// width/height computation meaningless.
    #[error("degenerate page geometry: {0}")]
    DegenerateGeometry(String),

    /// Zero-area image or out-of-range tuning parameter, rejected before
    /// any processing.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying image library reported a failure (malformed buffer,
    /// unsolvable transform).
    #[error("image processing failed: {0}")]
    ImageError(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;
