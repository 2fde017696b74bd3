// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — Core geometry types, errors, and configuration shared across
// the rectification crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::RectifyOptions;
pub use error::{BlattwerkError, Result};
pub use types::*;
