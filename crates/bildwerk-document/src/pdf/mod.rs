// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — assembling page rasters into a document.

pub mod assembler;

pub use assembler::{PdfAssembler, write_atomic};
