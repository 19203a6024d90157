// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout: fitting source rasters into the printable box.

pub mod fit;

pub use fit::{CropBox, FitPlan, LayoutResult, available_box, fit_image, plan};
