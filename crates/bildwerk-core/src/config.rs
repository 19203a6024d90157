// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::ExportConfig;

/// How many recent exports are remembered.
pub const MAX_RECENT_EXPORTS: usize = 10;

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for new exports; command-line flags override them per run.
    pub export: ExportConfig,
    /// Extra TrueType/OpenType files tried before the platform font list.
    pub watermark_fonts: Vec<PathBuf>,
    /// Most recent exports first, without duplicates.
    pub recent_exports: Vec<PathBuf>,
    /// Directory of the last successful export.
    pub last_export_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Record a successful export: move it to the front of the recent list and
    /// remember its directory.
    pub fn record_export(&mut self, path: &Path) {
        self.recent_exports.retain(|existing| existing != path);
        self.recent_exports.insert(0, path.to_path_buf());
        self.recent_exports.truncate(MAX_RECENT_EXPORTS);
        self.last_export_dir = path.parent().map(Path::to_path_buf);
    }
}
