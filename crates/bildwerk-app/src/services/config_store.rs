// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persisted settings — `config.json` in the data directory.

use std::path::Path;

use bildwerk_core::AppConfig;
use bildwerk_core::error::Result;
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.json";

/// Load settings from `data_dir`. A missing file gives defaults; an
/// unreadable or corrupt one gives defaults and a warning.
pub fn load_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No saved settings, using defaults");
            return AppConfig::default();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Cannot read settings, using defaults");
            return AppConfig::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Settings file is corrupt, using defaults");
            AppConfig::default()
        }
    }
}

pub fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    debug!(path = %path.display(), "Settings saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use bildwerk_core::{FitPolicy, PageSize};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load_config(dir.path()), AppConfig::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").expect("seed");
        assert_eq!(load_config(dir.path()), AppConfig::default());
    }

    #[test]
    fn saved_settings_are_loaded_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.export.page_size = PageSize::Letter;
        config.export.fit_policy = FitPolicy::FillPage;
        config.record_export(Path::new("/exports/album.pdf"));

        persist_config(dir.path(), &config).expect("persist");
        let loaded = load_config(dir.path());
        assert_eq!(loaded, config);
        assert_eq!(loaded.last_export_dir, Some(PathBuf::from("/exports")));
    }
}
