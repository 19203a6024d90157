// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command runners — build a registry from the command line, then export or
// report on it.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use bildwerk_core::human_errors::{humanize_error, summarize_import};
use bildwerk_core::{AppConfig, BildwerkError, ImageState, ImportOutcome};
use bildwerk_document::{CompositionPipeline, SelectionRegistry};
use tracing::{debug, info, warn};

use crate::cli::ExportArgs;
use crate::services::config_store::persist_config;

/// Turn a library error into one carrying its plain-language explanation.
pub fn humanized(err: BildwerkError) -> anyhow::Error {
    let human = humanize_error(&err);
    anyhow::Error::new(err).context(format!("{} {}", human.message, human.suggestion))
}

pub fn export(args: &ExportArgs, settings: &mut AppConfig, data_dir: &Path) -> Result<()> {
    let config = args.export_config(&settings.export);
    config.validate().map_err(humanized)?;

    let mut registry = SelectionRegistry::new();
    let outcomes = registry.add_paths(&args.images);
    report_import(&outcomes);

    for &position in &args.exclude {
        let Some(path) = position
            .checked_sub(1)
            .and_then(|index| args.images.get(index))
        else {
            bail!(
                "--exclude {} is out of range: {} image(s) were given",
                position,
                args.images.len()
            );
        };
        registry.set_included(path, false);
    }

    info!(
        page = config.page_size.name(),
        fit = config.fit_policy.description(),
        margin = config.margin_px,
        quality = config.quality,
        "Export settings"
    );

    let pipeline = CompositionPipeline::with_font_candidates(&settings.watermark_fonts);
    if config.watermark.effective_text().is_some() {
        if let Some(warning) = pipeline.compositor().font_warning() {
            let human = humanize_error(warning);
            eprintln!("warning: {} {}", human.message, human.suggestion);
        }
    }

    let mut progress = |percent: u8, phase: &str| debug!(percent, phase, "Export progress");
    let report = pipeline
        .export(&registry, &config, &args.output, Some(&mut progress))
        .map_err(humanized)?;

    println!(
        "Wrote {} page(s) to {} ({} bytes{})",
        report.page_count,
        report.output_path.display(),
        report.bytes_written,
        if report.watermarked { ", watermarked" } else { "" }
    );

    settings.record_export(&report.output_path);
    if args.save_defaults {
        settings.export = config;
    }
    if let Err(err) = persist_config(data_dir, settings) {
        warn!(error = %err, "Could not save settings");
    }
    Ok(())
}

pub fn inspect(images: &[PathBuf]) -> Result<()> {
    let mut registry = SelectionRegistry::new();
    let outcomes = registry.add_paths(images);
    report_import(&outcomes);

    let state = registry.state();
    for entry in &state {
        println!("{}", describe(entry));
    }

    let pages = registry.snapshot_for_export().len();
    info!(images = state.len(), pages, "Inspection complete");
    println!("{} of {} image(s) would be exported", pages, state.len());
    Ok(())
}

fn report_import(outcomes: &[ImportOutcome]) {
    for outcome in outcomes {
        if let Some(warning) = &outcome.warning {
            let human = humanize_error(warning);
            eprintln!(
                "warning: {}: {} {}",
                outcome.path.display(),
                human.message,
                human.suggestion
            );
        }
    }
    if let Some(summary) = summarize_import(outcomes) {
        eprintln!("{summary}");
    }
}

fn describe(state: &ImageState) -> String {
    let dimensions = state
        .dimensions
        .map(|(w, h)| format!("{w}x{h}"))
        .unwrap_or_else(|| "unreadable".into());
    let size = state
        .file_size
        .map(|bytes| format!("{bytes} bytes"))
        .unwrap_or_else(|| "size unknown".into());
    format!(
        "{:>3}. {} [{}] {} {}{}",
        state.order_index + 1,
        state.path.display(),
        state.format.mime_type(),
        dimensions,
        size,
        if state.included && state.readable { "" } else { " (skipped)" }
    )
}
