// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition.

use std::path::PathBuf;

use bildwerk_core::{ExportConfig, FitPolicy, PagePlacement, PageSize, WatermarkSpec};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bildwerk", about = "Turn images into one multi-page PDF", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Export images, in the order given, to a PDF
    Export(ExportArgs),

    /// Show what would be exported, without writing anything
    Inspect {
        /// Image files (PNG, JPEG, GIF, BMP, TIFF)
        #[arg(required = true, num_args = 1..)]
        images: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Image files (PNG, JPEG, GIF, BMP, TIFF)
    #[arg(required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Output PDF file (overwritten if it exists)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Page size [default: saved setting, else a4]
    #[arg(long, value_enum)]
    pub page: Option<PageArg>,

    /// How each image is fitted to the page [default: saved setting, else fit]
    #[arg(long, value_enum)]
    pub fit: Option<FitArg>,

    /// Margin on every side, in points
    #[arg(long)]
    pub margin: Option<u32>,

    /// JPEG quality of the embedded pages (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Stamp this text in the bottom-right corner of every page
    #[arg(long)]
    pub watermark: Option<String>,

    /// Do not stamp a watermark, even if one is saved
    #[arg(long, conflicts_with = "watermark")]
    pub no_watermark: bool,

    /// Leave out images by position (1-based), e.g. --exclude 2,5
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<usize>,

    /// Page sizing: each page as large as its image, or the page size with the image centred
    #[arg(long, value_enum)]
    pub placement: Option<PlacementArg>,

    /// Remember these settings as the defaults for later exports
    #[arg(long)]
    pub save_defaults: bool,
}

impl ExportArgs {
    /// Apply command-line overrides on top of saved defaults.
    pub fn export_config(&self, defaults: &ExportConfig) -> ExportConfig {
        let mut config = defaults.clone();
        if let Some(page) = self.page {
            config.page_size = page.into();
        }
        if let Some(fit) = self.fit {
            config.fit_policy = fit.into();
        }
        if let Some(margin) = self.margin {
            config.margin_px = margin;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(placement) = self.placement {
            config.placement = placement.into();
        }
        if let Some(text) = &self.watermark {
            config.watermark = WatermarkSpec::new(text.clone());
        }
        if self.no_watermark {
            config.watermark.enabled = false;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PageArg {
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FitArg {
    /// Shrink to fit inside the margins, never enlarge
    Fit,
    /// Scale to cover the margins and crop the overflow
    Fill,
    /// Keep the original pixel size
    Original,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlacementArg {
    ImageSized,
    Centered,
}

impl From<PageArg> for PageSize {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::A4 => Self::A4,
            PageArg::Letter => Self::Letter,
            PageArg::Legal => Self::Legal,
            PageArg::A3 => Self::A3,
            PageArg::A5 => Self::A5,
        }
    }
}

impl From<FitArg> for FitPolicy {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Fit => Self::FitToPage,
            FitArg::Fill => Self::FillPage,
            FitArg::Original => Self::OriginalSize,
        }
    }
}

impl From<PlacementArg> for PagePlacement {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::ImageSized => Self::ImageSized,
            PlacementArg::Centered => Self::Centered,
        }
    }
}
