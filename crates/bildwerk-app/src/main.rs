// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — turn a selection of images into one watermarked multi-page PDF.
//
// Entry point. Initialises logging, loads saved settings, and runs the
// requested command.

mod cli;
mod commands;
mod services;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use services::config_store::load_config;
use services::data_dir::data_dir;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Bildwerk starting");

    match cli.command {
        Commands::Export(args) => {
            let data_dir = data_dir();
            let mut settings = load_config(&data_dir);
            commands::export(&args, &mut settings, &data_dir)
        }
        Commands::Inspect { images } => commands::inspect(&images),
    }
}
