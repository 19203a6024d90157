// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end export tests: real image files on disk, a registry, the
// pipeline, and the written PDF read back with lopdf.

use std::fs;
use std::path::{Path, PathBuf};

use bildwerk_core::{BildwerkError, ExportConfig, FitPolicy, PagePlacement, WatermarkSpec};
use bildwerk_document::{BitmapFace, CompositionPipeline, SelectionRegistry, WatermarkCompositor};
use image::{Rgb, RgbImage};
use lopdf::{Document, Object};
use tempfile::TempDir;

fn pipeline() -> CompositionPipeline {
    CompositionPipeline::new(WatermarkCompositor::new(Box::new(BitmapFace::default())))
}

/// Write a solid-colour image of the given size; the extension picks the codec.
fn write_image(dir: &Path, name: &str, width: u32, height: u32, shade: u8) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, 128]))
        .save(&path)
        .expect("write test image");
    path
}

/// MediaBox width and height of each page, in page order.
fn page_sizes(pdf: &Path) -> Vec<(i64, i64)> {
    let doc = Document::load(pdf).expect("output must be a readable PDF");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let media_box = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .and_then(|dict| dict.get(b"MediaBox"))
                .and_then(Object::as_array)
                .expect("MediaBox");
            (
                media_box[2].as_i64().expect("width"),
                media_box[3].as_i64().expect("height"),
            )
        })
        .collect()
}

fn original_size() -> ExportConfig {
    ExportConfig {
        fit_policy: FitPolicy::OriginalSize,
        ..ExportConfig::default()
    }
}

#[test]
fn excluded_image_is_left_out_and_order_is_kept() {
    let dir = TempDir::new().expect("tempdir");
    let first = write_image(dir.path(), "one.png", 60, 40, 10);
    let second = write_image(dir.path(), "two.png", 70, 50, 90);
    let third = write_image(dir.path(), "three.bmp", 80, 30, 200);

    let mut registry = SelectionRegistry::new();
    let outcomes = registry.add_paths([&first, &second, &third]);
    assert!(outcomes.iter().all(|outcome| outcome.added && outcome.warning.is_none()));
    registry.set_included(&second, false);

    let dest = dir.path().join("album.pdf");
    let report = pipeline()
        .export(&registry, &original_size(), &dest, None)
        .expect("export");

    assert_eq!(report.page_count, 2);
    assert_eq!(report.output_path, dest);
    assert_eq!(report.bytes_written, fs::metadata(&dest).expect("stat").len());
    assert!(!report.watermarked);
    assert_eq!(page_sizes(&dest), vec![(60, 40), (80, 30)]);
}

#[test]
fn empty_registry_writes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let dest = dir.path().join("empty.pdf");

    let err = pipeline()
        .export(&SelectionRegistry::new(), &ExportConfig::default(), &dest, None)
        .unwrap_err();

    assert!(matches!(err, BildwerkError::NothingToExport));
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
}

#[test]
fn whitespace_watermark_matches_disabled_watermark() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_image(dir.path(), "photo.png", 300, 200, 60);
    let mut registry = SelectionRegistry::new();
    registry.add_paths([&path]);
    let snapshot = registry.snapshot_for_export();

    let blank = ExportConfig {
        watermark: WatermarkSpec::new("  "),
        ..ExportConfig::default()
    };
    let disabled = ExportConfig::default();
    let stamped = ExportConfig {
        watermark: WatermarkSpec::new("Bildwerk"),
        ..ExportConfig::default()
    };

    let pipeline = pipeline();
    let blank_pages = pipeline.render_pages(&snapshot, &blank).expect("blank");
    let disabled_pages = pipeline.render_pages(&snapshot, &disabled).expect("disabled");
    let stamped_pages = pipeline.render_pages(&snapshot, &stamped).expect("stamped");

    assert_eq!(blank_pages, disabled_pages);
    assert_ne!(stamped_pages, disabled_pages);
}

#[test]
fn unreadable_file_is_reported_and_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let good = write_image(dir.path(), "good.png", 20, 20, 0);
    let broken = dir.path().join("broken.jpg");
    fs::write(&broken, b"this is not a jpeg").expect("write broken file");

    let mut registry = SelectionRegistry::new();
    let outcomes = registry.add_paths([&broken, &good]);
    assert!(matches!(
        outcomes[0].warning,
        Some(BildwerkError::UnreadableImage { .. })
    ));
    assert!(outcomes[1].warning.is_none());

    let state = registry.state();
    assert!(!state[0].readable);
    assert_eq!(state[0].file_size, Some(18));
    assert!(state[1].readable);

    let dest = dir.path().join("out.pdf");
    let report = pipeline()
        .export(&registry, &original_size(), &dest, None)
        .expect("export");
    assert_eq!(report.page_count, 1);
}

#[test]
fn fill_page_pages_match_the_available_box() {
    let dir = TempDir::new().expect("tempdir");
    let wide = write_image(dir.path(), "wide.png", 400, 200, 30);
    let tall = write_image(dir.path(), "tall.png", 100, 500, 30);
    let mut registry = SelectionRegistry::new();
    registry.add_paths([&wide, &tall]);

    let config = ExportConfig {
        fit_policy: FitPolicy::FillPage,
        ..ExportConfig::default()
    };
    let dest = dir.path().join("filled.pdf");
    pipeline()
        .export(&registry, &config, &dest, None)
        .expect("export");

    assert_eq!(page_sizes(&dest), vec![(495, 742), (495, 742)]);
}

#[test]
fn centered_placement_uses_the_page_size() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_image(dir.path(), "small.gif", 50, 50, 100);
    let mut registry = SelectionRegistry::new();
    registry.add_paths([&path]);

    let config = ExportConfig {
        placement: PagePlacement::Centered,
        ..ExportConfig::default()
    };
    let dest = dir.path().join("centered.pdf");
    pipeline()
        .export(&registry, &config, &dest, None)
        .expect("export");

    assert_eq!(page_sizes(&dest), vec![(595, 842)]);
}

#[test]
fn export_overwrites_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_image(dir.path(), "a.png", 10, 10, 5);
    let dest = dir.path().join("out.pdf");
    fs::write(&dest, b"stale").expect("seed destination");

    let mut registry = SelectionRegistry::new();
    registry.add_paths([&path]);
    pipeline()
        .export(&registry, &original_size(), &dest, None)
        .expect("export");

    assert!(fs::read(&dest).expect("read").starts_with(b"%PDF-"));
    assert_eq!(page_sizes(&dest), vec![(10, 10)]);
}
