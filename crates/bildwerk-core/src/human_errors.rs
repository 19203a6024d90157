// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Import problems are summarised as a batch; export problems are a single
// blocking message.

use crate::error::{BildwerkError, ErrorKind};
use crate::types::{ImportOutcome, SourceFormat};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was skipped but the rest carried on.
    Warning,
    /// The user must change something (settings, selection, destination).
    ActionRequired,
    /// Cannot be fixed by retrying or changing settings.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again can succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in a UI).
    pub severity: Severity,
}

/// Convert a `BildwerkError` into a `HumanError`.
pub fn humanize_error(err: &BildwerkError) -> HumanError {
    match err {
        // -- Import --
        BildwerkError::UnsupportedFormat(ext) => HumanError {
            message: "This type of file can't be added.".into(),
            suggestion: format!(
                "Supported file types are {}. (File type: {ext})",
                SourceFormat::EXTENSIONS.join(", ")
            ),
            retriable: false,
            severity: Severity::Warning,
        },

        BildwerkError::UnreadableImage { path, .. } => HumanError {
            message: format!(
                "The image {} couldn't be opened.",
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            ),
            suggestion: "It may be damaged or not really an image. It will be left out of the PDF.".into(),
            retriable: false,
            severity: Severity::Warning,
        },

        // -- Export --
        BildwerkError::InvalidGeometry { .. } => HumanError {
            message: "The margins are too large for this page size.".into(),
            suggestion: "Choose a smaller margin or a larger page size, then export again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BildwerkError::NothingToExport => HumanError {
            message: "There are no images to put in the PDF.".into(),
            suggestion: "Add some images and make sure at least one readable image is ticked.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BildwerkError::WriteFailure(_) => HumanError {
            message: "The PDF couldn't be saved.".into(),
            suggestion: "Check that the folder exists, that you can write to it, and that the disk isn't full.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        BildwerkError::InvalidConfig(detail) => HumanError {
            message: "Some export settings aren't valid.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Rendering --
        BildwerkError::FontUnavailable(_) => HumanError {
            message: "The watermark font couldn't be loaded.".into(),
            suggestion: "Another font was used for the watermark instead.".into(),
            retriable: false,
            severity: Severity::Warning,
        },

        BildwerkError::ImageError(_) => HumanError {
            message: "There was a problem processing an image.".into(),
            suggestion: "Try saving the image as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BildwerkError::PdfError(_) => HumanError {
            message: "The PDF couldn't be built.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Permanent,
        },

        // -- Storage --
        BildwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::ActionRequired,
                }
            }
        }

        BildwerkError::Serialization(_) => HumanError {
            message: "The saved settings couldn't be read.".into(),
            suggestion: "Default settings will be used. Saving settings again will repair the file.".into(),
            retriable: false,
            severity: Severity::Warning,
        },
    }
}

/// Summarise the warnings from one import batch, e.g.
/// "3 of 5 images could not be loaded". Returns `None` when nothing went wrong.
pub fn summarize_import(outcomes: &[ImportOutcome]) -> Option<String> {
    let failed = outcomes
        .iter()
        .filter(|outcome| {
            outcome
                .warning
                .as_ref()
                .is_some_and(|warning| warning.kind() == ErrorKind::Warning)
        })
        .count();

    match (failed, outcomes.len()) {
        (0, _) => None,
        (1, 1) => Some("The image could not be loaded".into()),
        (failed, total) => Some(format!(
            "{failed} of {total} {} could not be loaded",
            if total == 1 { "image" } else { "images" }
        )),
    }
}
