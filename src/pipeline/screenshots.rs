//! Visual-regression screenshot classification
//!
//! After the visual stage the pipeline wants to know which screenshots
//! are new: baseline images on push runs, failure diffs on pull-request
//! runs. This module only classifies files on disk; image comparison
//! itself happens inside the test stage.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which subtree of the screenshots directory to classify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotKind {
    /// Newly captured reference images (push runs)
    Baseline,
    /// Diff images from failed comparisons (pull-request runs)
    Failure,
}

impl ScreenshotKind {
    fn subtree(&self) -> &'static str {
        match self {
            ScreenshotKind::Baseline => "baselines",
            ScreenshotKind::Failure => "failures",
        }
    }
}

/// Classified screenshots of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotReport {
    pub kind: ScreenshotKind,
    /// Paths relative to the screenshots directory, sorted
    pub files: Vec<PathBuf>,
}

impl ScreenshotReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Scan `screenshots_dir` for `.png` files of the given kind.
///
/// A missing directory classifies as empty; the visual stage may simply
/// not have produced anything.
pub fn classify(screenshots_dir: &Path, kind: ScreenshotKind) -> ScreenshotReport {
    let root = screenshots_dir.join(kind.subtree());

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(screenshots_dir)
                .ok()
                .map(Path::to_path_buf)
        })
        .collect();
    files.sort();

    ScreenshotReport { kind, files }
}

/// Classify and print a console summary.
pub fn report(screenshots_dir: &Path, kind: ScreenshotKind) -> ScreenshotReport {
    let report = classify(screenshots_dir, kind);

    let label = match kind {
        ScreenshotKind::Baseline => "baseline screenshots",
        ScreenshotKind::Failure => "failure screenshots",
    };

    if report.is_empty() {
        println!("No new {}.", label);
    } else {
        println!("Found {} new {}:", report.files.len(), label);
        for file in &report.files {
            println!("  {}", file.display());
        }
    }

    report
}
