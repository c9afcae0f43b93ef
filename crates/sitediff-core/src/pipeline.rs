//! File-based entry points: load, analyze, write PNG, report.
//!
//! Both operations return a typed [`PipelineError`] instead of a success
//! flag. An unchanged site (identical captures) is a successful diff with an
//! all-low histogram.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::classify::{classify, ClassCounts, ClassPercentages, ClassifyError, RuleSet};
use crate::decode::{align_to, load, DecodeError, ShapeError};
use crate::diff::{diff, DiffOptions};
use crate::encode::{encode_png, write_encoded, write_png, EncodeError};
use crate::histogram::SeverityHistogram;

/// Failure category, for callers that map errors to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    Decode,
    Shape,
    InvalidInput,
    Encode,
}

/// Error returned by [`compute_difference`] and [`classify_image`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode(DecodeError::NotFound(_)) => ErrorKind::NotFound,
            PipelineError::Decode(DecodeError::EmptyImage { .. }) => ErrorKind::Shape,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::Shape(_) => ErrorKind::Shape,
            PipelineError::Classify(_) => ErrorKind::InvalidInput,
            PipelineError::Encode(_) => ErrorKind::Encode,
        }
    }
}

/// Summary of a diff run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub heatmap_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_path: Option<PathBuf>,
    pub severity: SeverityHistogram,
    pub width: u32,
    pub height: u32,
}

/// Summary of a classification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationReport {
    pub classified_image_path: PathBuf,
    pub class_counts: ClassCounts,
    pub class_percentages: ClassPercentages,
}

/// Path of the overlay written next to `heatmap_path`: `<stem>_overlay.png`.
pub fn overlay_path_for(heatmap_path: &Path) -> PathBuf {
    let stem = heatmap_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diff".to_string());
    heatmap_path.with_file_name(format!("{stem}_overlay.png"))
}

/// Diff two captures of the same site and write the heatmap to `out_path`.
///
/// The second capture is resampled to the first one's dimensions. When
/// `options.blend_alpha > 0` an overlay is also written, see
/// [`overlay_path_for`].
///
/// # Errors
///
/// Returns `PipelineError` with kind `NotFound` or `Decode` for unreadable
/// inputs, `Shape` for unusable dimensions and `Encode` if an output cannot
/// be written. On error no output file is left behind.
#[tracing::instrument(
    skip_all,
    fields(path_a = %path_a.as_ref().display(), path_b = %path_b.as_ref().display())
)]
pub fn compute_difference(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
    options: &DiffOptions,
) -> Result<DiffReport, PipelineError> {
    let first = load(path_a.as_ref())?;
    let second = align_to(&first, &load(path_b.as_ref())?)?;

    let result = diff(&first, &second, options)?;

    // Encode everything before touching the filesystem
    let heatmap_png = encode_png(&result.heatmap.pixels, first.width, first.height)?;
    let overlay_png = match &result.overlay {
        Some(overlay) => Some(encode_png(&overlay.pixels, overlay.width, overlay.height)?),
        None => None,
    };

    let heatmap_path = out_path.as_ref().to_path_buf();
    write_encoded(&heatmap_png, &heatmap_path)?;

    let overlay_path = match overlay_png {
        Some(bytes) => {
            let path = overlay_path_for(&heatmap_path);
            if let Err(e) = write_encoded(&bytes, &path) {
                // No partial output: drop the heatmap written above
                if let Err(cleanup) = std::fs::remove_file(&heatmap_path) {
                    warn!(
                        path = %heatmap_path.display(),
                        error = %cleanup,
                        "failed to remove heatmap"
                    );
                }
                return Err(e.into());
            }
            Some(path)
        }
        None => None,
    };

    info!(
        width = first.width,
        height = first.height,
        low = result.severity.low,
        medium = result.severity.medium,
        high = result.severity.high,
        flat = result.is_flat(),
        "computed difference"
    );

    Ok(DiffReport {
        heatmap_path,
        overlay_path,
        severity: result.severity,
        width: first.width,
        height: first.height,
    })
}

/// Classify a capture and write the rendered class map to `out_path`.
///
/// # Errors
///
/// Returns `PipelineError` with kind `NotFound` or `Decode` for an
/// unreadable input, `InvalidInput` for an invalid rule set and `Encode` if
/// the class map cannot be written.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), rules = rules.len()))]
pub fn classify_image(
    path: impl AsRef<Path>,
    rules: &RuleSet,
    out_path: impl AsRef<Path>,
) -> Result<ClassificationReport, PipelineError> {
    let image = load(path.as_ref())?;
    let classification = classify(&image, rules)?;

    let classified_image_path = out_path.as_ref().to_path_buf();
    write_png(&classification.map, &classified_image_path)?;

    info!(
        width = image.width,
        height = image.height,
        counts = ?classification.counts,
        "classified image"
    );

    Ok(ClassificationReport {
        classified_image_path,
        class_percentages: classification.percentages(),
        class_counts: classification.counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::UNKNOWN_LABEL;
    use crate::decode::PixelBuffer;
    use tempfile::TempDir;

    fn write_capture(dir: &TempDir, name: &str, buffer: &PixelBuffer) -> PathBuf {
        let path = dir.path().join(name);
        write_png(buffer, &path).unwrap();
        path
    }

    #[test]
    fn test_compute_difference_identical_captures() {
        let dir = tempfile::tempdir().unwrap();
        let black = PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap();
        let a = write_capture(&dir, "a.png", &black);
        let b = write_capture(&dir, "b.png", &black);
        let out = dir.path().join("diff.png");

        let report = compute_difference(&a, &b, &out, &DiffOptions::default()).unwrap();

        assert_eq!(
            report.severity,
            SeverityHistogram {
                low: 4,
                medium: 0,
                high: 0,
                total: 4
            }
        );
        assert_eq!(report.heatmap_path, out);
        assert!(report.overlay_path.is_none());

        let heat = crate::decode::load(&out).unwrap();
        assert!(heat.pixels.chunks_exact(3).all(|px| px == &crate::colormap::JET_COLD[..]));
    }

    #[test]
    fn test_compute_difference_resamples_second_capture() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_capture(&dir, "a.png", &PixelBuffer::filled(8, 6, [10, 10, 10]).unwrap());
        let b = write_capture(&dir, "b.png", &PixelBuffer::filled(3, 3, [250, 250, 250]).unwrap());
        let out = dir.path().join("diff.png");

        let report = compute_difference(&a, &b, &out, &DiffOptions::overlay()).unwrap();

        assert_eq!((report.width, report.height), (8, 6));
        assert_eq!(report.severity.total, 48);
        assert_eq!(report.severity.high, 48);

        let overlay_path = report.overlay_path.unwrap();
        assert_eq!(overlay_path, dir.path().join("diff_overlay.png"));
        assert_eq!(crate::decode::load(&overlay_path).unwrap().dimensions(), (8, 6));
        assert_eq!(crate::decode::load(&out).unwrap().dimensions(), (8, 6));
    }

    #[test]
    fn test_compute_difference_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_capture(&dir, "a.png", &PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap());
        let missing = dir.path().join("nope.png");

        let out = dir.path().join("d.png");

        let err = compute_difference(&a, &missing, &out, &DiffOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_compute_difference_corrupt_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_capture(&dir, "a.png", &PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap());
        let bad = dir.path().join("bad.tif");
        std::fs::write(&bad, b"definitely not a raster").unwrap();

        let out = dir.path().join("d.png");

        let err = compute_difference(&a, &bad, &out, &DiffOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_compute_difference_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let img = PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap();
        let a = write_capture(&dir, "a.png", &img);
        let out = dir.path().join("missing").join("d.png");

        let err = compute_difference(&a, &a, &out, &DiffOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn test_compute_difference_overlay_failure_leaves_no_heatmap() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_capture(&dir, "a.png", &PixelBuffer::filled(2, 2, [0, 0, 0]).unwrap());
        let b = write_capture(&dir, "b.png", &PixelBuffer::filled(2, 2, [90, 90, 90]).unwrap());
        let out = dir.path().join("diff.png");
        // A directory in the overlay's place makes the second write fail
        std::fs::create_dir(dir.path().join("diff_overlay.png")).unwrap();

        let err = compute_difference(&a, &b, &out, &DiffOptions::overlay()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Encode);
        assert!(!out.exists());
    }

    #[test]
    fn test_classify_image() {
        let dir = tempfile::tempdir().unwrap();
        let img = PixelBuffer::new(2, 1, vec![150, 200, 180, 0, 0, 0]).unwrap();
        let path = write_capture(&dir, "capture.png", &img);
        let out = dir.path().join("classes.png");
        let rules = RuleSet::from_json(
            r#"[{"label": "GNT", "red": [150, 222], "green": [146, 228], "blue": [145, 222]}]"#,
        )
        .unwrap();

        let report = classify_image(&path, &rules, &out).unwrap();

        assert_eq!(report.class_counts.get("GNT"), Some(1));
        assert_eq!(report.class_counts.get(UNKNOWN_LABEL), Some(1));
        assert_eq!(report.class_percentages.get("GNT"), Some(50.0));
        assert_eq!(crate::decode::load(&out).unwrap().dimensions(), (2, 1));
    }

    #[test]
    fn test_classification_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_capture(&dir, "c.png", &PixelBuffer::filled(1, 1, [0, 0, 0]).unwrap());
        let out = dir.path().join("classes.png");

        let report = classify_image(&path, &RuleSet::default(), &out).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["classCounts"]["Unknown"], 1);
        assert_eq!(json["classPercentages"]["Unknown"], 100.0);
        assert!(json["classifiedImagePath"].is_string());
    }

    #[test]
    fn test_error_kinds() {
        let err = PipelineError::from(DecodeError::InvalidFormat);
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = PipelineError::from(ShapeError::ZeroSized {
            width: 0,
            height: 0,
        });
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = PipelineError::from(ClassifyError::EmptyLabel);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = PipelineError::from(EncodeError::MissingDirectory(PathBuf::from("/x")));
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(err.to_string(), "Output directory does not exist: /x");
    }

    #[test]
    fn test_overlay_path_for() {
        assert_eq!(
            overlay_path_for(Path::new("/out/abc.png")),
            PathBuf::from("/out/abc_overlay.png")
        );
    }
}
