//! Sitediff Core - Construction-site orthophoto analysis
//!
//! This crate turns pairs of site captures into change heatmaps with a
//! severity histogram, and single captures into material class maps using
//! ordered color-range rules.
//!
//! The in-memory engines ([`diff::diff`], [`classify::classify`]) work on
//! [`PixelBuffer`]s. The [`pipeline`] functions wrap them with file loading
//! and PNG output.

pub mod classify;
pub mod colormap;
pub mod decode;
pub mod diff;
pub mod encode;
pub mod histogram;
pub mod luminance;
mod parallel;
pub mod pipeline;

pub use classify::{
    classify, ChannelRange, ClassCounts, ClassPercentages, Classification, ClassificationRule,
    ClassifyError, RuleSet, UNKNOWN_LABEL,
};
pub use colormap::ColorMap;
pub use decode::{DecodeError, GrayBuffer, PixelBuffer, ShapeError};
pub use diff::{blend, diff, DiffOptions, DiffResult};
pub use encode::EncodeError;
pub use histogram::{Severity, SeverityHistogram, SeverityThresholds};
pub use pipeline::{
    classify_image, compute_difference, ClassificationReport, DiffReport, ErrorKind,
    PipelineError,
};
