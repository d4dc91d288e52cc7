//! Seam for the external image classifier.
//!
//! Inference itself happens outside this workspace. A classifier either
//! returns a label or fails explicitly; the pipeline never proceeds to
//! delivery without one.

use crate::types::Classification;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("classifier produced no observations")]
    NoResult,
}

/// Produces the best-scoring label for an image.
pub trait Classifier {
    fn classify(&self, image: &[u8]) -> Result<Classification, ClassifierError>;
}

/// Pick the highest-confidence observation. Observations without a
/// confidence rank below any scored one; ties keep the earliest.
pub fn best_of(
    observations: impl IntoIterator<Item = Classification>,
) -> Result<Classification, ClassifierError> {
    let mut best: Option<Classification> = None;
    for obs in observations {
        let is_better = match &best {
            None => true,
            Some(prev) => {
                obs.confidence.unwrap_or(f32::NEG_INFINITY)
                    > prev.confidence.unwrap_or(f32::NEG_INFINITY)
            }
        };
        if is_better {
            best = Some(obs);
        }
    }
    best.ok_or(ClassifierError::NoResult)
}

/// Classifier that ignores the image and returns a preset label.
///
/// Stands in for inference when the label is already known, e.g. when
/// an operator passes it on the command line.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    label: String,
}

impl FixedClassifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, _image: &[u8]) -> Result<Classification, ClassifierError> {
        Ok(Classification::new(self.label.clone()))
    }
}
