use crate::advice::{AdviceTable, FALLBACK_ADVICE};
use crate::annotate::annotate;
use crate::detection::{DetectionResult, Prediction};
use crate::detector::{Detector, DetectorError};
use crate::font::LabelFont;
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Detection failed: {0}")]
    Detection(#[from] DetectorError),
    #[error("Annotation task failed: {0}")]
    Annotation(#[from] tokio::task::JoinError),
}

/// One advice block of the report, in detection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub label: String,
    pub advice: &'static str,
}

#[derive(Debug)]
pub enum Inspection {
    NoDiseases,
    Diseased {
        annotated: RgbImage,
        count: usize,
        findings: Vec<Finding>,
    },
}

/// Runs detector, renderer and advice lookup for one upload.
#[derive(Clone)]
pub struct Inspector {
    detector: Arc<dyn Detector>,
    advice: Arc<AdviceTable>,
    font: Arc<LabelFont>,
}

impl Inspector {
    pub fn new(detector: Arc<dyn Detector>, advice: Arc<AdviceTable>, font: Arc<LabelFont>) -> Self {
        Self {
            detector,
            advice,
            font,
        }
    }

    pub async fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, InspectError> {
        Ok(self.detector.detect(image).await?)
    }

    /// Draws the detections on a copy of `image` off the async runtime.
    pub async fn annotate(
        &self,
        image: &DynamicImage,
        result: DetectionResult,
    ) -> Result<RgbImage, InspectError> {
        let rgb = image.to_rgb8();
        let font = self.font.clone();
        let annotated =
            tokio::task::spawn_blocking(move || annotate(&rgb, &result, &font)).await?;
        Ok(annotated)
    }

    pub fn findings(&self, result: &DetectionResult) -> Vec<Finding> {
        result
            .predictions()
            .iter()
            .map(|prediction| self.finding(prediction))
            .collect()
    }

    fn finding(&self, prediction: &Prediction) -> Finding {
        match &prediction.class_label {
            Some(class_label) => Finding {
                label: class_label.to_uppercase(),
                advice: self.advice.lookup(class_label),
            },
            None => Finding {
                label: "UNKNOWN".to_string(),
                advice: FALLBACK_ADVICE,
            },
        }
    }

    #[instrument(skip(self, image))]
    pub async fn inspect(&self, image: &DynamicImage) -> Result<Inspection, InspectError> {
        let result = self.detect(image).await?;

        if result.is_empty() {
            tracing::info!("No diseases detected");
            return Ok(Inspection::NoDiseases);
        }

        let count = result.len();
        let findings = self.findings(&result);
        let annotated = self.annotate(image, result).await?;
        tracing::info!("Detected {} diseases", count);

        Ok(Inspection::Diseased {
            annotated,
            count,
            findings,
        })
    }
}
