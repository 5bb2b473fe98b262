use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionParseError {
    #[error("Malformed detection response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One raw record of the `predictions` list. Every field is optional because
/// the hosted service does not guarantee complete records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub class_label: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Prediction {
    /// A complete detection, or `None` when any field needed for drawing is missing.
    pub fn to_detection(&self) -> Option<Detection> {
        Some(Detection {
            class_label: self.class_label.clone()?,
            x_center: self.x?,
            y_center: self.y?,
            width: self.width?,
            height: self.height?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_label: String,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCorners {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Detection {
    pub fn corners(&self) -> BoxCorners {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        BoxCorners {
            x1: self.x_center - half_w,
            y1: self.y_center - half_h,
            x2: self.x_center + half_w,
            y2: self.y_center + half_h,
        }
    }

    pub fn label_text(&self) -> String {
        format!("DISEASE: {}", self.class_label.to_uppercase())
    }
}

/// Parsed response of one detection call. Keys other than `predictions`
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub predictions: Option<Vec<Prediction>>,
}

impl DetectionResult {
    pub fn from_slice(body: &[u8]) -> Result<Self, DetectionParseError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions: Some(predictions),
        }
    }

    pub fn predictions(&self) -> &[Prediction] {
        self.predictions.as_deref().unwrap_or_default()
    }

    /// True when the `predictions` key is absent or the list is empty.
    pub fn is_empty(&self) -> bool {
        self.predictions().is_empty()
    }

    pub fn len(&self) -> usize {
        self.predictions().len()
    }

    /// Complete detections in response order; partial records are dropped.
    pub fn detections(&self) -> impl Iterator<Item = Detection> + '_ {
        self.predictions().iter().filter_map(Prediction::to_detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn late_blight() -> Detection {
        Detection {
            class_label: "Late Blight".to_string(),
            x_center: 100.0,
            y_center: 100.0,
            width: 40.0,
            height: 40.0,
        }
    }

    #[test]
    fn test_corners_of_centered_box() {
        let corners = late_blight().corners();
        assert_eq!(
            corners,
            BoxCorners {
                x1: 80.0,
                y1: 80.0,
                x2: 120.0,
                y2: 120.0
            }
        );
    }

    #[test]
    fn test_corners_are_ordered_for_positive_sizes() {
        for (w, h) in [(0.5, 0.5), (1.0, 300.0), (640.0, 2.0), (13.7, 99.1)] {
            let detection = Detection {
                width: w,
                height: h,
                x_center: 3.0,
                y_center: -7.5,
                ..late_blight()
            };
            let c = detection.corners();
            assert!(c.x1 < c.x2, "x1 {} >= x2 {}", c.x1, c.x2);
            assert!(c.y1 < c.y2, "y1 {} >= y2 {}", c.y1, c.y2);
        }
    }

    #[test]
    fn test_label_text_is_uppercased() {
        assert_eq!(late_blight().label_text(), "DISEASE: LATE BLIGHT");
    }

    #[test]
    fn test_parse_hosted_response() {
        let body = br#"{
            "time": 0.041,
            "image": {"width": 640, "height": 480},
            "predictions": [
                {"x": 100, "y": 100, "width": 40, "height": 40, "confidence": 0.91,
                 "class": "Late Blight", "class_id": 4, "detection_id": "a1"},
                {"x": 10, "y": 10, "class": "Septoria"}
            ]
        }"#;

        let result = DetectionResult::from_slice(body).unwrap();
        assert_eq!(result.len(), 2);

        let detections: Vec<Detection> = result.detections().collect();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_label, "Late Blight");
        assert_eq!(detections[0].height, 40.0);
    }

    #[test]
    fn test_missing_predictions_key_is_empty() {
        let result = DetectionResult::from_slice(br#"{"time": 0.1}"#).unwrap();
        assert!(result.predictions.is_none());
        assert!(result.is_empty());
        assert_eq!(result.detections().count(), 0);
    }

    #[test]
    fn test_null_fields_count_as_missing() {
        let body = br#"{"predictions": [{"x": 1, "y": 2, "width": null, "height": 4, "class": "Healthy"}]}"#;
        let result = DetectionResult::from_slice(body).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.detections().count(), 0);
    }

    #[test]
    fn test_non_object_response_is_malformed() {
        assert!(DetectionResult::from_slice(b"[1, 2, 3]").is_err());
        assert!(DetectionResult::from_slice(br#"{"predictions": "none"}"#).is_err());
        assert!(DetectionResult::from_slice(b"<html>").is_err());
    }
}
