use crate::config::DetectorConfig;
use crate::detection::{DetectionParseError, DetectionResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use reqwest::{header, Client, StatusCode};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Failed to stage image for upload: {0}")]
    Staging(#[from] std::io::Error),
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Request to detection service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Detection service returned {status}: {body}")]
    Service { status: StatusCode, body: String },
    #[error("Invalid response from detection service: {0}")]
    InvalidResponse(#[from] DetectionParseError),
    #[error("Image staging task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait Detector: Send + Sync + 'static {
    async fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, DetectorError>;
}

/// JPEG copy of an upload, staged on disk for the duration of one call.
/// The file is removed when the value drops.
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    pub fn write_in(dir: &Path, image: &DynamicImage) -> Result<Self, DetectorError> {
        let file = tempfile::Builder::new()
            .prefix("tomato-leaf-")
            .suffix(".jpg")
            .tempfile_in(dir)?;

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut writer = BufWriter::new(file.as_file());
        rgb.write_to(&mut writer, ImageFormat::Jpeg)?;
        writer.flush()?;
        drop(writer);

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<Vec<u8>, DetectorError> {
        Ok(std::fs::read(self.path())?)
    }
}

/// Client for the Roboflow hosted inference API.
pub struct RoboflowDetector {
    http: Client,
    config: DetectorConfig,
    staging_dir: PathBuf,
}

impl RoboflowDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        let http = Client::builder().build()?;
        let staging_dir = config
            .staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        Ok(Self {
            http,
            config,
            staging_dir,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    async fn stage(&self, image: &DynamicImage) -> Result<(TempImage, Vec<u8>), DetectorError> {
        let image = image.clone();
        let dir = self.staging_dir.clone();
        tokio::task::spawn_blocking(move || {
            let staged = TempImage::write_in(&dir, &image)?;
            let bytes = staged.read()?;
            Ok::<_, DetectorError>((staged, bytes))
        })
        .await?
    }
}

#[async_trait]
impl Detector for RoboflowDetector {
    #[instrument(skip(self, image), fields(model_id = %self.config.model_id))]
    async fn detect(&self, image: &DynamicImage) -> Result<DetectionResult, DetectorError> {
        // Held until the call completes; dropping it removes the file.
        let (staged, jpeg) = self.stage(image).await?;
        tracing::debug!(
            "Staged {} bytes at {}",
            jpeg.len(),
            staged.path().display()
        );

        let url = self.config.get_model_url();
        tracing::debug!("Sending detection request to {}", url);

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(STANDARD.encode(&jpeg))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Detection service returned {}: {}", status, body);
            return Err(DetectorError::Service { status, body });
        }

        let body = response.bytes().await?;
        let result = DetectionResult::from_slice(&body)?;
        tracing::debug!("Received {} predictions", result.len());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use wiremock::matchers::{header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn config(api_url: &str) -> DetectorConfig {
        DetectorConfig {
            api_url: api_url.to_string(),
            api_key: "test-key".to_string(),
            model_id: "tomato-leaf-disease-rxcft/3".to_string(),
            staging_dir: None,
        }
    }

    fn staged_config(api_url: &str, staging_dir: &Path) -> DetectorConfig {
        DetectorConfig {
            staging_dir: Some(staging_dir.to_path_buf()),
            ..config(api_url)
        }
    }

    fn leaf_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([40, 160, 60])))
    }

    fn staged_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_temp_image_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = TempImage::write_in(dir.path(), &leaf_image()).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));

        let bytes = staged.read().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        drop(staged);
        assert!(!path.exists());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn test_temp_image_accepts_alpha_input() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 128])));
        let dir = tempfile::tempdir().unwrap();
        let staged = TempImage::write_in(dir.path(), &rgba).unwrap();
        let decoded = image::load_from_memory(&staged.read().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[tokio::test]
    async fn test_detect_posts_base64_jpeg() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tomato-leaf-disease-rxcft/3"))
            .and(query_param("api_key", "test-key"))
            .and(header_is("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "time": 0.05,
                "image": {"width": 32, "height": 24},
                "predictions": [
                    {"x": 16, "y": 12, "width": 10, "height": 8, "class": "Septoria", "confidence": 0.8},
                    {"x": 4, "y": 4, "class": "Healthy"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let staging = tempfile::tempdir()?;
        let detector = RoboflowDetector::new(staged_config(&server.uri(), staging.path()))?;
        let result = detector.detect(&leaf_image()).await?;

        assert!(staged_files(staging.path()).is_empty());
        assert_eq!(result.len(), 2);
        assert_eq!(result.detections().count(), 1);

        let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
        let body = STANDARD.decode(&requests[0].body)?;
        assert_eq!(image::guess_format(&body)?, ImageFormat::Jpeg);

        Ok(())
    }

    #[tokio::test]
    async fn test_detect_without_predictions_key() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"time": 0.01})))
            .mount(&server)
            .await;

        let detector = RoboflowDetector::new(config(&server.uri()))?;
        let result = detector.detect(&leaf_image()).await?;

        assert!(result.predictions.is_none());
        assert!(result.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_service_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let detector = RoboflowDetector::new(config(&server.uri())).unwrap();
        let err = detector.detect(&leaf_image()).await.unwrap_err();

        match err {
            DetectorError::Service { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let detector = RoboflowDetector::new(config(&server.uri())).unwrap();
        let err = detector.detect(&leaf_image()).await.unwrap_err();
        assert!(matches!(err, DetectorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let staging = tempfile::tempdir().unwrap();
        let detector =
            RoboflowDetector::new(staged_config("http://127.0.0.1:1", staging.path())).unwrap();
        let err = detector.detect(&leaf_image()).await.unwrap_err();

        assert!(matches!(err, DetectorError::Transport(_)));
        assert!(staged_files(staging.path()).is_empty());
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_service_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("inference backend down"))
            .expect(1)
            .mount(&server)
            .await;

        let staging = tempfile::tempdir().unwrap();
        let detector =
            RoboflowDetector::new(staged_config(&server.uri(), staging.path())).unwrap();
        let err = detector.detect(&leaf_image()).await.unwrap_err();

        assert!(matches!(
            err,
            DetectorError::Service { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(staged_files(staging.path()).is_empty());
    }

    #[tokio::test]
    async fn test_staging_into_missing_directory_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let staging = tempfile::tempdir().unwrap();
        let missing = staging.path().join("gone");
        let detector = RoboflowDetector::new(staged_config(&server.uri(), &missing)).unwrap();
        let err = detector.detect(&leaf_image()).await.unwrap_err();

        assert!(matches!(err, DetectorError::Staging(_)));
    }
}
