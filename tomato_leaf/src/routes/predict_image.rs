use crate::{
    image_utils::{encode_jpeg, ImageUtilsError, Upload},
    pipeline::InspectError,
    server::SharedState,
};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/predict_image";
pub const DETECTION_COUNT_HEADER: &str = "x-detection-count";

#[derive(Error, Debug)]
pub enum PredictImageError {
    #[error("Image decode failed: {0}")]
    Decode(ImageUtilsError),
    #[error("Prediction failed: {0}")]
    Inspect(#[from] InspectError),
    #[error("Image conversion failed: {0}")]
    ImageConversion(ImageUtilsError),
    #[error("HTTP builder failed: {0}")]
    HttpBuilder(String),
}

impl IntoResponse for PredictImageError {
    fn into_response(self) -> Response {
        let status = match self {
            PredictImageError::Decode(_) => StatusCode::BAD_REQUEST,
            PredictImageError::Inspect(InspectError::Detection(_)) => StatusCode::BAD_GATEWAY,
            PredictImageError::Inspect(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PredictImageError::ImageConversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PredictImageError::HttpBuilder(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("Something went wrong: {}", self)).into_response()
    }
}

/// Annotated JPEG for a raw image body. Scripted counterpart of `/detect`.
#[instrument(skip(state, image_data))]
pub async fn predict_image(
    State(state): State<SharedState>,
    image_data: Bytes,
) -> Result<Response, PredictImageError> {
    state.metrics.record_request(ROUTE);

    let upload = Upload::from_bytes(&image_data).map_err(PredictImageError::Decode)?;

    let started = Instant::now();
    let result = state.inspector.detect(&upload.image).await?;
    state
        .metrics
        .record_detection_duration(started.elapsed().as_millis() as u64, ROUTE);
    state.metrics.record_detections(result.len(), ROUTE);

    let count = result.len();
    let annotated = state.inspector.annotate(&upload.image, result).await?;
    let annotated_image_data =
        encode_jpeg(&annotated).map_err(PredictImageError::ImageConversion)?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(DETECTION_COUNT_HEADER, count)
        .body(Body::from(annotated_image_data))
        .map_err(|e| PredictImageError::HttpBuilder(e.to_string()))?;

    Ok(response)
}
