use crate::{
    image_utils::{encode_jpeg, ImageUtilsError, Upload},
    page::{self, EmbeddedImage},
    pipeline::{InspectError, Inspection},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/detect";
const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum DetectPageError {
    #[error("Could not read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No image was uploaded")]
    MissingImage,
    #[error("{0}")]
    InvalidImage(ImageUtilsError),
    #[error("Annotation task failed: {0}")]
    Annotation(tokio::task::JoinError),
    #[error("Failed to render annotated image: {0}")]
    Render(ImageUtilsError),
}

impl IntoResponse for DetectPageError {
    fn into_response(self) -> Response {
        let status = match self {
            DetectPageError::Multipart(ref e) => e.status(),
            DetectPageError::MissingImage => StatusCode::BAD_REQUEST,
            DetectPageError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            DetectPageError::Annotation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DetectPageError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Html(page::error_page(&self.to_string()))).into_response()
    }
}

/// First file part of the form, preferring the `image` field.
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, DetectPageError> {
    while let Some(field) = multipart.next_field().await? {
        let is_image = field.name() == Some(IMAGE_FIELD) || field.file_name().is_some();
        if is_image {
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                return Err(DetectPageError::MissingImage);
            }
            return Ok(bytes);
        }
    }
    Err(DetectPageError::MissingImage)
}

/// Upstream failures get the notice page, local ones an error.
fn inspection_failure(
    error: InspectError,
    original: &EmbeddedImage,
) -> Result<Response, DetectPageError> {
    match error {
        InspectError::Detection(e) => {
            tracing::error!("Detection failed: {}", e);
            let page = page::failure_page(original);
            Ok((StatusCode::BAD_GATEWAY, Html(page)).into_response())
        }
        InspectError::Annotation(e) => {
            tracing::error!("Annotation failed: {}", e);
            Err(DetectPageError::Annotation(e))
        }
    }
}

#[instrument(skip(state, multipart))]
pub async fn detect(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, DetectPageError> {
    state.metrics.record_request(ROUTE);

    let bytes = read_upload(&mut multipart).await?;
    let upload = Upload::from_bytes(&bytes).map_err(DetectPageError::InvalidImage)?;
    let original = EmbeddedImage {
        mime: upload.mime_type(),
        bytes: &bytes,
    };

    let started = Instant::now();
    let inspection = match state.inspector.inspect(&upload.image).await {
        Ok(inspection) => inspection,
        Err(e) => return inspection_failure(e, &original),
    };
    state
        .metrics
        .record_detection_duration(started.elapsed().as_millis() as u64, ROUTE);

    let html = match &inspection {
        Inspection::NoDiseases => page::report_page(&original, &inspection, None),
        Inspection::Diseased {
            annotated, count, ..
        } => {
            state.metrics.record_detections(*count, ROUTE);
            let jpeg = encode_jpeg(annotated).map_err(DetectPageError::Render)?;
            let annotated = EmbeddedImage {
                mime: "image/jpeg",
                bytes: &jpeg,
            };
            page::report_page(&original, &inspection, Some(&annotated))
        }
    };

    Ok(Html(html).into_response())
}
