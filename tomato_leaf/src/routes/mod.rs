mod detect;
mod health;
mod index;
mod metrics;
mod predict_image;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use detect::{detect, DetectPageError};
pub use health::healthcheck;
pub use index::index;
pub use metrics::metrics_handler;
pub use predict_image::{predict_image, PredictImageError, DETECTION_COUNT_HEADER};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/detect", post(detect))
        .route("/predict_image", post(predict_image))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
}
