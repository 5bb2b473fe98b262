pub mod advice;
pub mod annotate;
pub mod detection;
pub mod detector;
pub mod font;
pub mod image_utils;
pub mod page;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod telemetry;

pub mod app;
pub mod config;

pub use app::start_app;
