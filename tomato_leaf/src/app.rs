use crate::advice::AdviceTable;
use crate::config::Config;
use crate::detector::RoboflowDetector;
use crate::font::LabelFont;
use crate::pipeline::Inspector;
use crate::server::HttpServer;
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let detector = match RoboflowDetector::new(config.detector.clone()) {
        Ok(detector) => detector,
        Err(e) => {
            tracing::error!("Failed to initialize detector client: {:?}", e);
            return Err(Box::new(e));
        }
    };
    tracing::info!("Using detection model {}", detector.model_id());

    let advice = Arc::new(AdviceTable::tomato());
    let font = Arc::new(LabelFont::load(config.annotation.font_path.as_deref())?);
    let inspector = Inspector::new(Arc::new(detector), advice, font);

    let metrics = Arc::new(Metrics::new()?);
    let server = HttpServer::new(inspector, metrics, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Server stopped with error: {:?}", e),
        Err(e) => tracing::error!("Server task failed: {:?}", e),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
