pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{models::ModelManager, utils::error::ClassifierError, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// 路由共享状态: 配置与只读的模型管理器
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(config: Config, models: ModelManager) -> Self {
        Self {
            config,
            models: Arc::new(models),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 模型在监听端口之前加载，失败即退出（除非允许降级）
    let models = ModelManager::init(&config)?;
    let addr = config.socket_addr()?;

    let app = create_app(AppState::new(config, models));

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  POST /predict   - Predict fabric type (multipart field 'file')");
    tracing::info!("  GET  /api/info  - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifierError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ClassifierError::Internal(format!("Server failed: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let max_request_size = state.config.server_config.max_request_size;
    let request_timeout = Duration::from_secs(state.config.server_config.request_timeout);

    Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        // 请求体上限在multipart流内部触发，超限时由提取器映射为JSON 413
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
