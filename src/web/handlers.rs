use crate::{
    prediction::PredictionResult,
    web::{
        extractors::{ImageUpload, RequestId},
        AppState,
    },
    Result,
};
use axum::{extract::State, response::Json};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
}

/// 健康检查端点，模型未加载时同样返回200
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.models.is_loaded(),
    })
}

/// 服务信息端点
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.get_stats();
    Json(serde_json::json!({
        "service": "Fabric Classification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model_loaded": stats.model_loaded,
        "model": stats,
        "onnx": {
            "intra_threads": state.config.onnx_config.intra_threads,
            "optimization_level": state.config.onnx_config.optimization_level,
        },
    }))
}

/// multipart上传预测
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ImageUpload(image): ImageUpload,
) -> Result<Json<PredictionResult>> {
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        filename = image.filename().unwrap_or("<unnamed>"),
        content_type = image.content_type().unwrap_or("<none>"),
        bytes = image.len(),
        "Received file"
    );

    let pipeline = state.models.pipeline()?;
    let result = pipeline.predict_blocking(image).await?;

    tracing::info!(
        request_id = %request_id,
        fabric = %result.label,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Prediction request completed"
    );

    Ok(Json(result))
}
