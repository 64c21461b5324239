use crate::{
    image::{ImageLoader, ImagePreprocessor, NormalizedTensor},
    models::{InferenceModel, LabelSet},
    prediction::{PredictionResult, RawImage, ResultFormatter},
    utils::error::ClassifierError,
    Result,
};
use axum::body::Bytes;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// 预测流水线: 预处理 -> 推理 -> 结果排列
#[derive(Clone)]
pub struct PredictionPipeline {
    model: Arc<dyn InferenceModel>,
    labels: LabelSet,
    preprocessor: ImagePreprocessor,
}

impl PredictionPipeline {
    pub fn new(model: Arc<dyn InferenceModel>, labels: LabelSet) -> Self {
        Self {
            model,
            labels,
            preprocessor: ImagePreprocessor::default(),
        }
    }

    /// 处理未校验的字节，空输入直接拒绝
    pub fn predict_bytes(&self, bytes: impl Into<Bytes>) -> Result<PredictionResult> {
        let image = RawImage::new(bytes)?;
        self.predict(&image)
    }

    /// 同步执行完整流水线
    pub fn predict(&self, image: &RawImage) -> Result<PredictionResult> {
        let start_time = Instant::now();

        tracing::debug!(
            bytes = image.len(),
            format = ?ImageLoader::detect_format(image.bytes()),
            "Preprocessing image"
        );
        let tensor = self.preprocessor.preprocess(image.bytes())?;
        let preprocessing_time = start_time.elapsed();

        let inference_start = Instant::now();
        let probabilities = self.infer(tensor)?;
        let inference_time = inference_start.elapsed();

        let result = ResultFormatter::format_result(&self.labels, &probabilities)?;

        tracing::info!(
            fabric = %result.label,
            confidence = result.confidence,
            preprocess_ms = preprocessing_time.as_millis() as u64,
            inference_ms = inference_time.as_millis() as u64,
            "Prediction: {} ({:.2}%)",
            result.label,
            result.confidence * 100.0
        );

        Ok(result)
    }

    /// 在阻塞线程池中执行，避免占用异步运行时
    pub async fn predict_blocking(&self, image: RawImage) -> Result<PredictionResult> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.predict(&image))
            .await
            .map_err(|e| ClassifierError::Inference(format!("Prediction task failed: {}", e)))?
    }

    /// 调用模型；模型返回错误或发生panic都归为推理错误
    fn infer(&self, tensor: NormalizedTensor) -> Result<Vec<f32>> {
        let model = &self.model;
        match panic::catch_unwind(AssertUnwindSafe(|| model.predict(tensor))) {
            Ok(result) => result.map_err(ClassifierError::into_inference),
            Err(payload) => Err(ClassifierError::Inference(format!(
                "Model panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
