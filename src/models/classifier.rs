use crate::image::NormalizedTensor;
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 不透明的推理能力: 输入张量，输出与标签顺序对齐的概率向量
pub trait InferenceModel: Send + Sync {
    fn predict(&self, input: NormalizedTensor) -> Result<Vec<f32>>;

    /// 模型描述，用于日志和 `/api/info`
    fn describe(&self) -> String {
        "opaque model".to_string()
    }
}

/// 基于ONNX Runtime的分类模型
pub struct OnnxClassifier {
    // ort 的 `Session::run` 需要 `&mut self`
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_file(
            &config.model_path,
            config.onnx_config.intra_threads,
            config.onnx_config.optimization_level,
        )
    }

    pub fn from_file(
        model_path: &Path,
        intra_threads: usize,
        optimization_level: u8,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let load_err = |e: ort::Error| {
            ClassifierError::ModelLoad(format!(
                "failed to create ONNX session for {}: {}",
                model_path.display(),
                e
            ))
        };

        let session = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(optimization_level_from(optimization_level))
            .map_err(load_err)?
            .with_intra_threads(intra_threads)
            .map_err(load_err)?
            .commit_from_file(model_path)
            .map_err(load_err)?;

        // 动态发现输入/输出名称
        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model input: '{}', output: '{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl InferenceModel for OnnxClassifier {
    fn predict(&self, input: NormalizedTensor) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input.into_inner())
            .map_err(|e| ClassifierError::Inference(format!("Failed to build input: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let output = match outputs.get(self.output_name.as_str()) {
            Some(output) => output,
            None => {
                let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                return Err(ClassifierError::Inference(format!(
                    "Classification output '{}' not found. Available outputs: {:?}",
                    self.output_name, available
                )));
            }
        };

        let probabilities = output
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        // 期望 (1, N)；只取第一条
        let shape = probabilities.shape();
        if shape.len() == 2 && shape[0] != 1 {
            return Err(ClassifierError::Inference(format!(
                "Expected batch size 1, got output shape {:?}",
                shape
            )));
        }

        Ok(probabilities.iter().copied().collect())
    }

    fn describe(&self) -> String {
        format!("onnx ({} -> {})", self.input_name, self.output_name)
    }
}

fn optimization_level_from(level: u8) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
