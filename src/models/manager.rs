use crate::config::INPUT_SIZE;
use crate::image::NormalizedTensor;
use crate::models::{InferenceModel, LabelSet, OnnxClassifier};
use crate::prediction::PredictionPipeline;
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use std::sync::Arc;

/// 模型管理器: 启动时加载一次，之后只读共享
pub struct ModelManager {
    model: Option<Arc<dyn InferenceModel>>,
    labels: LabelSet,
}

impl ModelManager {
    /// 按配置加载标签与ONNX模型
    pub fn init(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let labels = match &config.labels_path {
            Some(path) => LabelSet::from_file(path)?,
            None => LabelSet::default(),
        };

        let loaded = OnnxClassifier::new(config).and_then(|classifier| {
            let model: Arc<dyn InferenceModel> = Arc::new(classifier);
            probe(model.as_ref(), &labels)?;
            Ok(model)
        });

        let model = match loaded {
            Ok(model) => {
                tracing::info!(
                    "Model loaded successfully: {} with {} classes",
                    model.describe(),
                    labels.len()
                );
                Some(model)
            }
            Err(e) if config.allow_degraded => {
                tracing::warn!("Failed to load model, serving in degraded mode: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self { model, labels })
    }

    /// 使用已构建的模型（不做探测）
    pub fn with_model(model: Arc<dyn InferenceModel>, labels: LabelSet) -> Self {
        Self {
            model: Some(model),
            labels,
        }
    }

    /// 未加载模型的管理器，健康检查返回 `model_loaded: false`
    pub fn unloaded(labels: LabelSet) -> Self {
        Self {
            model: None,
            labels,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// 获取预测流水线
    pub fn pipeline(&self) -> Result<PredictionPipeline> {
        let model = self
            .model
            .as_ref()
            .map(Arc::clone)
            .ok_or(ClassifierError::ModelUnavailable)?;
        Ok(PredictionPipeline::new(model, self.labels.clone()))
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            model_loaded: self.is_loaded(),
            backend: self.model.as_ref().map(|m| m.describe()),
            labels: self.labels.iter().map(str::to_string).collect(),
            input_shape: [1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3],
        }
    }
}

/// 用全零输入跑一次推理，确认输出长度与标签数量一致
pub fn probe(model: &dyn InferenceModel, labels: &LabelSet) -> Result<()> {
    let output = model
        .predict(NormalizedTensor::zeros(INPUT_SIZE))
        .map_err(|e| ClassifierError::ModelLoad(format!("Model probe failed: {}", e)))?;

    if output.len() != labels.len() {
        return Err(ClassifierError::ModelLoad(format!(
            "Model emits {} scores but {} labels are configured",
            output.len(),
            labels.len()
        )));
    }

    tracing::debug!("Model probe passed: {} outputs", output.len());
    Ok(())
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub labels: Vec<String>,
    pub input_shape: [usize; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Vec<f32>);

    impl InferenceModel for FixedModel {
        fn predict(&self, input: NormalizedTensor) -> Result<Vec<f32>> {
            assert_eq!(input.shape(), &[1, 256, 256, 3]);
            Ok(self.0.clone())
        }
    }

    struct BrokenModel;

    impl InferenceModel for BrokenModel {
        fn predict(&self, _input: NormalizedTensor) -> Result<Vec<f32>> {
            Err(ClassifierError::Inference("runtime unavailable".into()))
        }
    }

    #[test]
    fn probe_accepts_matching_output() {
        let model = FixedModel(vec![0.2; 5]);
        assert!(probe(&model, &LabelSet::default()).is_ok());
    }

    #[test]
    fn probe_rejects_wrong_length() {
        let model = FixedModel(vec![0.5, 0.5]);
        let err = probe(&model, &LabelSet::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelLoad(_)));
    }

    #[test]
    fn probe_wraps_model_errors() {
        let err = probe(&BrokenModel, &LabelSet::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelLoad(ref m) if m.contains("runtime unavailable")));
    }

    #[test]
    fn unloaded_manager_has_no_pipeline() {
        let manager = ModelManager::unloaded(LabelSet::default());
        assert!(!manager.is_loaded());
        assert!(matches!(manager.pipeline(), Err(ClassifierError::ModelUnavailable)));

        let stats = manager.get_stats();
        assert!(!stats.model_loaded);
        assert!(stats.backend.is_none());
        assert_eq!(stats.labels.len(), 5);
    }

    #[test]
    fn loaded_manager_reports_stats() {
        let manager = ModelManager::with_model(Arc::new(FixedModel(vec![0.2; 5])), LabelSet::default());
        assert!(manager.is_loaded());
        assert!(manager.pipeline().is_ok());

        let stats = manager.get_stats();
        assert!(stats.model_loaded);
        assert_eq!(stats.backend.as_deref(), Some("opaque model"));
        assert_eq!(stats.input_shape, [1, 256, 256, 3]);
    }

    #[test]
    fn init_fails_without_model_file() {
        let config = Config::new("127.0.0.1:0".into(), "/nonexistent/fabric.onnx", Some(1), false)
            .unwrap();
        assert!(matches!(ModelManager::init(&config), Err(ClassifierError::ModelLoad(_))));
    }

    #[test]
    fn init_degrades_when_allowed() {
        let config = Config::new("127.0.0.1:0".into(), "/nonexistent/fabric.onnx", Some(1), false)
            .unwrap()
            .with_allow_degraded(true);
        let manager = ModelManager::init(&config).unwrap();
        assert!(!manager.is_loaded());
    }
}
