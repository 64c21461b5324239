use crate::utils::error::ClassifierError;
use crate::Result;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// 上传的原始图像，构造时保证非空
#[derive(Debug, Clone)]
pub struct RawImage {
    bytes: Bytes,
    filename: Option<String>,
    content_type: Option<String>,
}

impl RawImage {
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ClassifierError::MissingInput("Empty file".to_string()));
        }
        Ok(Self {
            bytes,
            filename: None,
            content_type: None,
        })
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// 单个类别的置信度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f32,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 置信度最高的类别
    #[serde(rename = "fabric")]
    pub label: String,
    pub confidence: f32,
    /// 按标签固定顺序排列的全部结果（不按置信度排序）
    #[serde(rename = "allPredictions")]
    pub all_predictions: Vec<LabelScore>,
}
