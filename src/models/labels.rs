use crate::utils::error::ClassifierError;
use crate::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// 内置标签，顺序必须与模型输出一致
pub const FABRIC_LABELS: [&str; 5] = ["cotton", "denim", "net", "silk", "wool"];

/// 有序、不可变的类别名称列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(Arc<[String]>);

impl Default for LabelSet {
    fn default() -> Self {
        Self(FABRIC_LABELS.iter().map(|s| s.to_string()).collect())
    }
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(ClassifierError::Config("Label set is empty".to_string()));
        }
        if let Some(dup) = labels
            .iter()
            .enumerate()
            .find(|(i, l)| labels[..*i].contains(*l))
            .map(|(_, l)| l)
        {
            return Err(ClassifierError::Config(format!("Duplicate label '{}'", dup)));
        }
        Ok(Self(labels.into()))
    }

    /// 每行一个标签，空行忽略
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifierError::Config(format!("Failed to read labels {}: {}", path.display(), e))
        })?;

        let labels = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());
        let set = Self::new(labels)?;

        tracing::info!("Loaded {} labels from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
