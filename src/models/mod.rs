pub mod classifier;
pub mod labels;
pub mod manager;

pub use classifier::{InferenceModel, OnnxClassifier};
pub use labels::{LabelSet, FABRIC_LABELS};
pub use manager::{ModelManager, ModelStats};
