pub mod pipeline;
pub mod postprocessing;
pub mod types;

pub use pipeline::PredictionPipeline;
pub use postprocessing::{argmax, ResultFormatter};
pub use types::{LabelScore, PredictionResult, RawImage};
