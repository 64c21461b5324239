use anyhow::{Context, Result};
use clap::Parser;
use fabric_classifier::{
    models::{manager::probe, InferenceModel, OnnxClassifier},
    LabelSet, PredictionPipeline, RawImage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// 离线分类: 对本地图片运行同一条预测流水线
#[derive(Parser)]
#[command(name = "fabric-classify")]
#[command(about = "Classify local fabric images without starting the server")]
struct Args {
    /// ONNX model path
    #[arg(long, env = "FABRIC_MODEL_PATH", default_value = "models/fabric.onnx")]
    model: PathBuf,

    /// Label file (one label per line, in model output order)
    #[arg(long, env = "FABRIC_LABELS_PATH")]
    labels: Option<PathBuf>,

    /// ONNX intra-op threads
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Images to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let labels = match &args.labels {
        Some(path) => LabelSet::from_file(path)?,
        None => LabelSet::default(),
    };

    let classifier = OnnxClassifier::from_file(&args.model, args.threads, 3)?;
    let model: Arc<dyn InferenceModel> = Arc::new(classifier);
    probe(model.as_ref(), &labels)?;

    let pipeline = PredictionPipeline::new(model, labels);

    let mut failures = 0usize;
    for path in &args.images {
        let outcome = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|bytes| Ok(RawImage::new(bytes)?))
            .and_then(|image| Ok(pipeline.predict(&image)?));

        match outcome {
            Ok(result) => {
                let json = serde_json::json!({
                    "file": path.display().to_string(),
                    "result": result,
                });
                println!("{}", json);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {:#}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, args.images.len());
    }

    Ok(())
}
