use anyhow::{Context, Result};
use clap::Parser;
use fabric_classifier::{config::Config, web::serve};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fabric-classifier")]
#[command(about = "Fabric image classification service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "FABRIC_BIND", default_value = "0.0.0.0:5000")]
    bind: String,

    /// ONNX model path
    #[arg(long, env = "FABRIC_MODEL_PATH", default_value = "models/fabric.onnx")]
    model: PathBuf,

    /// Label file (one label per line, in model output order)
    #[arg(long, env = "FABRIC_LABELS_PATH")]
    labels: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Keep serving /health when the model fails to load
    #[arg(long)]
    allow_degraded: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting fabric classification service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model.display());

    let config = Config::new(args.bind, args.model, args.workers, args.dev)?
        .with_labels_path(args.labels)
        .with_allow_degraded(args.allow_degraded);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;

    Ok(())
}
