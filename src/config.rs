use crate::utils::error::ClassifierError;
use crate::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

/// 模型输入边长（正方形）
pub const INPUT_SIZE: u32 = 256;

/// 模型输入通道数（RGB）
pub const INPUT_CHANNELS: usize = 3;

/// 单张图像大小上限（字节）
///
/// HTTP上传先受 `ServerConfig::max_request_size` 限制；此上限约束不经过HTTP的调用方，
/// 例如离线分类命令读取的本地文件。
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// ONNX模型文件路径
    pub model_path: PathBuf,

    /// 标签文件路径（可选，缺省使用内置标签）
    pub labels_path: Option<PathBuf>,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// 模型加载失败时仍然启动服务
    pub allow_degraded: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别 (0-3)
    pub optimization_level: u8,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: MAX_IMAGE_BYTES,
        };

        let config = Self {
            bind_addr,
            model_path: model_path.into(),
            labels_path: None,
            workers,
            dev_mode,
            allow_degraded: false,
            onnx_config,
            server_config,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn with_labels_path(mut self, labels_path: Option<PathBuf>) -> Self {
        self.labels_path = labels_path;
        self
    }

    pub fn with_allow_degraded(mut self, allow_degraded: bool) -> Self {
        self.allow_degraded = allow_degraded;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.workers == 0 {
            return Err(ClassifierError::Config("workers must be at least 1".to_string()));
        }
        if self.server_config.max_request_size == 0 {
            return Err(ClassifierError::Config(
                "max_request_size must be greater than 0".to_string(),
            ));
        }
        if self.server_config.request_timeout == 0 {
            return Err(ClassifierError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }
        if self.onnx_config.optimization_level > 3 {
            return Err(ClassifierError::Config(format!(
                "optimization_level must be 0-3, got {}",
                self.onnx_config.optimization_level
            )));
        }

        Ok(())
    }

    /// 解析绑定地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            ClassifierError::Config(format!("Invalid bind address {}: {}", self.bind_addr, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_mode() {
        let config = Config::new("127.0.0.1:5000".into(), "models/fabric.onnx", Some(2), false)
            .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.server_config.request_timeout, 60);
        assert_eq!(config.server_config.max_request_size, MAX_IMAGE_BYTES);
        assert!(config.onnx_config.intra_threads >= 1);
        assert!(!config.allow_degraded);
        assert!(config.labels_path.is_none());

        let dev = Config::new("127.0.0.1:5000".into(), "m.onnx", Some(1), true).unwrap();
        assert_eq!(dev.server_config.request_timeout, 300);
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = Config::new("not-an-address".into(), "m.onnx", None, false).unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn rejects_zero_workers() {
        let err = Config::new("0.0.0.0:5000".into(), "m.onnx", Some(0), false).unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn validate_catches_zero_limits() {
        let mut config = Config::new("0.0.0.0:5000".into(), "m.onnx", Some(1), false).unwrap();
        config.server_config.max_request_size = 0;
        assert!(config.validate().is_err());

        config.server_config.max_request_size = 1024;
        config.server_config.request_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_setters() {
        let config = Config::new("0.0.0.0:5000".into(), "m.onnx", Some(1), false)
            .unwrap()
            .with_labels_path(Some(PathBuf::from("labels.txt")))
            .with_allow_degraded(true);
        assert_eq!(config.labels_path, Some(PathBuf::from("labels.txt")));
        assert!(config.allow_degraded);
    }
}
