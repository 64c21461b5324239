use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{0}")]
    MissingInput(String),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Request body too large: {0}")]
    BodyTooLarge(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifierError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifierError::MissingInput(_) => StatusCode::BAD_REQUEST,
            ClassifierError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ClassifierError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifierError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifierError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            // 解码失败沿用原服务的行为，作为预测失败返回500
            ClassifierError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClassifierError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifierError::MissingInput(_) => "MISSING_INPUT",
            ClassifierError::Decode(_) => "IMAGE_DECODE_ERROR",
            ClassifierError::Inference(_) => "INFERENCE_ERROR",
            ClassifierError::ModelUnavailable => "MODEL_UNAVAILABLE",
            ClassifierError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ClassifierError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            ClassifierError::BodyTooLarge(_) => "FILE_TOO_LARGE",
            ClassifierError::InvalidRequest(_) => "INVALID_REQUEST",
            ClassifierError::Config(_) => "CONFIG_ERROR",
            ClassifierError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 推理阶段的任何失败统一归为 `Inference`
    pub fn into_inference(self) -> Self {
        match self {
            ClassifierError::Inference(_) => self,
            other => ClassifierError::Inference(other.to_string()),
        }
    }

    /// 响应体: `{"error": ..., "details": ...}`
    fn body(&self) -> (String, Option<String>) {
        match self {
            ClassifierError::MissingInput(msg) => (msg.clone(), None),
            ClassifierError::Decode(e) => ("Prediction failed".to_string(), Some(e.to_string())),
            ClassifierError::Inference(detail) => {
                ("Prediction failed".to_string(), Some(detail.clone()))
            }
            ClassifierError::ModelUnavailable => ("Model not loaded".to_string(), None),
            ClassifierError::FileTooLarge(_, _) | ClassifierError::BodyTooLarge(_) => {
                ("File too large".to_string(), Some(self.to_string()))
            }
            ClassifierError::InvalidRequest(detail) => {
                ("Invalid multipart payload".to_string(), Some(detail.clone()))
            }
            _ => ("Internal server error".to_string(), Some(self.to_string())),
        }
    }
}

impl IntoResponse for ClassifierError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = self.body();

        let mut error_response = serde_json::json!({ "error": error });
        if let Some(details) = details {
            error_response["details"] = serde_json::Value::String(details);
        }

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "Request failed: {} ({})", self, status);
        } else {
            tracing::warn!(code = self.error_code(), "Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
