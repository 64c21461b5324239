use crate::prediction::RawImage;
use crate::utils::error::ClassifierError;
use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, FromRequestParts, Multipart, Request},
    http::{request::Parts, StatusCode},
};
use std::convert::Infallible;

/// 上传图像的表单字段名
pub const FILE_FIELD: &str = "file";

/// multipart上传提取器: 要么得到非空的 `RawImage`，要么得到类型化错误
pub struct ImageUpload(pub RawImage);

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ClassifierError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // 非multipart请求等同于没有上传文件
        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Request is not multipart: {}", e);
            no_file()
        })?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or("unknown").to_string();
            if field_name != FILE_FIELD {
                tracing::debug!("Ignoring unknown field: {}", field_name);
                continue;
            }

            // 没有filename参数的普通表单字段不算上传文件
            let Some(filename) = field.file_name().map(str::to_string) else {
                tracing::debug!("Ignoring `{}` field without filename", FILE_FIELD);
                continue;
            };
            if filename.is_empty() {
                return Err(ClassifierError::MissingInput("Empty filename".to_string()));
            }
            let content_type = field.content_type().map(str::to_string);

            let data = field.bytes().await.map_err(multipart_error)?;

            let mut image = RawImage::new(data)?.with_filename(filename);
            if let Some(content_type) = content_type {
                image = image.with_content_type(content_type);
            }

            return Ok(ImageUpload(image));
        }

        Err(no_file())
    }
}

fn no_file() -> ClassifierError {
    ClassifierError::MissingInput("No file provided".to_string())
}

fn multipart_error(e: MultipartError) -> ClassifierError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ClassifierError::BodyTooLarge(e.body_text())
    } else {
        ClassifierError::InvalidRequest(e.body_text())
    }
}

/// 请求ID提取器（由日志中间件写入请求头）
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get(super::middleware::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}
