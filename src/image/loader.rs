use crate::config::MAX_IMAGE_BYTES;
use crate::utils::error::ClassifierError;
use crate::Result;
use image::{DynamicImage, ImageFormat};

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节流加载图像，使用默认大小上限
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        Self::from_bytes_with_limit(bytes, MAX_IMAGE_BYTES)
    }

    pub fn from_bytes_with_limit(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ClassifierError::MissingInput("Empty file".to_string()));
        }

        // 检查文件大小
        if bytes.len() > max_bytes {
            return Err(ClassifierError::FileTooLarge(bytes.len(), max_bytes));
        }

        let image = image::load_from_memory(bytes)?;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded image"
        );

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }
}
