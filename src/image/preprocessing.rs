use crate::config::{INPUT_CHANNELS, INPUT_SIZE};
use crate::image::ImageLoader;
use crate::utils::error::ClassifierError;
use crate::Result;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::{Array4, ArrayView4};

/// 模型输入张量，形状固定为 (1, H, W, 3)，取值范围 [0.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn into_inner(self) -> Array4<f32> {
        self.0
    }

    /// 全零张量，用于启动时的模型探测
    pub fn zeros(size: u32) -> Self {
        let side = size as usize;
        Self(Array4::zeros((1, side, side, INPUT_CHANNELS)))
    }
}

/// 图像预处理器: 解码 -> RGB -> 拉伸缩放 -> 归一化 -> 增加batch维度
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    size: u32,
    filter: FilterType,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            size: INPUT_SIZE,
            // 与训练时的默认重采样方式（双三次）保持一致
            filter: FilterType::CatmullRom,
        }
    }
}

impl ImagePreprocessor {
    /// 从原始字节生成模型输入
    pub fn preprocess(&self, bytes: &[u8]) -> Result<NormalizedTensor> {
        let image = ImageLoader::from_bytes(bytes)?;
        self.preprocess_image(&image)
    }

    pub fn preprocess_image(&self, image: &DynamicImage) -> Result<NormalizedTensor> {
        // 任意颜色模式统一转为8位RGB，alpha通道直接丢弃
        let rgb = image.to_rgb8();

        // 直接拉伸到目标尺寸，不保持宽高比（模型按此方式训练）
        let resized = imageops::resize(&rgb, self.size, self.size, self.filter);

        let side = self.size as usize;
        let data: Vec<f32> = resized
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 255.0)
            .collect();

        let array = Array4::from_shape_vec((1, side, side, INPUT_CHANNELS), data).map_err(|e| {
            ClassifierError::Internal(format!("Failed to build input tensor: {}", e))
        })?;

        Ok(NormalizedTensor(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn jpeg_300x200_yields_model_shape() {
        let bytes = encode(gradient_rgb(300, 200), ImageFormat::Jpeg);
        let tensor = ImagePreprocessor::default().preprocess(&bytes).unwrap();

        assert_eq!(tensor.shape(), &[1, 256, 256, 3]);
        assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn grayscale_png_is_expanded_to_rgb() {
        let gray = GrayImage::from_pixel(40, 60, Luma([200u8]));
        let bytes = encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png);
        let tensor = ImagePreprocessor::default().preprocess(&bytes).unwrap();

        assert_eq!(tensor.shape(), &[1, 256, 256, 3]);
        let view = tensor.view();
        let expected = 200.0 / 255.0;
        for c in 0..3 {
            assert!((view[[0, 128, 128, c]] - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn alpha_channel_is_dropped() {
        let rgba = RgbaImage::from_pixel(16, 16, Rgba([255u8, 0, 0, 0]));
        let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let tensor = ImagePreprocessor::default().preprocess(&bytes).unwrap();

        let view = tensor.view();
        assert_eq!(view.shape()[3], 3);
        assert!((view[[0, 0, 0, 0]] - 1.0).abs() < 1e-3);
        assert!(view[[0, 0, 0, 1]].abs() < 1e-3);
    }

    #[test]
    fn resize_stretches_instead_of_letterboxing() {
        // 宽幅纯绿图像: 若按比例缩放加边框，上下边缘会出现填充色
        let wide = ImageBuffer::from_pixel(300, 50, Rgb([0u8, 255, 0]));
        let tensor = ImagePreprocessor::default()
            .preprocess_image(&DynamicImage::ImageRgb8(wide))
            .unwrap();

        let view = tensor.view();
        for &(y, x) in &[(0, 0), (0, 255), (255, 0), (255, 255), (128, 128)] {
            assert!(view[[0, y, x, 0]].abs() < 1e-3);
            assert!((view[[0, y, x, 1]] - 1.0).abs() < 1e-3);
            assert!(view[[0, y, x, 2]].abs() < 1e-3);
        }
    }

    #[test]
    fn stretched_halves_keep_their_side() {
        let img = ImageBuffer::from_fn(300, 200, |x, _| {
            if x < 150 {
                Rgb([255u8, 0, 0])
            } else {
                Rgb([0u8, 0, 255])
            }
        });
        let tensor = ImagePreprocessor::default()
            .preprocess_image(&DynamicImage::ImageRgb8(img))
            .unwrap();

        let view = tensor.view();
        assert!(view[[0, 100, 10, 0]] > 0.99);
        assert!(view[[0, 100, 245, 2]] > 0.99);
    }

    #[test]
    fn same_bytes_same_tensor() {
        let bytes = encode(gradient_rgb(123, 77), ImageFormat::Png);
        let preprocessor = ImagePreprocessor::default();
        let a = preprocessor.preprocess(&bytes).unwrap();
        let b = preprocessor.preprocess(&bytes).unwrap();

        let bits_a: Vec<u32> = a.view().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u32> = b.view().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn undecodable_bytes_fail() {
        let err = ImagePreprocessor::default()
            .preprocess(b"GIF89a-but-not-really")
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Decode(_)));
    }

    #[test]
    fn zeros_has_model_shape() {
        let tensor = NormalizedTensor::zeros(INPUT_SIZE);
        assert_eq!(tensor.shape(), &[1, 256, 256, 3]);
        assert!(tensor.view().iter().all(|v| *v == 0.0));
    }
}
