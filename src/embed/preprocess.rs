use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::config::EmbedOptions;
use crate::error::{Result, SearchError};

/// 特征提取前的图片预处理：缩放到固定尺寸，可选增强
#[derive(Debug, Clone)]
pub struct Preprocessor {
    /// 输出图片边长
    pub size: u32,
    /// 是否进行对比度拉伸和去噪
    pub enhance: bool,
}

impl From<&EmbedOptions> for Preprocessor {
    fn from(opts: &EmbedOptions) -> Self {
        Self { size: opts.thumbnail_size, enhance: opts.enhance }
    }
}

impl Preprocessor {
    pub fn decode(&self, data: &[u8]) -> Result<RgbImage> {
        let img = image::load_from_memory(data)
            .map_err(|e| SearchError::EmbeddingFailed(format!("图片解码失败: {}", e)))?;
        Ok(self.process(img))
    }

    pub fn process(&self, img: DynamicImage) -> RgbImage {
        let mut img = img.resize_exact(self.size, self.size, FilterType::Triangle).to_rgb8();
        if self.enhance {
            stretch_contrast(&mut img);
            img = imageops::blur(&img, 0.5);
        }
        img
    }
}

/// 按通道将像素值线性拉伸到 0 ~ 255
fn stretch_contrast(img: &mut RgbImage) {
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in img.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }
    for px in img.pixels_mut() {
        for c in 0..3 {
            // 单一颜色的通道保持不变
            if hi[c] > lo[c] {
                let v = (px[c] - lo[c]) as u32 * 255 / (hi[c] - lo[c]) as u32;
                px[c] = v as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_resize() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let pre = Preprocessor { size: 8, enhance: false };
        let out = pre.process(img);
        assert_eq!(out.dimensions(), (8, 8));
    }

    #[test]
    fn test_stretch_contrast() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([100, 50, 7]));
        img.put_pixel(1, 0, Rgb([150, 50, 9]));
        stretch_contrast(&mut img);
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 50, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([255, 50, 255]));
    }

    #[test]
    fn test_decode_garbage() {
        let pre = Preprocessor { size: 8, enhance: true };
        let err = pre.decode(b"not an image").unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingFailed(_)));
    }
}
