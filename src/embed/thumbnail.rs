use super::{Embedder, Preprocessor};
use crate::config::EmbedOptions;
use crate::error::{Result, SearchError};
use crate::metric::normalize_l2;

/// 以缩略图像素作为特征的简单实现
///
/// 图片经过预处理后缩放为 `size × size` 的 RGB 图，展开为 `3·size²` 维向量并进行 L2 归一化。
/// 纯黑图片的范数为 0，视为提取失败。
#[derive(Debug, Clone)]
pub struct ThumbnailEmbedder {
    preprocessor: Preprocessor,
}

impl From<&EmbedOptions> for ThumbnailEmbedder {
    fn from(opts: &EmbedOptions) -> Self {
        Self { preprocessor: Preprocessor::from(opts) }
    }
}

impl ThumbnailEmbedder {
    pub fn new(preprocessor: Preprocessor) -> Self {
        Self { preprocessor }
    }
}

impl Embedder for ThumbnailEmbedder {
    fn dim(&self) -> usize {
        let size = self.preprocessor.size as usize;
        3 * size * size
    }

    fn embed(&self, image: &[u8]) -> Result<Vec<f32>> {
        let img = self.preprocessor.decode(image)?;
        let mut v = img.as_raw().iter().map(|&x| x as f32 / 255.0).collect::<Vec<_>>();
        if normalize_l2(&mut v) == 0.0 {
            return Err(SearchError::EmbeddingFailed("图片特征向量范数为 0".to_string()));
        }
        Ok(v)
    }
}
