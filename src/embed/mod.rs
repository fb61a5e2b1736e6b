//! 图片特征提取
//!
//! 检索引擎只依赖 [`Embedder`] trait：输入图片的原始字节，输出固定长度、已经 L2 归一化的向量。

mod preprocess;
mod thumbnail;

pub use preprocess::*;
pub use thumbnail::*;

use crate::error::Result;

pub trait Embedder: Send + Sync {
    /// 输出向量的维度
    fn dim(&self) -> usize;

    /// 提取一张图片的特征向量，失败时返回 `SearchError::EmbeddingFailed`
    fn embed(&self, image: &[u8]) -> Result<Vec<f32>>;
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn embed(&self, image: &[u8]) -> Result<Vec<f32>> {
        (**self).embed(image)
    }
}
