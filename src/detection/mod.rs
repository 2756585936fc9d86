// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 检测系统 (Detection System)
///
/// - types:     检测框 / 像素点
/// - annotator: 在帧上绘制检测框与标签
/// - Detector:  单帧 → 检测结果, 逐帧独立
pub mod annotator;
pub mod types;

pub use annotator::Annotator;
pub use types::{Bbox, Detection, Point};

use anyhow::Result;
use image::{DynamicImage, RgbImage};

use crate::models::Model;

/// 检测器接口
///
/// 空结果是正常情况, 不是错误。实现者不能依赖帧之间的内部状态。
pub trait Detector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>>;

    /// 类别名称, 下标即 class_id
    fn class_names(&self) -> &[String];
}

impl<M: Model> Detector for M {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Detection>> {
        let images = [DynamicImage::ImageRgb8(frame.clone())];
        let results = self.forward(&images)?;
        Ok(results
            .into_iter()
            .next()
            .map(|bboxes| bboxes.iter().map(Bbox::to_detection).collect())
            .unwrap_or_default())
    }

    fn class_names(&self) -> &[String] {
        self.names()
    }
}
