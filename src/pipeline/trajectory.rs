// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 轨迹可视化阶段: 检测 → 标注 → 累积中心 → 画折线

use anyhow::Result;
use image::RgbImage;

use super::FrameStage;
use crate::detection::{Annotator, Detector};
use crate::trajectory::TrajectoryAccumulator;

pub struct TrajectoryStage<D> {
    detector: D,
    annotator: Annotator,
    accumulator: TrajectoryAccumulator,
}

impl<D: Detector> TrajectoryStage<D> {
    pub fn new(detector: D, annotator: Annotator, accumulator: TrajectoryAccumulator) -> Self {
        Self {
            detector,
            annotator,
            accumulator,
        }
    }

    pub fn accumulator(&self) -> &TrajectoryAccumulator {
        &self.accumulator
    }
}

impl<D: Detector> FrameStage for TrajectoryStage<D> {
    fn process(&mut self, frame: RgbImage) -> Result<RgbImage> {
        let detections = self.detector.detect(&frame)?;
        let mut canvas = self
            .annotator
            .plot(&frame, &detections, self.detector.class_names());
        self.accumulator.observe(&detections);
        self.accumulator.draw(&mut canvas);
        Ok(canvas)
    }
}
