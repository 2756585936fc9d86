// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 居中跟踪阶段: 检测 → 选目标 → 下发 pan/tilt → 标注

use anyhow::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use super::FrameStage;
use crate::control::{Actuator, CenteringController, ControlCommand};
use crate::detection::{Annotator, Detector, Point};

pub const MARKER_RADIUS: i32 = 8;
pub const CENTER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const TARGET_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

pub struct TrackingStage<D, A> {
    detector: D,
    annotator: Annotator,
    controller: CenteringController,
    actuator: A,
    last_command: Option<ControlCommand>,
}

impl<D: Detector, A: Actuator> TrackingStage<D, A> {
    pub fn new(detector: D, annotator: Annotator, controller: CenteringController, actuator: A) -> Self {
        Self {
            detector,
            annotator,
            controller,
            actuator,
            last_command: None,
        }
    }

    /// 最近一帧的控制输出 (无目标时为 None)
    pub fn last_command(&self) -> Option<&ControlCommand> {
        self.last_command.as_ref()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

fn draw_marker(canvas: &mut RgbImage, p: Point, color: Rgb<u8>) {
    draw_filled_circle_mut(canvas, (p.x, p.y), MARKER_RADIUS, color);
}

impl<D: Detector, A: Actuator> FrameStage for TrackingStage<D, A> {
    fn process(&mut self, frame: RgbImage) -> Result<RgbImage> {
        let detections = self.detector.detect(&frame)?;
        self.last_command = self.controller.update(frame.dimensions(), &detections);

        let Some(cmd) = &self.last_command else {
            return Ok(frame);
        };
        cmd.issue(&mut self.actuator);

        let mut canvas = self
            .annotator
            .plot(&frame, &detections, self.detector.class_names());
        draw_marker(&mut canvas, cmd.frame_center, CENTER_COLOR);
        draw_marker(&mut canvas, cmd.centroid, TARGET_COLOR);
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::SelectionPolicy;
    use crate::Detection;

    struct Fixed(Vec<Detection>);

    impl Detector for Fixed {
        fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
            Ok(self.0.clone())
        }

        fn class_names(&self) -> &[String] {
            &[]
        }
    }

    #[derive(Default)]
    struct Count(usize);

    impl Actuator for Count {
        fn move_pan(&mut self, _delta: f32) {
            self.0 += 1;
        }

        fn move_tilt(&mut self, _delta: f32) {
            self.0 += 1;
        }
    }

    fn stage(dets: Vec<Detection>) -> TrackingStage<Fixed, Count> {
        TrackingStage::new(
            Fixed(dets),
            Annotator::new(),
            CenteringController::new(0.1, 0.1, SelectionPolicy::HighestConfidence),
            Count::default(),
        )
    }

    #[test]
    fn no_target_returns_raw_frame() {
        let mut s = stage(vec![]);
        let frame = RgbImage::from_pixel(64, 48, Rgb([7, 7, 7]));
        let out = s.process(frame.clone()).unwrap();
        assert_eq!(out, frame);
        assert_eq!(s.actuator().0, 0);
        assert!(s.last_command().is_none());
    }

    #[test]
    fn target_draws_both_markers() {
        let mut s = stage(vec![Detection::new(0, 0.9, 40, 30, 60, 40)]);
        let out = s.process(RgbImage::new(64, 48)).unwrap();

        assert_eq!(s.actuator().0, 2);
        // 画面中心 (32,24) 蓝色, 目标中心 (50,35) 绿色
        assert_eq!(*out.get_pixel(32, 24), CENTER_COLOR);
        assert_eq!(*out.get_pixel(50, 35), TARGET_COLOR);
    }
}
