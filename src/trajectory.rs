// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 轨迹累积 (Trajectory Accumulator)
//!
//! 每帧把置信度严格大于阈值的所有检测中心追加到历史中, 不区分目标身份;
//! 渲染时把相邻历史点两两连线, 每帧重绘整条折线。
//! 历史长度有上限, 满了以后丢弃最旧的点 (上限为 0 表示不限)。

use std::collections::VecDeque;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::detection::{Detection, Point};

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.4;
pub const DEFAULT_MAX_POINTS: usize = 4096;

const LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 有界的追加式中心点历史
#[derive(Debug, Clone, Default)]
pub struct TrajectoryHistory {
    points: VecDeque<Point>,
    max_points: Option<usize>,
}

impl TrajectoryHistory {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `max_points == 0` 视为不限
    pub fn bounded(max_points: usize) -> Self {
        Self {
            points: VecDeque::new(),
            max_points: (max_points > 0).then_some(max_points),
        }
    }

    pub fn push(&mut self, p: Point) {
        if let Some(max) = self.max_points {
            while self.points.len() >= max {
                self.points.pop_front();
            }
        }
        self.points.push_back(p);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// 时间上相邻的点对
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| (*a, *b))
    }
}

#[derive(Debug, Clone)]
pub struct TrajectoryAccumulator {
    conf_threshold: f32,
    history: TrajectoryHistory,
}

impl TrajectoryAccumulator {
    pub fn new(conf_threshold: f32, history: TrajectoryHistory) -> Self {
        Self {
            conf_threshold,
            history,
        }
    }

    /// 处理一帧的全部检测, 返回本帧追加的点数; 每个检测输出一行日志
    pub fn observe(&mut self, detections: &[Detection]) -> usize {
        let mut appended = 0;
        for det in detections {
            log::info!("{}", det);
            if det.confidence > self.conf_threshold {
                self.history.push(det.centroid());
                appended += 1;
            }
        }
        appended
    }

    pub fn history(&self) -> &TrajectoryHistory {
        &self.history
    }

    /// 在帧上绘制整条折线 (2 像素宽)
    pub fn draw(&self, canvas: &mut RgbImage) {
        for (a, b) in self.history.segments() {
            for (dx, dy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32 + dx, a.y as f32 + dy),
                    (b.x as f32 + dx, b.y as f32 + dy),
                    LINE_COLOR,
                );
            }
        }
    }
}

impl Default for TrajectoryAccumulator {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONF_THRESHOLD,
            TrajectoryHistory::bounded(DEFAULT_MAX_POINTS),
        )
    }
}
