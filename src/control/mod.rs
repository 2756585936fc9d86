// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 云台居中控制 (Centering Controller)
///
/// 每帧: 选定目标 → 计算框中心 → 相对画面中心的像素误差 → 乘以增益得到 pan/tilt 增量
///
/// - 误差方向: +x 目标在中心右侧, +y 目标在中心下方
/// - 无检测的帧不输出指令, 执行器保持原状态
pub mod actuator;

pub use actuator::{Actuator, LogActuator, SaturatingActuator};

use serde::{Deserialize, Serialize};

use crate::detection::{Detection, Point};

/// 目标选择策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// 每帧取置信度最高者 (同分取检测器顺序中的第一个)
    #[default]
    HighestConfidence,
    /// 优先取与上一帧目标 IoU 最大且 >= min_iou 的检测, 否则退回最高置信度
    StickyIou { min_iou: f32 },
}

/// 置信度最高的检测, 同分时保留先出现的
pub fn select_highest_confidence(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().fold(None, |best: Option<&Detection>, d| match best {
        Some(b) if d.confidence <= b.confidence => Some(b),
        _ => Some(d),
    })
}

/// pan/tilt 增量 (度)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ControlDelta {
    pub pan: f32,
    pub tilt: f32,
}

/// 单帧控制输出
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlCommand {
    pub target: Detection,
    pub centroid: Point,
    pub frame_center: Point,
    /// centroid - frame_center
    pub error: (i32, i32),
    pub delta: ControlDelta,
}

impl ControlCommand {
    /// 两次独立调用
    pub fn issue<A: Actuator + ?Sized>(&self, actuator: &mut A) {
        actuator.move_pan(self.delta.pan);
        actuator.move_tilt(self.delta.tilt);
    }
}

#[derive(Debug, Clone)]
pub struct CenteringController {
    pan_gain: f32,
    tilt_gain: f32,
    policy: SelectionPolicy,
    frame_center: Option<Point>,
    last_target: Option<Detection>,
}

impl CenteringController {
    pub fn new(pan_gain: f32, tilt_gain: f32, policy: SelectionPolicy) -> Self {
        Self {
            pan_gain,
            tilt_gain,
            policy,
            frame_center: None,
            last_target: None,
        }
    }

    /// 画面中心, 首次调用时锁定整个会话的画面尺寸
    pub fn frame_center(&mut self, width: u32, height: u32) -> Point {
        *self
            .frame_center
            .get_or_insert_with(|| Point::new((width / 2) as i32, (height / 2) as i32))
    }

    fn select<'a>(&self, detections: &'a [Detection]) -> Option<&'a Detection> {
        if let (SelectionPolicy::StickyIou { min_iou }, Some(last)) = (self.policy, &self.last_target) {
            let sticky = detections
                .iter()
                .map(|d| (d, d.iou(last)))
                .filter(|(_, iou)| *iou >= min_iou)
                .fold(None, |best: Option<(&Detection, f32)>, cur| match best {
                    Some(b) if cur.1 <= b.1 => Some(b),
                    _ => Some(cur),
                });
            if let Some((d, _)) = sticky {
                return Some(d);
            }
        }
        select_highest_confidence(detections)
    }

    /// 计算本帧控制输出; 无检测返回 None 并丢弃已锁定的目标
    pub fn update(&mut self, frame_size: (u32, u32), detections: &[Detection]) -> Option<ControlCommand> {
        let center = self.frame_center(frame_size.0, frame_size.1);
        let Some(target) = self.select(detections).copied() else {
            self.last_target = None;
            return None;
        };
        self.last_target = Some(target);

        let centroid = target.centroid();
        let error = (centroid.x - center.x, centroid.y - center.y);
        Some(ControlCommand {
            target,
            centroid,
            frame_center: center,
            error,
            delta: ControlDelta {
                pan: self.pan_gain * error.0 as f32,
                tilt: self.tilt_gain * error.1 as f32,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(conf: f32, cx: i32, cy: i32) -> Detection {
        Detection::new(0, conf, cx - 10, cy - 10, cx + 10, cy + 10)
    }

    #[test]
    fn highest_confidence_wins() {
        let dets = [det(0.3, 10, 10), det(0.8, 100, 100), det(0.5, 200, 200)];
        let chosen = select_highest_confidence(&dets).unwrap();
        assert_eq!(chosen.confidence, 0.8);
        assert!(dets.iter().all(|d| chosen.confidence >= d.confidence));
    }

    #[test]
    fn tie_keeps_first_in_detector_order() {
        let dets = [det(0.6, 10, 10), det(0.6, 300, 300)];
        assert_eq!(select_highest_confidence(&dets).unwrap().centroid(), Point::new(10, 10));
    }

    #[test]
    fn default_policy_is_highest_confidence() {
        assert_eq!(SelectionPolicy::default(), SelectionPolicy::HighestConfidence);
        let json = serde_json::to_string(&SelectionPolicy::default()).unwrap();
        assert_eq!(json, r#"{"kind":"highest_confidence"}"#);
    }

    #[test]
    fn empty_frame_yields_no_command() {
        let mut c = CenteringController::new(0.1, 0.1, SelectionPolicy::HighestConfidence);
        assert!(c.update((640, 480), &[]).is_none());
    }

    #[test]
    fn delta_is_gain_times_offset() {
        let mut c = CenteringController::new(0.1, 0.1, SelectionPolicy::HighestConfidence);
        let cmd = c.update((640, 480), &[det(0.9, 420, 240)]).unwrap();

        assert_eq!(cmd.frame_center, Point::new(320, 240));
        assert_eq!(cmd.error, (100, 0));
        assert!((cmd.delta.pan - 10.0).abs() < 1e-5);
        assert_eq!(cmd.delta.tilt, 0.0);
    }

    #[test]
    fn target_above_left_gives_negative_deltas() {
        let mut c = CenteringController::new(0.1, 0.2, SelectionPolicy::HighestConfidence);
        let cmd = c.update((640, 480), &[det(0.9, 300, 140)]).unwrap();
        assert_eq!(cmd.error, (-20, -100));
        assert!((cmd.delta.pan + 2.0).abs() < 1e-5);
        assert!((cmd.delta.tilt + 20.0).abs() < 1e-5);
    }

    #[test]
    fn frame_size_is_latched_from_first_frame() {
        let mut c = CenteringController::new(0.1, 0.1, SelectionPolicy::HighestConfidence);
        c.update((640, 480), &[]);
        let cmd = c.update((1920, 1080), &[det(0.9, 320, 240)]).unwrap();
        assert_eq!(cmd.error, (0, 0));
    }

    #[test]
    fn sticky_policy_follows_previous_target() {
        let mut c = CenteringController::new(0.1, 0.1, SelectionPolicy::StickyIou { min_iou: 0.3 });
        let first = c.update((640, 480), &[det(0.9, 100, 100)]).unwrap();
        assert_eq!(first.centroid, Point::new(100, 100));

        // 另一个目标置信度更高, 但仍跟随与上一帧重叠的目标
        let next = c
            .update((640, 480), &[det(0.95, 500, 400), det(0.4, 102, 101)])
            .unwrap();
        assert_eq!(next.centroid, Point::new(102, 101));
    }

    #[test]
    fn sticky_policy_falls_back_after_loss() {
        let mut c = CenteringController::new(0.1, 0.1, SelectionPolicy::StickyIou { min_iou: 0.3 });
        c.update((640, 480), &[det(0.9, 100, 100)]);
        c.update((640, 480), &[]);
        let cmd = c
            .update((640, 480), &[det(0.4, 102, 101), det(0.95, 500, 400)])
            .unwrap();
        assert_eq!(cmd.centroid, Point::new(500, 400));
    }
}
