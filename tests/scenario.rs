// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 三帧合成序列的端到端测试: 空帧 / 画面正中 0.5 / 偏离中心 0.3

use anyhow::Result;
use image::RgbImage;

use drone_tracker::control::{Actuator, CenteringController, SelectionPolicy};
use drone_tracker::detection::Annotator;
use drone_tracker::input::MemorySource;
use drone_tracker::pipeline::{
    run_session, FrameGovernor, ShutdownToken, StopReason, TrackingStage, TrajectoryStage,
};
use drone_tracker::renderer::{Flow, FrameSink};
use drone_tracker::trajectory::{TrajectoryAccumulator, TrajectoryHistory};
use drone_tracker::{Detection, Detector, Point};

const W: u32 = 640;
const H: u32 = 480;

struct ScriptedDetector {
    frames: std::vec::IntoIter<Vec<Detection>>,
    names: Vec<String>,
}

impl ScriptedDetector {
    fn three_frames() -> Self {
        let frames = vec![
            vec![],
            // 中心 (320,240)
            vec![Detection::new(0, 0.5, 300, 220, 340, 260)],
            // 中心 (500,100)
            vec![Detection::new(0, 0.3, 480, 80, 520, 120)],
        ];
        Self {
            frames: frames.into_iter(),
            names: vec!["drone".to_string()],
        }
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Detection>> {
        Ok(self.frames.next().unwrap_or_default())
    }

    fn class_names(&self) -> &[String] {
        &self.names
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Pan(f32),
    Tilt(f32),
}

#[derive(Default)]
struct RecordingActuator {
    calls: Vec<Call>,
}

impl Actuator for RecordingActuator {
    fn move_pan(&mut self, delta: f32) {
        self.calls.push(Call::Pan(delta));
    }

    fn move_tilt(&mut self, delta: f32) {
        self.calls.push(Call::Tilt(delta));
    }
}

#[derive(Default)]
struct CollectSink {
    frames: Vec<RgbImage>,
}

impl FrameSink for CollectSink {
    async fn present(&mut self, _title: &str, frame: &RgbImage) -> Result<Flow> {
        self.frames.push(frame.clone());
        Ok(Flow::Continue)
    }
}

fn source() -> MemorySource {
    MemorySource::new((0..3).map(|_| RgbImage::new(W, H)))
}

#[test]
fn tracker_over_three_frames() {
    let mut stage = TrackingStage::new(
        ScriptedDetector::three_frames(),
        Annotator::new(),
        CenteringController::new(0.1, 0.1, SelectionPolicy::HighestConfidence),
        RecordingActuator::default(),
    );
    let mut sink = CollectSink::default();

    let stats = pollster::block_on(run_session(
        &mut source(),
        &mut stage,
        &mut sink,
        "Drone Tracking",
        &ShutdownToken::new(),
        &mut FrameGovernor::unlimited(),
    ))
    .unwrap();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.reason, StopReason::EndOfStream);

    // 第 1 帧无指令; 第 2 帧零增量; 第 3 帧无置信度门限, 增量非零
    let calls = &stage.actuator().calls;
    assert_eq!(
        calls,
        &vec![
            Call::Pan(0.0),
            Call::Tilt(0.0),
            Call::Pan(18.0),
            Call::Tilt(-14.0),
        ]
    );

    let cmd = stage.last_command().unwrap();
    assert_eq!(cmd.centroid, Point::new(500, 100));
    assert_eq!(cmd.error, (180, -140));

    // 无目标的帧原样显示
    assert_eq!(sink.frames[0], RgbImage::new(W, H));
    assert_ne!(sink.frames[1], RgbImage::new(W, H));
}

#[test]
fn trajectory_over_three_frames() {
    let mut stage = TrajectoryStage::new(
        ScriptedDetector::three_frames(),
        Annotator::new(),
        TrajectoryAccumulator::new(0.4, TrajectoryHistory::unbounded()),
    );
    let mut sink = CollectSink::default();

    pollster::block_on(run_session(
        &mut source(),
        &mut stage,
        &mut sink,
        "Drone Trajectory",
        &ShutdownToken::new(),
        &mut FrameGovernor::unlimited(),
    ))
    .unwrap();

    // 只有第 2 帧的中心进入轨迹
    let points: Vec<Point> = stage.accumulator().history().points().copied().collect();
    assert_eq!(points, vec![Point::new(320, 240)]);
    assert_eq!(sink.frames.len(), 3);
}

#[test]
fn quit_stops_before_source_is_exhausted() {
    struct QuitNow;

    impl FrameSink for QuitNow {
        async fn present(&mut self, _title: &str, _frame: &RgbImage) -> Result<Flow> {
            Ok(Flow::Quit)
        }
    }

    let mut stage = TrajectoryStage::new(
        ScriptedDetector::three_frames(),
        Annotator::new(),
        TrajectoryAccumulator::default(),
    );
    let stats = pollster::block_on(run_session(
        &mut source(),
        &mut stage,
        &mut QuitNow,
        "t",
        &ShutdownToken::new(),
        &mut FrameGovernor::unlimited(),
    ))
    .unwrap();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.reason, StopReason::UserQuit);
}
