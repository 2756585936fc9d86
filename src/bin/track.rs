// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 无人机居中跟踪
///
/// 每帧检测 → 选置信度最高的目标 → 计算相对画面中心的偏移 → 输出 pan/tilt 增量
///
/// 运行: cargo run --bin track --release -- -s drone.mp4
use clap::Parser;
use drone_tracker::config::{ModelArgs, SessionArgs};
use drone_tracker::control::{Actuator, LogActuator, SaturatingActuator};
use drone_tracker::detection::Annotator;
use drone_tracker::pipeline::{self, TrackingStage};
use drone_tracker::Model;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WINDOW_TITLE: &str = "Drone Tracking";

#[derive(Parser, Debug)]
#[command(author, version, about = "无人机检测与云台居中控制", long_about = None)]
struct Args {
    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    session: SessionArgs,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = args.session.tracker_config()?;
    config.print_summary();

    let model = args.model.load_model()?;
    model.summary();

    let annotator = match &args.session.font {
        Some(path) => Annotator::with_font(path)?,
        None => Annotator::new(),
    };

    let actuator: Box<dyn Actuator> = match config.max_step_degrees {
        Some(step) => Box::new(SaturatingActuator::new(LogActuator, step)),
        None => Box::new(LogActuator),
    };

    let stage = TrackingStage::new(model, annotator, config.controller(), actuator);
    pipeline::launch(stage, &args.session, WINDOW_TITLE, config.target_fps)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
