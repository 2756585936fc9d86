// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 无人机轨迹可视化
///
/// 每帧检测并标注, 把置信度 > 阈值的检测中心累积成轨迹, 在标注帧上画出整条折线
///
/// 运行: cargo run --bin trajectory --release -- -s drone.mp4
use clap::Parser;
use drone_tracker::config::{ModelArgs, SessionArgs};
use drone_tracker::detection::Annotator;
use drone_tracker::pipeline::{self, TrajectoryStage};
use drone_tracker::Model;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WINDOW_TITLE: &str = "Drone Trajectory";

#[derive(Parser, Debug)]
#[command(author, version, about = "无人机轨迹可视化", long_about = None)]
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

    let stage = TrajectoryStage::new(model, annotator, config.accumulator());
    pipeline::launch(stage, &args.session, WINDOW_TITLE, config.target_fps)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
