// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 训练无人机检测模型 (调用 Ultralytics CLI), 可选导出 ONNX 供 track / trajectory 使用
///
/// 运行: cargo run --bin train -- --data drone/data.yaml --export-onnx
use std::path::PathBuf;

use clap::Parser;
use drone_tracker::trainer::{self, render_command, TrainConfig};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(author, version, about = "YOLOv8 无人机检测训练", long_about = None)]
struct Args {
    /// 数据集描述文件
    #[arg(long, default_value = "data.yaml")]
    data: PathBuf,

    /// 预训练权重
    #[arg(short, long, default_value = "yolov8n.pt")]
    model: PathBuf,

    #[arg(long, default_value_t = 100)]
    epochs: u32,

    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    #[arg(long, default_value_t = 16)]
    batch: u32,

    /// 训练设备 (如 0, 0,1, cpu)
    #[arg(long, default_value = "0")]
    device: String,

    /// Ultralytics CLI 可执行文件
    #[arg(long, default_value = "yolo")]
    yolo: String,

    /// 训练完成后导出 ONNX (不带参数时使用默认输出路径)
    #[arg(long, num_args = 0..=1, default_missing_value = "runs/detect/train/weights/best.pt")]
    export_onnx: Option<PathBuf>,

    /// 只打印命令, 不执行
    #[arg(long)]
    dry_run: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = TrainConfig {
        program: args.yolo,
        model: args.model,
        data: args.data,
        epochs: args.epochs,
        imgsz: args.imgsz,
        batch: args.batch,
        device: args.device,
    };
    config.check()?;

    let mut commands = vec![config.train_command()];
    if let Some(weights) = args.export_onnx {
        commands.push(config.export_command(weights));
    }

    if args.dry_run {
        for cmd in &commands {
            println!("{}", render_command(cmd));
        }
        return Ok(());
    }

    log::info!(
        "🏋️ 开始训练: {} epochs, imgsz {}, batch {}, device {}",
        config.epochs,
        config.imgsz,
        config.batch,
        config.device
    );
    for cmd in commands {
        trainer::run(cmd)?;
    }
    log::info!("🎉 训练流程完成");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
