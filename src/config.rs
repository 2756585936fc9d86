// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 命令行参数 (各个可执行文件共用)

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::{OrtConfig, OrtEP, TrackerConfig, YOLOv8};

/// 检测模型参数
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// ONNX模型路径 (Ultralytics 导出的 best.onnx)
    #[arg(short, long, default_value = "runs/detect/train/weights/best.onnx")]
    pub model: String,

    /// 输入尺寸 (模型元数据缺少 imgsz 时使用)
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// 检测置信度阈值
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IOU阈值
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// 使用 CUDA
    #[arg(long)]
    pub cuda: bool,

    /// 使用 TensorRT
    #[arg(long)]
    pub trt: bool,

    /// TensorRT 半精度
    #[arg(long)]
    pub fp16: bool,

    /// GPU 设备号
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// 打印推理耗时
    #[arg(long)]
    pub profile: bool,
}

impl ModelArgs {
    pub fn ort_config(&self) -> OrtConfig {
        let ep = if self.trt {
            OrtEP::Trt(self.device_id)
        } else if self.cuda {
            OrtEP::CUDA(self.device_id)
        } else {
            OrtEP::CPU
        };
        OrtConfig {
            f: self.model.clone(),
            ep,
            trt_fp16: self.fp16,
            image_size: (self.imgsz, self.imgsz),
        }
    }

    pub fn load_model(&self) -> Result<YOLOv8> {
        YOLOv8::new(self.ort_config(), self.conf, self.iou, self.profile)
    }
}

/// 推理会话参数 (track / trajectory 共用)
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// 视频源: 文件路径、RTSP地址, 或图片目录
    #[arg(short, long)]
    pub source: String,

    /// 跟踪参数 JSON 文件 (不存在时自动创建)
    #[arg(long, default_value = "tracker_config.json")]
    pub config: PathBuf,

    /// 标签字体 (ttf/otf), 不提供则只画框
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 无窗口模式
    #[arg(long)]
    pub headless: bool,

    /// 无窗口模式下保存标注帧的目录 (自动追加时间戳子目录)
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
}

impl SessionArgs {
    pub fn tracker_config(&self) -> Result<TrackerConfig> {
        TrackerConfig::load(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        model: ModelArgs,
    }

    #[test]
    fn execution_provider_precedence() {
        let cli = Cli::parse_from(["test", "--cuda", "--device-id", "1"]);
        assert_eq!(cli.model.ort_config().ep, OrtEP::CUDA(1));

        let cli = Cli::parse_from(["test", "--cuda", "--trt"]);
        assert_eq!(cli.model.ort_config().ep, OrtEP::Trt(0));

        let cli = Cli::parse_from(["test"]);
        let cfg = cli.model.ort_config();
        assert_eq!(cfg.ep, OrtEP::CPU);
        assert_eq!(cfg.image_size, (640, 640));
    }
}
