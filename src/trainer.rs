// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 训练: 调用 Ultralytics CLI (`yolo`) 完成训练与 ONNX 导出

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// `yolo detect train` 参数
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub program: String,
    pub model: PathBuf,
    pub data: PathBuf,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub device: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            program: "yolo".to_string(),
            model: PathBuf::from("yolov8n.pt"),
            data: PathBuf::from("data.yaml"),
            epochs: 100,
            imgsz: 640,
            batch: 16,
            device: "0".to_string(),
        }
    }
}

fn kv(key: &str, value: impl Into<OsString>) -> OsString {
    let mut arg = OsString::from(format!("{}=", key));
    arg.push(value.into());
    arg
}

impl TrainConfig {
    pub fn train_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["detect", "train"])
            .arg(kv("data", &self.data))
            .arg(kv("model", &self.model))
            .arg(kv("epochs", self.epochs.to_string()))
            .arg(kv("imgsz", self.imgsz.to_string()))
            .arg(kv("batch", self.batch.to_string()))
            .arg(kv("device", &self.device));
        cmd
    }

    /// 把训练得到的 .pt 导出为 ONNX, 输入尺寸与训练一致
    pub fn export_command(&self, weights: impl Into<OsString>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("export")
            .arg(kv("model", weights))
            .arg("format=onnx")
            .arg(kv("imgsz", self.imgsz.to_string()));
        cmd
    }

    pub fn check(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs 必须大于 0");
        }
        if self.imgsz == 0 || self.imgsz % 32 != 0 {
            bail!("imgsz 必须是 32 的正整数倍: {}", self.imgsz);
        }
        if self.batch == 0 {
            bail!("batch 必须大于 0");
        }
        Ok(())
    }
}

/// 命令行字符串 (用于日志与 --dry-run)
pub fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 阻塞执行直到命令结束, 非零退出码视为失败
pub fn run(mut cmd: Command) -> Result<()> {
    let line = render_command(&cmd);
    log::info!("🚀 执行: {}", line);
    let status = cmd
        .status()
        .with_context(|| format!("无法启动 `{}`, 请确认已安装 ultralytics", line))?;
    if !status.success() {
        bail!("命令执行失败 ({}): {}", status, line);
    }
    log::info!("✅ 完成: {}", line);
    Ok(())
}
