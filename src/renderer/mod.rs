// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 显示输出 (Frame Sink)
///
/// - WindowSink:    macroquad 窗口, 按 q 或关闭窗口退出
/// - DirectorySink: 无窗口模式, 保存编号 PNG 或直接丢弃
pub mod window;

pub use window::{window_conf, WindowSink};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

/// 呈现后循环是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[allow(async_fn_in_trait)]
pub trait FrameSink {
    async fn present(&mut self, title: &str, frame: &RgbImage) -> Result<Flow>;
}

/// 无窗口输出
pub struct DirectorySink {
    dir: Option<PathBuf>,
    count: u64,
}

impl DirectorySink {
    /// 丢弃所有帧
    pub fn discard() -> Self {
        Self { dir: None, count: 0 }
    }

    /// 在 `base` 下创建带时间戳的子目录
    pub fn timestamped(base: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let dir = base
            .as_ref()
            .join(format!("{}_{}", prefix, crate::gen_time_string("")));
        Self::create(dir)
    }

    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;
        log::info!("💾 标注帧输出到: {}", dir.display());
        Ok(Self {
            dir: Some(dir),
            count: 0,
        })
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl FrameSink for DirectorySink {
    async fn present(&mut self, _title: &str, frame: &RgbImage) -> Result<Flow> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("frame_{:06}.png", self.count));
            frame
                .save(&path)
                .with_context(|| format!("保存帧失败: {}", path.display()))?;
        }
        self.count += 1;
        Ok(Flow::Continue)
    }
}
