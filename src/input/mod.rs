// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 视频输入系统 (Video Input System)
///
/// - FfmpegSource:        本地文件 / RTSP 流 (ez-ffmpeg 解码)
/// - ImageSequenceSource: 图片目录
/// - MemorySource:        内存帧序列 (测试与回放)
///
/// 所有视频源按帧顺序拉取, `Ok(None)` 表示流结束。
pub mod decode_filter;
pub mod decoder;
pub mod images;

pub use decoder::FfmpegSource;
pub use images::ImageSequenceSource;

use std::collections::VecDeque;
use std::path::Path;

use anyhow::Result;
use image::RgbImage;

use crate::pipeline::ShutdownToken;

pub trait VideoSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

impl<S: VideoSource + ?Sized> VideoSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }
}

/// 目录 → 图片序列, 其余交给 FFmpeg
pub fn open_source(source: &str, shutdown: &ShutdownToken) -> Result<Box<dyn VideoSource>> {
    if Path::new(source).is_dir() {
        Ok(Box::new(ImageSequenceSource::open(source)?))
    } else {
        Ok(Box::new(FfmpegSource::open(source, shutdown.clone())?))
    }
}

#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl VideoSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}
