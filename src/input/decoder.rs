// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// FFmpeg 视频源 (本地文件 / RTSP / 任意 FFmpeg 输入)
///
/// 解码在 FFmpeg 自己的线程中进行, 帧经有界 channel 交给处理循环。
/// Drop 时中止解码任务并等待其退出。
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::core::scheduler::ffmpeg_scheduler::{FfmpegScheduler, Running};
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use image::RgbImage;

use super::decode_filter::DecodeFilter;
use super::VideoSource;
use crate::pipeline::ShutdownToken;

/// 解码队列长度
const QUEUE_DEPTH: usize = 8;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 一次等待的结果
#[derive(Debug)]
pub(crate) enum Polled {
    Frame(RgbImage),
    /// 解码结束且队列已空
    Ended,
    /// 等待期间收到停止信号
    Cancelled,
}

/// 等待下一帧; 每个轮询周期检查一次解码状态与停止信号, 流卡住时也能退出
pub(crate) fn poll_frame(
    rx: &Receiver<RgbImage>,
    shutdown: &ShutdownToken,
    is_ended: impl Fn() -> bool,
) -> Polled {
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(frame) => return Polled::Frame(frame),
            Err(RecvTimeoutError::Disconnected) => return Polled::Ended,
            Err(RecvTimeoutError::Timeout) => {
                if shutdown.is_triggered() {
                    return Polled::Cancelled;
                }
                if is_ended() {
                    // 结束前可能还有已解码的帧
                    return match rx.try_recv() {
                        Ok(frame) => Polled::Frame(frame),
                        Err(_) => Polled::Ended,
                    };
                }
            }
        }
    }
}

pub struct FfmpegSource {
    url: String,
    rx: Receiver<RgbImage>,
    scheduler: Option<FfmpegScheduler<Running>>,
    shutdown: ShutdownToken,
}

impl FfmpegSource {
    /// 打开输入并启动解码; 输入无法打开时立即返回错误
    ///
    /// `shutdown` 触发后, 正在等待的 `next_frame` 在一个轮询周期内返回 `Ok(None)`
    pub fn open(url: &str, shutdown: ShutdownToken) -> Result<Self> {
        log::info!("🎬 打开视频源: {}", url);

        let (tx, rx) = crossbeam_channel::bounded(QUEUE_DEPTH);
        let filter = DecodeFilter::new(tx);

        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("decode", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        let input = if url.starts_with("rtsp://") {
            Input::new(url).set_input_opts(
                [("rtsp_transport", "tcp"), ("rtsp_flags", "prefer_tcp")].into(),
            )
        } else {
            Input::new(url)
        };

        let ctx = FfmpegContext::builder()
            .input(input)
            .filter_descs(["format=rgb24"].into())
            .output(out)
            .build()
            .map_err(|e| anyhow!("无法打开视频源 {}: {}", url, e))?;
        let scheduler = ctx
            .start()
            .map_err(|e| anyhow!("解码启动失败 {}: {}", url, e))?;
        log::info!("✅ 解码启动成功");

        Ok(Self {
            url: url.to_string(),
            rx,
            scheduler: Some(scheduler),
            shutdown,
        })
    }

    /// 流已结束: 回收调度器并报告解码错误
    fn finish(&mut self) -> Result<Option<RgbImage>> {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler
                .wait()
                .map_err(|e| anyhow!("解码失败 {}: {}", self.url, e))?;
        }
        Ok(None)
    }
}

impl VideoSource for FfmpegSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let scheduler = self.scheduler.as_ref();
        match poll_frame(&self.rx, &self.shutdown, || scheduler.map_or(true, |s| s.is_ended())) {
            Polled::Frame(frame) => Ok(Some(frame)),
            Polled::Ended => self.finish(),
            Polled::Cancelled => {
                log::info!("🛑 停止等待视频源: {}", self.url);
                Ok(None)
            }
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // 先断开接收端, 解码线程下一次发送即退出
        self.rx = crossbeam_channel::never();
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.abort();
            let _ = scheduler.wait();
            log::info!("🛑 视频源已关闭: {}", self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn stalled_stream_returns_after_shutdown() {
        // 发送端保持存活但不再产出帧, 模拟卡住的 RTSP 流
        let (_tx, rx) = crossbeam_channel::bounded::<RgbImage>(1);
        let shutdown = ShutdownToken::new();
        let trigger = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            trigger.trigger();
        });

        let start = Instant::now();
        let polled = poll_frame(&rx, &shutdown, || false);
        handle.join().unwrap();

        assert!(matches!(polled, Polled::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn queued_frames_are_drained_before_end() {
        let (tx, rx) = crossbeam_channel::bounded(2);
        tx.send(RgbImage::new(2, 2)).unwrap();
        drop(tx);

        let shutdown = ShutdownToken::new();
        assert!(matches!(poll_frame(&rx, &shutdown, || true), Polled::Frame(_)));
        assert!(matches!(poll_frame(&rx, &shutdown, || true), Polled::Ended));
    }

    #[test]
    fn ended_scheduler_with_live_sender_ends() {
        let (_tx, rx) = crossbeam_channel::bounded::<RgbImage>(1);
        assert!(matches!(
            poll_frame(&rx, &ShutdownToken::new(), || true),
            Polled::Ended
        ));
    }
}
