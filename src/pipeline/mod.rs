// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 逐帧处理循环 (Frame Processing Loop)
///
/// 视频源 → 处理阶段 (检测/控制/标注 或 检测/轨迹) → 显示输出
///
/// 循环在以下任一情况结束:
/// - 视频源结束
/// - 显示端请求退出 (q / 关闭窗口)
/// - Ctrl+C
pub mod tracking;
pub mod trajectory;

pub use tracking::TrackingStage;
pub use trajectory::TrajectoryStage;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbImage;

use crate::config::SessionArgs;
use crate::input::{open_source, VideoSource};
use crate::renderer::{window_conf, DirectorySink, Flow, FrameSink, WindowSink};

/// 单帧处理: 输入原始帧, 输出要显示的帧
pub trait FrameStage {
    fn process(&mut self, frame: RgbImage) -> Result<RgbImage>;
}

/// 跨线程的停止标志
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 Ctrl+C 处理函数
    pub fn install_ctrlc() -> Result<Self> {
        let token = Self::new();
        let handle = token.clone();
        ctrlc::set_handler(move || {
            log::warn!("🛑 收到 Ctrl+C, 正在退出...");
            handle.trigger();
        })?;
        Ok(token)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 可选帧率限制, 用于回放文件时按原速播放
#[derive(Debug)]
pub struct FrameGovernor {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FrameGovernor {
    pub fn new(target_fps: Option<f64>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f64(1.0 / fps).ok());
        Self {
            interval,
            last: None,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// 距离上一帧不足一个周期时阻塞等待
    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    UserQuit,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub frames: u64,
    pub reason: StopReason,
    pub elapsed: Duration,
}

impl SessionStats {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// 运行处理循环直到结束; 任一阶段出错立即返回
pub async fn run_session<V, P, S>(
    source: &mut V,
    stage: &mut P,
    sink: &mut S,
    title: &str,
    shutdown: &ShutdownToken,
    governor: &mut FrameGovernor,
) -> Result<SessionStats>
where
    V: VideoSource + ?Sized,
    P: FrameStage + ?Sized,
    S: FrameSink + ?Sized,
{
    let start = Instant::now();
    let mut frames = 0u64;

    let reason = loop {
        if shutdown.is_triggered() {
            break StopReason::Shutdown;
        }
        let Some(frame) = source.next_frame()? else {
            // 视频源可能因停止信号提前返回
            break if shutdown.is_triggered() {
                StopReason::Shutdown
            } else {
                StopReason::EndOfStream
            };
        };

        let shown = stage.process(frame)?;
        frames += 1;

        if sink.present(title, &shown).await? == Flow::Quit {
            break StopReason::UserQuit;
        }
        governor.wait();
    };

    let stats = SessionStats {
        frames,
        reason,
        elapsed: start.elapsed(),
    };
    log::info!(
        "📊 共处理 {} 帧, 平均 {:.1} FPS, 结束原因: {:?}",
        stats.frames,
        stats.fps(),
        stats.reason
    );
    Ok(stats)
}

/// 打开视频源并运行完整会话: 有窗口时交给 macroquad 事件循环, 否则在当前线程阻塞运行
pub fn launch<P>(stage: P, session: &SessionArgs, title: &str, target_fps: Option<f64>) -> Result<()>
where
    P: FrameStage + 'static,
{
    let shutdown = ShutdownToken::install_ctrlc()?;
    let governor = FrameGovernor::new(target_fps);
    let source = open_source(&session.source, &shutdown)?;

    if session.headless {
        let sink = match &session.save_dir {
            Some(dir) => {
                let prefix = title.split_whitespace().collect::<Vec<_>>().join("_");
                DirectorySink::timestamped(dir, &prefix.to_lowercase())?
            }
            None => DirectorySink::discard(),
        };
        return pollster::block_on(drive(source, stage, sink, title.to_string(), shutdown, governor));
    }

    let title = title.to_string();
    macroquad::Window::from_config(window_conf(&title), async move {
        let sink = WindowSink::new();
        if let Err(e) = drive(source, stage, sink, title, shutdown, governor).await {
            log::error!("❌ {:#}", e);
            std::process::exit(1);
        }
    });
    Ok(())
}

/// 会话结束后按作用域释放视频源与输出
async fn drive<V, P, S>(
    mut source: V,
    mut stage: P,
    mut sink: S,
    title: String,
    shutdown: ShutdownToken,
    mut governor: FrameGovernor,
) -> Result<()>
where
    V: VideoSource,
    P: FrameStage,
    S: FrameSink,
{
    run_session(&mut source, &mut stage, &mut sink, &title, &shutdown, &mut governor).await?;
    Ok(())
}
