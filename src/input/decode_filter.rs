// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// FFmpeg解码过滤器: 视频流 → RGB帧 → channel
///
/// 滤镜链已经把像素格式转成 rgb24, 这里只做逐行拷贝 (跳过 linesize 填充)。
use crossbeam_channel::Sender;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use image::RgbImage;

const MAX_DIM: u32 = 8192;

pub struct DecodeFilter {
    tx: Option<Sender<RgbImage>>,
    pub total_frames: usize,
    pub dropped_frames: usize,
}

impl DecodeFilter {
    pub fn new(tx: Sender<RgbImage>) -> Self {
        Self {
            tx: Some(tx),
            total_frames: 0,
            dropped_frames: 0,
        }
    }

    fn drop_frame(&mut self, reason: &str) {
        self.dropped_frames += 1;
        if self.dropped_frames <= 10 {
            log::warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
        }
    }
}

/// 打包的 rgb24 平面 → RgbImage
///
/// # Safety
/// `data` 至少有 `stride * height` 字节可读, 且 `stride >= width * 3`
pub(crate) unsafe fn copy_rgb24(data: *const u8, stride: usize, width: u32, height: u32) -> RgbImage {
    let row = width as usize * 3;
    let mut buf = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let src = std::slice::from_raw_parts(data.add(y * stride), row);
        buf.extend_from_slice(src);
    }
    RgbImage::from_raw(width, height, buf).unwrap_or_else(|| RgbImage::new(width, height))
}

impl FrameFilter for DecodeFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        log::info!("✅ 解码线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        let Some(tx) = self.tx.as_ref() else {
            return Err("decoder closed".to_string());
        };

        unsafe {
            self.total_frames += 1;

            // 基本检查：空帧或损坏帧
            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.drop_frame("空帧/损坏帧");
                return Ok(None);
            }

            let w = (*frame.as_ptr()).width as u32;
            let h = (*frame.as_ptr()).height as u32;
            if w == 0 || h == 0 || w > MAX_DIM || h > MAX_DIM {
                self.drop_frame(&format!("非法分辨率 {}x{}", w, h));
                return Ok(None);
            }

            let data = (*frame.as_ptr()).data[0];
            let stride = (*frame.as_ptr()).linesize[0];
            if data.is_null() || stride < 0 || (stride as usize) < w as usize * 3 {
                self.drop_frame(&format!("步长异常 linesize={}", stride));
                return Ok(None);
            }

            let image = copy_rgb24(data, stride as usize, w, h);

            // 阻塞发送: 逐帧拉取, 不丢帧; 接收端已释放则结束解码
            if tx.send(image).is_err() {
                self.tx = None;
                return Err("receiver dropped".to_string());
            }

            Ok(Some(frame))
        }
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        // 释放发送端, 接收端据此得知流结束
        self.tx = None;
        log::info!(
            "✅ 解码线程退出 (总帧{} | 丢弃{})",
            self.total_frames,
            self.dropped_frames
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_skips_row_padding() {
        // 2x2 图像, 每行 8 字节 (6 字节像素 + 2 字节填充)
        let raw: [u8; 16] = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let img = unsafe { copy_rgb24(raw.as_ptr(), 8, 2, 2) };
        assert_eq!(img.get_pixel(1, 0).0, [4, 5, 6]);
        assert_eq!(img.get_pixel(0, 1).0, [7, 8, 9]);
        assert_eq!(img.into_raw().len(), 12);
    }
}
