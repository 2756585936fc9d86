// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 标注器: 在帧的副本上绘制检测框与标签

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use super::Detection;

// 高亮调色板, 按 class_id 取色
const BRIGHT_COLORS: [(u8, u8, u8); 12] = [
    (255, 0, 0),     // 红色
    (0, 255, 0),     // 绿色
    (0, 0, 255),     // 蓝色
    (255, 255, 0),   // 黄色
    (255, 0, 255),   // 品红
    (0, 255, 255),   // 青色
    (255, 128, 0),   // 橙色
    (255, 0, 128),   // 粉红
    (128, 255, 0),   // 黄绿
    (0, 128, 255),   // 天蓝
    (255, 255, 255), // 白色
    (128, 0, 255),   // 紫色
];

const LABEL_SCALE: f32 = 18.0;
const BOX_THICKNESS: i32 = 2;

pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// 不绘制文字标签
    pub fn new() -> Self {
        Self { font: None }
    }

    /// 从字体文件加载 (ttf/otf)
    pub fn with_font(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("读取字体失败: {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("字体解析失败 {}: {}", path.display(), e))?;
        Ok(Self { font: Some(font) })
    }

    pub fn color(class_id: u32) -> Rgb<u8> {
        let (r, g, b) = BRIGHT_COLORS[class_id as usize % BRIGHT_COLORS.len()];
        Rgb([r, g, b])
    }

    /// 返回绘制了全部检测框的新图, 原图不变
    pub fn plot(&self, frame: &RgbImage, detections: &[Detection], names: &[String]) -> RgbImage {
        let mut canvas = frame.clone();
        for det in detections {
            let color = Self::color(det.class_id);
            for t in 0..BOX_THICKNESS {
                let w = det.width() - 2 * t;
                let h = det.height() - 2 * t;
                if w <= 0 || h <= 0 {
                    break;
                }
                draw_hollow_rect_mut(
                    &mut canvas,
                    Rect::at(det.x1 + t, det.y1 + t).of_size(w as u32 + 1, h as u32 + 1),
                    color,
                );
            }

            if let Some(font) = &self.font {
                let name = names
                    .get(det.class_id as usize)
                    .map(String::as_str)
                    .unwrap_or("unknown");
                let label = format!("{} {:.2}", name, det.confidence);
                let scale = PxScale::from(LABEL_SCALE);
                let (tw, th) = text_size(scale, font, &label);
                let ty = (det.y1 - th as i32 - 4).max(0);
                if tw > 0 && th > 0 {
                    draw_filled_rect_mut(
                        &mut canvas,
                        Rect::at(det.x1, ty).of_size(tw + 4, th + 4),
                        color,
                    );
                }
                draw_text_mut(&mut canvas, Rgb([0, 0, 0]), det.x1 + 2, ty + 2, scale, font, &label);
            }
        }
        canvas
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_draws_box_border_without_touching_source() {
        let frame = RgbImage::new(64, 64);
        let det = Detection::new(0, 0.9, 10, 10, 30, 40);
        let out = Annotator::new().plot(&frame, &[det], &["drone".to_string()]);

        let red = Annotator::color(0);
        assert_eq!(out.get_pixel(10, 10), &red);
        assert_eq!(out.get_pixel(30, 40), &red);
        assert_eq!(out.get_pixel(11, 20), &red);
        assert_eq!(out.get_pixel(20, 20), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_box_is_skipped() {
        let frame = RgbImage::new(16, 16);
        let det = Detection::new(3, 0.5, 5, 5, 5, 5);
        let out = Annotator::new().plot(&frame, &[det], &[]);
        assert_eq!(out, frame);
    }

    #[test]
    fn missing_font_is_an_error() {
        assert!(Annotator::with_font("no/such/font.ttf").is_err());
    }
}
