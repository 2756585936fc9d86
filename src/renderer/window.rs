// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! macroquad 预览窗口

use anyhow::Result;
use image::RgbImage;
use macroquad::prelude::*;

use super::{Flow, FrameSink};

pub const WINDOW_WIDTH: i32 = 1280;
pub const WINDOW_HEIGHT: i32 = 720;

pub fn window_conf(title: &str) -> Conf {
    Conf {
        window_title: title.to_string(),
        window_width: WINDOW_WIDTH,
        window_height: WINDOW_HEIGHT,
        window_resizable: true,
        ..Default::default()
    }
}

pub struct WindowSink {
    quit_key: KeyCode,
    last_frame: Option<Texture2D>,
}

impl WindowSink {
    /// 必须在 macroquad 窗口上下文中创建
    pub fn new() -> Self {
        // 关闭窗口也走正常退出路径, 保证资源释放
        prevent_quit();
        Self {
            quit_key: KeyCode::Q,
            last_frame: None,
        }
    }

    fn draw(&self, title: &str) {
        clear_background(BLACK);

        if let Some(texture) = &self.last_frame {
            // 等比缩放居中
            let scale = (screen_width() / texture.width()).min(screen_height() / texture.height());
            let w = texture.width() * scale;
            let h = texture.height() * scale;
            draw_texture_ex(
                texture,
                (screen_width() - w) / 2.0,
                (screen_height() - h) / 2.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(w, h)),
                    ..Default::default()
                },
            );
        }

        draw_text(title, 10.0, 24.0, 24.0, WHITE);
        draw_text("q: quit", 10.0, screen_height() - 10.0, 20.0, GRAY);
    }
}

impl Default for WindowSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for WindowSink {
    async fn present(&mut self, title: &str, frame: &RgbImage) -> Result<Flow> {
        let rgba = image::DynamicImage::ImageRgb8(frame.clone()).to_rgba8();
        let texture = Texture2D::from_rgba8(rgba.width() as u16, rgba.height() as u16, &rgba);
        texture.set_filter(FilterMode::Linear);
        self.last_frame = Some(texture);

        self.draw(title);
        next_frame().await;

        if is_key_pressed(self.quit_key) || is_quit_requested() {
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }
}
