// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 图片目录视频源: 按文件名排序逐张读取
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbImage;

use super::VideoSource;

const EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

pub struct ImageSequenceSource {
    files: std::vec::IntoIter<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("无法读取图片目录: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if files.is_empty() {
            bail!("图片目录为空: {}", dir.display());
        }
        files.sort();
        log::info!("🖼️ 图片序列: {} 张 ({})", files.len(), dir.display());
        Ok(Self {
            files: files.into_iter(),
        })
    }
}

impl VideoSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match self.files.next() {
            Some(path) => {
                let img = image::open(&path)
                    .with_context(|| format!("读取图片失败: {}", path.display()))?;
                Ok(Some(img.to_rgb8()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(4, 2).save(dir.path().join("b.png")).unwrap();
        RgbImage::new(8, 6).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let mut src = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(src.next_frame().unwrap().unwrap().dimensions(), (8, 6));
        assert_eq!(src.next_frame().unwrap().unwrap().dimensions(), (4, 2));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path()).is_err());
    }
}
