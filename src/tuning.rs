// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 控制与轨迹参数 - 通过JSON文件调整

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::control::{CenteringController, SelectionPolicy};
use crate::trajectory::{self, TrajectoryAccumulator, TrajectoryHistory};

/// 跟踪参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // === 居中控制 ===
    pub pan_gain: f32,  // 每像素偏移对应的 pan 度数
    pub tilt_gain: f32, // 每像素偏移对应的 tilt 度数
    pub selection: SelectionPolicy,
    pub max_step_degrees: Option<f32>, // 单条指令限幅, None 为不限

    // === 轨迹 ===
    pub trajectory_conf_threshold: f32, // 严格大于才记录
    pub trajectory_max_points: usize,   // 0 为不限

    // === 循环 ===
    pub target_fps: Option<f64>, // None: 不限速
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pan_gain: 0.1,
            tilt_gain: 0.1,
            selection: SelectionPolicy::HighestConfidence,
            max_step_degrees: None,

            trajectory_conf_threshold: trajectory::DEFAULT_CONF_THRESHOLD,
            trajectory_max_points: trajectory::DEFAULT_MAX_POINTS,

            target_fps: None,
        }
    }
}

impl TrackerConfig {
    /// 从JSON文件加载配置; 文件不存在时写入默认配置, 解析失败直接报错
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let config: Self = serde_json::from_str(&json)
                    .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
                log::info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(e) => Err(e).with_context(|| format!("读取配置失败: {}", path.display())),
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        log::info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn controller(&self) -> CenteringController {
        CenteringController::new(self.pan_gain, self.tilt_gain, self.selection)
    }

    pub fn accumulator(&self) -> TrajectoryAccumulator {
        TrajectoryAccumulator::new(
            self.trajectory_conf_threshold,
            TrajectoryHistory::bounded(self.trajectory_max_points),
        )
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        log::info!("🎛️  当前跟踪配置:");
        log::info!("  增益 pan/tilt: {:.3} / {:.3}", self.pan_gain, self.tilt_gain);
        log::info!("  目标选择: {:?}", self.selection);
        match self.max_step_degrees {
            Some(step) => log::info!("  单步限幅: ±{:.2}°", step),
            None => log::info!("  单步限幅: 无"),
        }
        log::info!("  轨迹阈值: > {:.2}", self.trajectory_conf_threshold);
        if self.trajectory_max_points == 0 {
            log::info!("  轨迹上限: 不限");
        } else {
            log::info!("  轨迹上限: {} 点", self.trajectory_max_points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert!(path.exists());
        assert_eq!(TrackerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(
            &path,
            r#"{"pan_gain": 0.25, "selection": {"kind": "sticky_iou", "min_iou": 0.3}}"#,
        )
        .unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.pan_gain, 0.25);
        assert_eq!(config.tilt_gain, 0.1);
        assert_eq!(config.selection, SelectionPolicy::StickyIou { min_iou: 0.3 });
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(TrackerConfig::load(&path).is_err());
    }
}
