#![allow(clippy::type_complexity)]
// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 命令行参数
pub mod control; // 云台居中控制
pub mod detection; // 检测结果与标注
pub mod input; // 视频输入系统
pub mod models; // 模型接口与具体实现
pub mod pipeline; // 逐帧处理循环
pub mod renderer; // 显示输出
pub mod trainer; // 训练 (委托 Ultralytics CLI)
pub mod trajectory; // 轨迹累积
pub mod tuning; // 控制/轨迹参数 (JSON)

pub mod ort_backend;

pub use crate::config::ModelArgs;
pub use crate::detection::{Bbox, Detection, Detector, Point};
pub use crate::models::{Model, YOLOv8};
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP, YOLOTask};
pub use crate::tuning::TrackerConfig;

/// 按置信度降序的贪心 NMS, 只在同类别之间抑制
pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].id() != xs[index].id() {
                continue;
            }
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
