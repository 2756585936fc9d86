// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理后端: 会话构建、执行设备选择、Ultralytics 元数据读取

use std::time::Instant;

use anyhow::{bail, Context, Result};
use ndarray::{Array, IxDyn};
use once_cell::sync::Lazy;
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use regex::Regex;

static NAMES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\d+)\s*:\s*['"]([^'"]*)['"]"#).unwrap());

/// Ultralytics 导出模型的任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YOLOTask {
    Classify,
    Detect,
    Pose,
    Segment,
}

impl YOLOTask {
    pub fn from_metadata(s: &str) -> Option<Self> {
        match s.trim() {
            "classify" => Some(YOLOTask::Classify),
            "detect" => Some(YOLOTask::Detect),
            "pose" => Some(YOLOTask::Pose),
            "segment" => Some(YOLOTask::Segment),
            _ => None,
        }
    }
}

/// 执行设备 (Execution Provider)
#[derive(Debug, Clone, PartialEq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub ep: OrtEP,
    pub trt_fp16: bool,
    /// 元数据缺少 imgsz 时使用的输入尺寸 (height, width)
    pub image_size: (u32, u32),
}

pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    task: YOLOTask,
    height: u32,
    width: u32,
    names: Option<Vec<String>>,
    author: Option<String>,
    version: Option<String>,
}

impl OrtBackend {
    pub fn build(args: OrtConfig) -> Result<Self> {
        if !std::path::Path::new(&args.f).exists() {
            bail!("模型文件不存在: {}", args.f);
        }

        let builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        let builder = match args.ep {
            OrtEP::CPU => builder,
            OrtEP::CUDA(device_id) => builder.with_execution_providers([
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
            OrtEP::Trt(device_id) => builder.with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .with_fp16(args.trt_fp16)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
        };
        let session = builder
            .commit_from_file(&args.f)
            .with_context(|| format!("加载ONNX模型失败: {}", args.f))?;

        let metadata = Self::read_metadata(&session);
        let task = match metadata.task.as_deref() {
            Some(s) => YOLOTask::from_metadata(s).unwrap_or(YOLOTask::Detect),
            None => YOLOTask::Detect,
        };
        let (height, width) = metadata
            .imgsz
            .as_deref()
            .and_then(parse_imgsz)
            .unwrap_or(args.image_size);
        let names = metadata.names.as_deref().map(parse_names);

        Ok(Self {
            session,
            ep: args.ep,
            task,
            height,
            width,
            names,
            author: metadata.author,
            version: metadata.version,
        })
    }

    fn read_metadata(session: &Session) -> RawMetadata {
        let Ok(metadata) = session.metadata() else {
            return RawMetadata::default();
        };
        let custom = |key: &str| metadata.custom(key).ok().flatten();
        RawMetadata {
            names: custom("names"),
            imgsz: custom("imgsz"),
            task: custom("task"),
            author: custom("author"),
            version: custom("version"),
        }
    }

    /// 输入 NCHW 张量, 返回全部输出 (拷贝为 owned)
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = Instant::now();
        let input = Tensor::from_array(xs)?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut ys = Vec::with_capacity(outputs.len());
        for i in 0..outputs.len() {
            let y = outputs[i]
                .try_extract_array::<f32>()
                .context("提取模型输出失败")?;
            ys.push(y.into_owned());
        }
        if profile {
            log::debug!("[ORT run]: {:?}", t.elapsed());
        }
        Ok(ys)
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn task(&self) -> YOLOTask {
        self.task
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn names(&self) -> Option<Vec<String>> {
        self.names.clone()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

#[derive(Default)]
struct RawMetadata {
    names: Option<String>,
    imgsz: Option<String>,
    task: Option<String>,
    author: Option<String>,
    version: Option<String>,
}

/// `{0: 'drone', 1: 'bird'}` → ["drone", "bird"]
pub fn parse_names(s: &str) -> Vec<String> {
    let mut pairs: Vec<(usize, String)> = NAMES_RE
        .captures_iter(s)
        .filter_map(|c| Some((c[1].parse().ok()?, c[2].to_string())))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    pairs.into_iter().map(|(_, name)| name).collect()
}

/// `[640, 640]` → (640, 640)
pub fn parse_imgsz(s: &str) -> Option<(u32, u32)> {
    let dims: Vec<u32> = s
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .filter_map(|x| x.trim().parse().ok())
        .collect();
    match dims.as_slice() {
        [h, w] => Some((*h, *w)),
        [s] => Some((*s, *s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_in_id_order() {
        let names = parse_names("{1: 'bird', 0: 'drone'}");
        assert_eq!(names, vec!["drone".to_string(), "bird".to_string()]);
    }

    #[test]
    fn imgsz_accepts_pair_and_scalar() {
        assert_eq!(parse_imgsz("[640, 480]"), Some((640, 480)));
        assert_eq!(parse_imgsz("320"), Some((320, 320)));
        assert_eq!(parse_imgsz("[]"), None);
    }

    #[test]
    fn missing_model_file_fails_fast() {
        let err = OrtBackend::build(OrtConfig {
            f: "does/not/exist.onnx".into(),
            ep: OrtEP::CPU,
            trt_fp16: false,
            image_size: (640, 640),
        })
        .err()
        .expect("missing model must fail");
        assert!(err.to_string().contains("does/not/exist.onnx"));
    }
}
