// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型实现
// 包含: 模型加载、letterbox预处理、推理、后处理 (解码 + NMS)

use anyhow::{bail, Result};
use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, ArrayView2, Axis, IxDyn};

use crate::{non_max_suppression, Bbox, OrtBackend, OrtConfig, OrtEP, YOLOTask};

/// letterbox 填充值
const PAD_VALUE: f32 = 144.0 / 255.0;
const CXYWH_OFFSET: usize = 4;

/// 原图 (w0, h0) 缩放进 (w1, h1) 的比例与缩放后尺寸
pub fn letterbox_ratio(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// YOLOv8 检测模型
pub struct YOLOv8 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    conf: f32,
    iou: f32,
    names: Vec<String>,
    profile: bool,
}

impl YOLOv8 {
    pub fn new(config: OrtConfig, conf: f32, iou: f32, profile: bool) -> Result<Self> {
        let engine = OrtBackend::build(config)?;
        if engine.task() != YOLOTask::Detect {
            bail!("仅支持检测模型, 当前模型任务: {:?}", engine.task());
        }

        let names = engine
            .names()
            .unwrap_or_else(|| vec!["drone".to_string()]);

        Ok(Self {
            height: engine.height(),
            width: engine.width(),
            engine,
            conf,
            iou,
            names,
            profile,
        })
    }

    fn preprocess_one(&self, x: &DynamicImage, ys: &mut Array<f32, IxDyn>, idx: usize) -> Result<()> {
        let (w0, h0) = x.dimensions();
        let (_, w_new, h_new) =
            letterbox_ratio(w0 as f32, h0 as f32, self.width as f32, self.height as f32);
        let w_new = (w_new as u32).clamp(1, self.width);
        let h_new = (h_new as u32).clamp(1, self.height);

        let src = fr::images::Image::from_vec_u8(w0, h0, x.to_rgb8().into_raw(), fr::PixelType::U8x3)?;
        let mut dst = fr::images::Image::new(w_new, h_new, fr::PixelType::U8x3);
        let mut resizer = fr::Resizer::new();
        resizer.resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
        )?;

        for (i, rgb) in dst.buffer().chunks_exact(3).enumerate() {
            let x = i % w_new as usize;
            let y = i / w_new as usize;
            ys[[idx, 0, y, x]] = (rgb[0] as f32) / 255.0;
            ys[[idx, 1, y, x]] = (rgb[1] as f32) / 255.0;
            ys[[idx, 2, y, x]] = (rgb[2] as f32) / 255.0;
        }
        Ok(())
    }
}

/// 解码单张图片的原始输出 `[4 + nc, anchors]`
///
/// 每个 anchor 取最大类别分数, 低于 `conf` 丢弃, cxcywh 按 letterbox 比例还原到原图并裁剪,
/// 最后做同类 NMS。结果按置信度降序。
pub fn decode_predictions(
    preds: ArrayView2<f32>,
    ratio: f32,
    width_original: f32,
    height_original: f32,
    conf: f32,
    iou: f32,
) -> Vec<Bbox> {
    let nc = preds.nrows().saturating_sub(CXYWH_OFFSET);
    if nc == 0 {
        return Vec::new();
    }

    let mut data: Vec<Bbox> = Vec::new();
    for pred in preds.axis_iter(Axis(1)) {
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + nc]);

        let Some((id, &confidence)) = clss
            .into_iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        else {
            continue;
        };

        if confidence < conf {
            continue;
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        let x1 = (cx - w / 2.).clamp(0.0, width_original);
        let y1 = (cy - h / 2.).clamp(0.0, height_original);
        let x2 = (cx + w / 2.).clamp(0.0, width_original);
        let y2 = (cy + h / 2.).clamp(0.0, height_original);
        data.push(Bbox::new(x1, y1, x2 - x1, y2 - y1, id, confidence));
    }

    non_max_suppression(&mut data, iou);
    data
}

// 实现统一的 Model trait
impl super::Model for YOLOv8 {
    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Vec<Array<f32, IxDyn>>> {
        let mut ys = Array::from_elem(
            (images.len(), 3, self.height as usize, self.width as usize),
            PAD_VALUE,
        )
        .into_dyn();
        for (idx, x) in images.iter().enumerate() {
            self.preprocess_one(x, &mut ys, idx)?;
        }
        Ok(vec![ys])
    }

    fn run(&mut self, xs: Vec<Array<f32, IxDyn>>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let Some(x) = xs.into_iter().next() else {
            bail!("输入张量为空");
        };
        self.engine.run(x, profile || self.profile)
    }

    fn postprocess(&self, xs: Vec<Array<f32, IxDyn>>, xs0: &[DynamicImage]) -> Result<Vec<Vec<Bbox>>> {
        let Some(preds) = xs.first() else {
            bail!("模型没有输出");
        };
        if preds.ndim() != 3 {
            bail!("检测输出维度应为3, 实际: {:?}", preds.shape());
        }

        let mut ys = Vec::with_capacity(xs0.len());
        for (idx, anchor) in preds.axis_iter(Axis(0)).enumerate().take(xs0.len()) {
            let width_original = xs0[idx].width() as f32;
            let height_original = xs0[idx].height() as f32;
            let (ratio, _, _) = letterbox_ratio(
                width_original,
                height_original,
                self.width as f32,
                self.height as f32,
            );
            let anchor = anchor.into_dimensionality::<ndarray::Ix2>()?;
            ys.push(decode_predictions(
                anchor,
                ratio,
                width_original,
                height_original,
                self.conf,
                self.iou,
            ));
        }
        Ok(ys)
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn summary(&self) {
        log::info!(
            "\nSummary:\n\
            > Task: Detect{}\n\
            > EP: {:?} {}\n\
            > Height: {}, Width: {}\n\
            > nc: {}, conf: {}, iou: {}",
            match self.engine.author().zip(self.engine.version()) {
                Some((author, ver)) => format!(" ({} {})", author, ver),
                None => String::from(""),
            },
            self.engine.ep(),
            if let OrtEP::CPU = self.engine.ep() {
                ""
            } else {
                "(May still fall back to CPU)"
            },
            self.height,
            self.width,
            self.names.len(),
            self.conf,
            self.iou,
        );
    }
}
