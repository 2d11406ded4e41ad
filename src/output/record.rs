// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/output/record.rs - 目录记录输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use chrono::Utc;
use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::model::Detection;
use crate::output::{Overlay, OverlayError, Render};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("叠加渲染错误: {0}")]
  OverlayError(#[from] OverlayError),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

const RECORD_SCHEME: &str = "record";

/// 目录记录输出: 每次分析向目录写入一对时间戳命名的文件，
/// 叠加图像与 JSON 检测记录。
pub struct RecordOutput {
  directory: PathBuf,
  overlay: Overlay,
}

impl RecordOutput {
  pub fn new(url: &Url, overlay: Overlay) -> Result<Self, RecordOutputError> {
    if url.scheme() != RECORD_SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let directory = PathBuf::from(url.path());
    std::fs::create_dir_all(&directory)?;

    Ok(RecordOutput { directory, overlay })
  }

  fn record_json(frame: &RgbImage, result: &[Detection]) -> serde_json::Value {
    serde_json::json!({
      "timestamp": Utc::now().to_rfc3339(),
      "image": { "width": frame.width(), "height": frame.height() },
      "detections": result.iter().map(|d| serde_json::json!({
        "label": d.label,
        "score": d.score,
        "bbox": {
          "left": d.bbox.left,
          "top": d.bbox.top,
          "right": d.bbox.right,
          "bottom": d.bbox.bottom,
        },
      })).collect::<Vec<_>>(),
    })
  }
}

impl Render<RgbImage, Vec<Detection>> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, frame: &RgbImage, result: &Vec<Detection>) -> Result<(), Self::Error> {
    let stem = Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string();

    let surface = self.overlay.render(frame, result)?;
    let image_path = self.directory.join(format!("{stem}.png"));
    surface.save(&image_path)?;

    let record = Self::record_json(frame, result);
    let json_path = self.directory.join(format!("{stem}.json"));
    std::fs::write(&json_path, serde_json::to_string_pretty(&record)?)?;

    info!("记录分析结果: {}", json_path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;

  #[test]
  fn record_json_carries_detections_and_image_size() {
    let frame = RgbImage::new(640, 480);
    let detections = vec![Detection {
      score: 0.92,
      label: "dog".to_string(),
      bbox: BoundingBox {
        left: 0.0,
        top: 0.0,
        right: 320.0,
        bottom: 240.0,
      },
    }];

    let record = RecordOutput::record_json(&frame, &detections);
    assert_eq!(record["image"]["width"], 640);
    assert_eq!(record["detections"][0]["label"], "dog");
    assert_eq!(record["detections"][0]["bbox"]["right"], 320.0);
  }
}
