// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/decode.rs - 模型输出解码
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

use thiserror::Error;
use tracing::debug;

use crate::labels::LabelTable;
use crate::model::{BoundingBox, Detection, MAX_DETECTIONS, RawDetections};

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("类别索引越界: 第 {index} 项索引 {class_index} 超出标签表 ({len} 个类别)")]
  ClassIndexOutOfRange {
    index: usize,
    class_index: usize,
    len: usize,
  },
  #[error("检测数量越界: {count} 超出模型容量 {capacity}")]
  CountOutOfRange { count: usize, capacity: usize },
}

/// 将原始输出张量解码为结构化检测结果。
///
/// 归一化边界框按目标显示尺寸线性映射为像素坐标，
/// 输出顺序与原始输出一致（模型导出时按置信度降序），不得重排。
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
  target_width: u32,
  target_height: u32,
}

impl Decoder {
  pub fn new(target_width: u32, target_height: u32) -> Self {
    Self {
      target_width,
      target_height,
    }
  }

  pub fn decode(
    &self,
    raw: &RawDetections,
    labels: &LabelTable,
  ) -> Result<Vec<Detection>, DecodeError> {
    if raw.count > MAX_DETECTIONS {
      return Err(DecodeError::CountOutOfRange {
        count: raw.count,
        capacity: MAX_DETECTIONS,
      });
    }

    let width = self.target_width as f32;
    let height = self.target_height as f32;

    let mut detections = Vec::with_capacity(raw.count);
    for i in 0..raw.count {
      let score = raw.scores[i];
      let class_index = raw.class_indices[i] as usize;

      // 越界索引视为整次解码失败，不得以占位标签掩盖模型与标签表不一致
      let label = labels
        .get(class_index)
        .ok_or(DecodeError::ClassIndexOutOfRange {
          index: i,
          class_index,
          len: labels.len(),
        })?;

      // 边界框编码为 [top, left, bottom, right]，坐标已归一化
      let bbox = BoundingBox {
        left: raw.boxes[i][1] * width,
        top: raw.boxes[i][0] * height,
        right: raw.boxes[i][3] * width,
        bottom: raw.boxes[i][2] * height,
      };

      debug!("解码: {} {:.4} {:?}", label, score, bbox);
      detections.push(Detection {
        score,
        label: label.to_string(),
        bbox,
      });
    }

    Ok(detections)
  }
}
