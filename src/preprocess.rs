// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/preprocess.rs - 图像预处理
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

use image::RgbImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::frame::RgbNhwcFrame;

/// 将任意尺寸的图像缩放并归一化为模型输入帧。
///
/// 缩放采用双线性插值，且不保持宽高比: 图像被直接拉伸到目标尺寸，
/// 既不加边也不裁剪中心。此为既定行为，输出需与其保持一致。
///
/// 归一化为 `(p - mean) / scale` 后重新量化为无符号字节。
/// 预量化模型取 mean = 0、scale = 1，即恒等变换；
/// 其他量化方案可通过构造参数配置。
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
  mean: f32,
  scale: f32,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self {
      mean: 0.0,
      scale: 1.0,
    }
  }
}

impl Preprocessor {
  pub fn new(mean: f32, scale: f32) -> Self {
    Self { mean, scale }
  }

  /// 纯函数: 仅依赖输入图像，无副作用。
  pub fn process<const W: u32, const H: u32>(&self, image: &RgbImage) -> RgbNhwcFrame<W, H> {
    debug!(
      "预处理: {}x{} -> {}x{}",
      image.width(),
      image.height(),
      W,
      H
    );

    let resized = imageops::resize(image, W, H, FilterType::Triangle);

    let mut frame = RgbNhwcFrame::<W, H>::default();
    let slice = frame.as_mut();
    for (index, value) in resized.as_raw().iter().enumerate() {
      slice[index] = self.quantize(*value);
    }
    frame
  }

  fn quantize(&self, value: u8) -> u8 {
    if self.mean == 0.0 && self.scale == 1.0 {
      return value;
    }
    ((value as f32 - self.mean) / self.scale).clamp(0.0, 255.0) as u8
  }
}
