// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/model.rs - 模型
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

use crate::frame::RgbNhwcFrame;

/// 模型单次推理最多输出的检测数量，由模型导出时固定。
/// `RawDetections` 的各张量形状与解码器的越界判断共用该常量。
pub const MAX_DETECTIONS: usize = 10;

/// 模型输入宽度
pub const MODEL_INPUT_WIDTH: u32 = 300;
/// 模型输入高度
pub const MODEL_INPUT_HEIGHT: u32 = 300;

/// 模型输入帧类型
pub type ModelFrame = RgbNhwcFrame<MODEL_INPUT_WIDTH, MODEL_INPUT_HEIGHT>;

/// 推理引擎接口。
///
/// `infer` 接收独占引用：单个引擎实例不支持并发调用，
/// 同一时刻最多只允许一次在途推理。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 目标显示坐标系下的边界框，单位为像素。
///
/// 坐标直接来自模型输出的线性映射，`left < right` 与 `top < bottom`
/// 并不由构造保证，管线不对几何关系做校验或裁剪。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

/// 单个检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  /// 置信度，范围 [0, 1]
  pub score: f32,
  /// 类别名称，非空
  pub label: String,
  /// 目标显示坐标系下的边界框
  pub bbox: BoundingBox,
}

/// 模型原始输出，形状固定的四张量包。
///
/// 每次推理新建一份，不跨请求复用缓冲区。
/// `count` 直接取自模型输出，是否超出容量由解码器判定。
#[derive(Debug, Clone)]
pub struct RawDetections {
  /// 边界框，归一化坐标，编码为 [top, left, bottom, right]
  pub boxes: [[f32; 4]; MAX_DETECTIONS],
  /// 浮点编码的类别索引
  pub class_indices: [f32; MAX_DETECTIONS],
  /// 置信度，模型导出时按降序排列
  pub scores: [f32; MAX_DETECTIONS],
  /// 有效检测数量
  pub count: usize,
}

impl Default for RawDetections {
  fn default() -> Self {
    Self {
      boxes: [[0.0; 4]; MAX_DETECTIONS],
      class_indices: [0.0; MAX_DETECTIONS],
      scores: [0.0; MAX_DETECTIONS],
      count: 0,
    }
  }
}

mod ssd;
pub use self::ssd::{SsdError, SsdMobileNet, SsdMobileNetBuilder};
