// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/analyze.rs - 分析管线
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
use thiserror::Error;
use tracing::{debug, info};

use crate::decode::{DecodeError, Decoder};
use crate::labels::LabelTable;
use crate::model::{Detection, Model, ModelFrame, RawDetections};
use crate::preprocess::Preprocessor;
use crate::select::Selector;

#[derive(Error, Debug)]
pub enum AnalyzeError<E> {
  #[error("推理错误: {0}")]
  Inference(E),
  #[error("解码错误: {0}")]
  Decode(#[from] DecodeError),
}

/// 单次分析请求的完整管线: 预处理、推理、解码、筛选。
///
/// 整个过程在调用线程上同步完成，无挂起点也无后台执行；
/// 慢速或挂起的推理会无限期阻塞调用方。引擎与标签表在构造时一次性
/// 传入且此后只读；每次请求的帧与检测列表均归该次请求所有。
///
/// 解码目标尺寸未显式配置时，每次请求按当次图像的尺寸重建解码器，
/// 换图后边界框仍与该图对齐；显式配置时固定为配置值。
pub struct Analyzer<M> {
  engine: M,
  labels: LabelTable,
  preprocessor: Preprocessor,
  display_width: Option<u32>,
  display_height: Option<u32>,
  selector: Selector,
}

impl<M> Analyzer<M>
where
  M: Model<Input = ModelFrame, Output = RawDetections>,
{
  pub fn new(
    engine: M,
    labels: LabelTable,
    preprocessor: Preprocessor,
    display_width: Option<u32>,
    display_height: Option<u32>,
    selector: Selector,
  ) -> Self {
    Self {
      engine,
      labels,
      preprocessor,
      display_width,
      display_height,
      selector,
    }
  }

  /// 无状态分析: 除常量级的引擎与标签表外，请求之间不保留任何检测状态。
  pub fn analyze(&mut self, image: &RgbImage) -> Result<Vec<Detection>, AnalyzeError<M::Error>> {
    let frame = self.preprocessor.process(image);

    debug!("开始推理");
    let now = std::time::Instant::now();
    let raw = self.engine.infer(&frame).map_err(AnalyzeError::Inference)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    let decoder = Decoder::new(
      self.display_width.unwrap_or(image.width()),
      self.display_height.unwrap_or(image.height()),
    );
    let decoded = decoder.decode(&raw, &self.labels)?;
    let selected = self.selector.select(decoded);
    for detection in &selected {
      info!("检测: {} {:.2}%", detection.label, detection.score * 100.0);
    }

    Ok(selected)
  }
}
