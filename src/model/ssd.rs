// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/model/ssd.rs - SSD MobileNet 推理引擎
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

use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::AsNhwcFrame,
  model::{
    MAX_DETECTIONS, MODEL_INPUT_HEIGHT, MODEL_INPUT_WIDTH, Model, ModelFrame, RawDetections,
  },
};

const SSD_NUM_INPUTS: usize = 1;
const SSD_NUM_OUTPUTS: usize = 4;

// 输出张量约定顺序: 边界框、类别索引、置信度、检测数量
const SSD_OUTPUT_BOXES: usize = 0;
const SSD_OUTPUT_CLASSES: usize = 1;
const SSD_OUTPUT_SCORES: usize = 2;
const SSD_OUTPUT_COUNT: usize = 3;

#[derive(Error, Debug)]
pub enum SsdError {
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型加载错误: {0}")]
  ModelLoadError(ort::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("推理错误: {0}")]
  InferenceError(ort::Error),
}

/// 基于 ONNX Runtime 的 SSD MobileNet 引擎。
///
/// 输入为 300x300x3 的无符号字节 NHWC 张量，输出为四个固定形状的张量:
/// 边界框 [1][10][4]、类别索引 [1][10]、置信度 [1][10]、检测数量 [1]。
/// 对同一模型与输入，推理结果是确定的。
pub struct SsdMobileNet {
  session: Session,
  input_name: String,
}

pub struct SsdMobileNetBuilder {
  model_path: String,
}

const SSD_SCHEME: &str = "ssd";

impl FromUrlWithScheme for SsdMobileNetBuilder {
  const SCHEME: &'static str = SSD_SCHEME;
}

impl FromUrl for SsdMobileNetBuilder {
  type Error = SsdError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != SSD_SCHEME {
      return Err(SsdError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        SSD_SCHEME
      )));
    }

    Ok(SsdMobileNetBuilder {
      model_path: url.path().to_string(),
    })
  }
}

impl SsdMobileNetBuilder {
  /// 加载模型并校验输入输出契约。
  /// 模型文件缺失或形状不符均为致命错误，管线不得在此后继续。
  pub fn build(self) -> Result<SsdMobileNet, SsdError> {
    info!("加载模型文件: {}", self.model_path);
    let session = Session::builder()
      .map_err(SsdError::ModelLoadError)?
      .commit_from_file(&self.model_path)
      .map_err(SsdError::ModelLoadError)?;
    info!("模型加载完成");

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs != SSD_NUM_INPUTS {
      return Err(SsdError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        SSD_NUM_INPUTS, num_inputs
      )));
    }

    if num_outputs != SSD_NUM_OUTPUTS {
      return Err(SsdError::ModelInvalid(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        SSD_NUM_OUTPUTS, num_outputs
      )));
    }

    let input_name = session.inputs[0].name.clone();
    debug!("模型输入名称: {}", input_name);

    Ok(SsdMobileNet {
      session,
      input_name,
    })
  }
}

impl Model for SsdMobileNet {
  type Input = ModelFrame;
  type Output = RawDetections;
  type Error = SsdError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let shape = [
      1usize,
      MODEL_INPUT_HEIGHT as usize,
      MODEL_INPUT_WIDTH as usize,
      3,
    ];
    let tensor = Tensor::from_array((shape, input.as_nhwc().to_vec().into_boxed_slice()))
      .map_err(SsdError::InferenceError)?;

    debug!("执行模型推理");
    let outputs = self
      .session
      .run(ort::inputs![self.input_name.as_str() => tensor])
      .map_err(SsdError::InferenceError)?;

    debug!("获取模型输出");
    let mut tensors: Vec<Vec<f32>> = Vec::with_capacity(SSD_NUM_OUTPUTS);
    for (name, value) in outputs.iter() {
      let (_shape, data) = value
        .try_extract_tensor::<f32>()
        .map_err(SsdError::InferenceError)?;
      debug!("输出张量 {}: {} 个元素", name, data.len());
      tensors.push(data.to_vec());
    }

    if tensors.len() != SSD_NUM_OUTPUTS {
      return Err(SsdError::ModelInvalid(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        SSD_NUM_OUTPUTS,
        tensors.len()
      )));
    }

    let expected = [
      (SSD_OUTPUT_BOXES, 4 * MAX_DETECTIONS),
      (SSD_OUTPUT_CLASSES, MAX_DETECTIONS),
      (SSD_OUTPUT_SCORES, MAX_DETECTIONS),
      (SSD_OUTPUT_COUNT, 1),
    ];
    for (index, len) in expected {
      if tensors[index].len() != len {
        return Err(SsdError::ModelInvalid(format!(
          "输出张量 {} 大小不匹配: 期望 {}, 实际 {}",
          index,
          len,
          tensors[index].len()
        )));
      }
    }

    // 每次推理新建结果包，避免跨请求共享缓冲
    let mut raw = RawDetections::default();
    for i in 0..MAX_DETECTIONS {
      for c in 0..4 {
        raw.boxes[i][c] = tensors[SSD_OUTPUT_BOXES][i * 4 + c];
      }
      raw.class_indices[i] = tensors[SSD_OUTPUT_CLASSES][i];
      raw.scores[i] = tensors[SSD_OUTPUT_SCORES][i];
    }
    raw.count = tensors[SSD_OUTPUT_COUNT][0].max(0.0) as usize;

    debug!("模型报告 {} 个检测", raw.count);
    Ok(raw)
  }
}
