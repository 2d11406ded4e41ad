// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use ab_glyph::FontArc;
use anyhow::Result;
use clap::Parser;
use image::RgbImage;
use tracing::info;

use bomi::{
  FromUrl,
  analyze::Analyzer,
  input::ImageFileInput,
  labels::LabelTable,
  model::{Detection, Model, ModelFrame, RawDetections, SsdMobileNetBuilder},
  output::{Overlay, RecordOutput, Render, SaveImageFileOutput},
  preprocess::Preprocessor,
  select::Selector,
  task::{InteractiveTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("标签文件路径: {}", args.labels);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);
  info!("置信度阈值: {}", args.confidence);

  if args.display_width == Some(0) || args.display_height == Some(0) {
    anyhow::bail!("显示尺寸不得为零");
  }

  // 显式初始化: 模型或标签表加载失败即终止，绝不进入分析
  let labels = LabelTable::load(&args.labels)?;
  let engine = SsdMobileNetBuilder::from_url(&args.model)?.build()?;
  let font = FontArc::try_from_vec(std::fs::read(&args.font)?)?;

  let image = ImageFileInput::from_url(&args.input)?
    .next()
    .ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;

  // 显示尺寸未显式配置时按每次分析的图像尺寸自适应
  let analyzer = Analyzer::new(
    engine,
    labels,
    Preprocessor::default(),
    args.display_width,
    args.display_height,
    Selector::new(args.confidence),
  );
  let overlay = Overlay::new(font, args.display_width, args.display_height);

  match args.output.scheme() {
    "image" => {
      let output = SaveImageFileOutput::new(&args.output, overlay)?;
      run(args.interactive, image, analyzer, output)
    }
    "record" => {
      let output = RecordOutput::new(&args.output, overlay)?;
      run(args.interactive, image, analyzer, output)
    }
    scheme => anyhow::bail!("不支持的输出方案: {}", scheme),
  }
}

fn run<M, O, ME, RE>(
  interactive: bool,
  image: RgbImage,
  analyzer: Analyzer<M>,
  output: O,
) -> Result<()>
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ModelFrame, Output = RawDetections, Error = ME>,
  O: Render<RgbImage, Vec<Detection>, Error = RE>,
{
  let input = std::iter::once(image);
  if interactive {
    InteractiveTask.run_task(input, analyzer, output)
  } else {
    OneShotTask.run_task(input, analyzer, output)
  }
}
