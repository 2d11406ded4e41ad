// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/task.rs - 任务执行
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

use std::{thread, time::Duration};

use image::RgbImage;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl,
  analyze::Analyzer,
  input::ImageFileInput,
  model::{Detection, Model, ModelFrame, RawDetections},
  output::Render,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, analyzer: Analyzer<M>, output: O) -> Result<(), Self::Error>;
}

/// 单次任务: 取一帧，完成一次分析与渲染后退出。
pub struct OneShotTask;

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Model<Input = ModelFrame, Output = RawDetections, Error = ME>,
  O: Render<RgbImage, Vec<Detection>, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut analyzer: Analyzer<M>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;

    let detections = analyzer.analyze(&image)?;
    output.render_result(&image, &detections)?;
    info!("任务完成");

    Ok(())
  }
}

/// 交互任务: 先分析初始图像，之后从标准输入逐行读取下一张图片的
/// URL 并重新分析，对应“点击重新选图”的交互面。
///
/// 图像解码失败是可恢复错误: 上报后保留上一次的输出，等待下一次选择。
/// 推理或解码失败同样只终止当次请求，不终止会话。
#[derive(Default, Debug)]
pub struct InteractiveTask;

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Model<Input = ModelFrame, Output = RawDetections, Error = ME>,
  O: Render<RgbImage, Vec<Detection>, Error = RE>,
> Task<I, M, O> for InteractiveTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut analyzer: Analyzer<M>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    if let Some(image) = input.next() {
      analyze_one(&mut analyzer, &output, &image);
    }

    info!("输入下一张图片的 URL（image:///路径），Ctrl-C 退出");
    for line in std::io::stdin().lines() {
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      let line = match line {
        Ok(line) => line,
        Err(e) => {
          warn!("读取输入失败，退出任务循环: {}", e);
          break;
        }
      };

      let line = line.trim();
      if line.is_empty() {
        continue;
      }

      let url = match Url::parse(line) {
        Ok(url) => url,
        Err(e) => {
          error!("无效的 URL '{}': {}", line, e);
          continue;
        }
      };

      // 解码失败可恢复: 保留之前的输出，不进入推理
      let image = match ImageFileInput::from_url(&url).map(|mut i| i.next()) {
        Ok(Some(image)) => image,
        Ok(None) => continue,
        Err(e) => {
          error!("图像加载失败: {}", e);
          continue;
        }
      };

      analyze_one(&mut analyzer, &output, &image);
      info!("输入下一张图片的 URL（image:///路径），Ctrl-C 退出");
    }

    info!("任务完成，退出");
    Ok(())
  }
}

/// 处理一次分析请求。任何失败都终止当次请求且不展示部分结果，
/// 会话保持可用。
fn analyze_one<M, O, ME, RE>(analyzer: &mut Analyzer<M>, output: &O, image: &RgbImage)
where
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Input = ModelFrame, Output = RawDetections, Error = ME>,
  O: Render<RgbImage, Vec<Detection>, Error = RE>,
{
  let detections = match analyzer.analyze(image) {
    Ok(detections) => detections,
    Err(e) => {
      error!("分析失败: {}", e);
      return;
    }
  };

  if let Err(e) = output.render_result(image, &detections) {
    error!("渲染失败: {}", e);
  }
}
