// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/output/save_image_file.rs - 保存叠加图像文件
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

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::model::Detection;
use crate::output::{Overlay, OverlayError, Render};

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch { expected: String, actual: String },
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("叠加渲染错误: {0}")]
  OverlayError(#[from] OverlayError),
}

const SAVE_IMAGE_FILE_SCHEME: &str = "image";

/// 将叠加渲染结果保存为图像文件的输出端。
pub struct SaveImageFileOutput {
  path: String,
  overlay: Overlay,
}

impl SaveImageFileOutput {
  pub fn new(url: &Url, overlay: Overlay) -> Result<Self, SaveImageFileError> {
    if url.scheme() != SAVE_IMAGE_FILE_SCHEME {
      return Err(SaveImageFileError::SchemeMismatch {
        expected: SAVE_IMAGE_FILE_SCHEME.to_string(),
        actual: url.scheme().to_string(),
      });
    }

    Ok(SaveImageFileOutput {
      path: url.path().to_string(),
      overlay,
    })
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存叠加图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<RgbImage, Vec<Detection>> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RgbImage, result: &Vec<Detection>) -> Result<(), Self::Error> {
    let surface = self.overlay.render(frame, result)?;
    self.save_image(&surface)
  }
}
