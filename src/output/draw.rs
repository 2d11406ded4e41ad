// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/output/draw.rs - 检测结果叠加绘制
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

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::debug;

use crate::model::Detection;
use crate::select::DISPLAY_CAP;

/// 边界框调色板，按检测序号取色。
/// 长度必须与显示上限一致，超出即为配置不变量被破坏。
pub const PALETTE: [[u8; 3]; DISPLAY_CAP] = [
  [255, 0, 0],   // 红
  [0, 255, 0],   // 绿
  [0, 255, 255], // 青
  [0, 0, 255],   // 蓝
];

// 布局常量，单位为源图像坐标，绘制时整体按显示比例缩放
const MAIN_IMAGE_OFFSET_Y: f32 = 10.0;
const PREVIEW_IMAGE_GAP_Y: f32 = 20.0;
const DIAGNOSTIC_TEXT_X: f32 = 10.0;
const INSTRUCTION_TEXT_X: f32 = 100.0;
const INSTRUCTION_TEXT_OFFSET_Y: f32 = 300.0;
const LABEL_TEXT_GAP: f32 = 5.0;

const DIAGNOSTIC_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const INSTRUCTION_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

const INSTRUCTION_TEXT: &str = "[ Touch to change the image. ]";

#[derive(Error, Debug)]
pub enum OverlayError {
  #[error("检测数量 {detections} 超出调色板容量 {palette}: 显示上限与调色板长度必须一致")]
  PaletteExhausted { detections: usize, palette: usize },
  #[error("显示尺寸为零: {width}x{height}")]
  ZeroDisplaySize { width: u32, height: u32 },
}

/// 叠加渲染器。
///
/// 纯渲染函数: 输入源图像与检测序列，输出一张新的内存表面，
/// 不触碰其他状态。边界框坐标已是显示坐标系，按原样绘制并随表面裁剪。
///
/// 显示宽度未显式配置时取当次图像宽度；显示高度未显式配置时
/// 取覆盖完整布局（主图、预览副本与两行文字）的高度。
pub struct Overlay {
  font: FontArc,
  display_width: Option<u32>,
  display_height: Option<u32>,
}

impl Overlay {
  pub fn new(font: FontArc, display_width: Option<u32>, display_height: Option<u32>) -> Self {
    Self {
      font,
      display_width,
      display_height,
    }
  }

  /// 调色板按检测序号取色，第五个及之后的检测没有对应颜色:
  /// 这是配置不变量被破坏，直接报错而不是回绕取色。
  pub fn ensure_palette(detections: usize) -> Result<(), OverlayError> {
    if detections > PALETTE.len() {
      return Err(OverlayError::PaletteExhausted {
        detections,
        palette: PALETTE.len(),
      });
    }
    Ok(())
  }

  /// 零宽或零高的表面无法承载任何绘制，也会使后续坐标夹取失效。
  pub fn ensure_display(width: u32, height: u32) -> Result<(), OverlayError> {
    if width == 0 || height == 0 {
      return Err(OverlayError::ZeroDisplaySize { width, height });
    }
    Ok(())
  }

  /// 中心四分之一裁剪，起点 (w/4, h/4)，尺寸 w/2 x h/2。
  /// 目前仅计算供外部取用，基线绘制流程不单独绘制它。
  pub fn preview_crop(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    imageops::crop_imm(image, w / 4, h / 4, (w / 2).max(1), (h / 2).max(1)).to_image()
  }

  /// 渲染叠加层: 源图像、预览副本、诊断文字、提示文字与各检测框。
  pub fn render(
    &self,
    image: &RgbImage,
    detections: &[Detection],
  ) -> Result<RgbImage, OverlayError> {
    Self::ensure_palette(detections.len())?;

    let (image_width, image_height) = image.dimensions();
    let display_width = self.display_width.unwrap_or(image_width);
    let h = image_height as f32;
    let scale = display_width as f32 / image_width as f32;

    // 默认表面高度覆盖完整布局: 提示文字底边位于 (2h + 300) * scale
    let display_height = self.display_height.unwrap_or_else(|| {
      ((2.0 * h + INSTRUCTION_TEXT_OFFSET_Y) * scale).ceil() as u32
    });
    Self::ensure_display(display_width, display_height)?;

    debug!(
      "渲染叠加层: 源 {}x{}, 显示 {}x{}, 比例 {:.4}",
      image_width, image_height, display_width, display_height, scale
    );

    let mut surface = RgbImage::new(display_width, display_height);

    // 按显示宽度缩放源图像，高度等比例
    let scaled_height = ((h * scale).round() as u32).max(1);
    let scaled = imageops::resize(image, display_width, scaled_height, FilterType::Triangle);

    // 主图像与下方的预览副本
    imageops::overlay(
      &mut surface,
      &scaled,
      0,
      (MAIN_IMAGE_OFFSET_Y * scale).round() as i64,
    );
    imageops::overlay(
      &mut surface,
      &scaled,
      0,
      ((h + PREVIEW_IMAGE_GAP_Y) * scale).round() as i64,
    );

    // 诊断文字: 图像宽高
    let diagnostic_px = h / 12.0 * scale;
    let diagnostic = format!("Width * Height : {} * {}", image_width, image_height);
    draw_text_mut(
      &mut surface,
      DIAGNOSTIC_COLOR,
      (DIAGNOSTIC_TEXT_X * scale).round() as i32,
      (((2.0 * h + PREVIEW_IMAGE_GAP_Y) * scale) - diagnostic_px).round() as i32,
      PxScale::from(diagnostic_px),
      &self.font,
      &diagnostic,
    );

    // 固定提示文字
    let instruction_px = h / 10.0 * scale;
    draw_text_mut(
      &mut surface,
      INSTRUCTION_COLOR,
      (INSTRUCTION_TEXT_X * scale).round() as i32,
      (((2.0 * h + INSTRUCTION_TEXT_OFFSET_Y) * scale) - instruction_px).round() as i32,
      PxScale::from(instruction_px),
      &self.font,
      INSTRUCTION_TEXT,
    );

    let label_px = h / 12.0 * scale;
    for (index, detection) in detections.iter().enumerate() {
      let color = Rgb(PALETTE[index]);
      self.draw_detection(&mut surface, detection, color, label_px);
    }

    Ok(surface)
  }

  fn draw_detection(
    &self,
    surface: &mut RgbImage,
    detection: &Detection,
    color: Rgb<u8>,
    label_px: f32,
  ) {
    let (w, h) = (surface.width() as i32, surface.height() as i32);
    let bbox = &detection.bbox;

    let x_min = (bbox.left.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.top.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.right.ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.bottom.ceil() as i32).clamp(0, h - 1);

    // 几何关系不受保证，裁剪后退化的框只画标签不画边框
    if x_min < x_max && y_min < y_max {
      let rect = Rect::at(x_min, y_min).of_size((x_max - x_min) as u32, (y_max - y_min) as u32);
      draw_hollow_rect_mut(surface, rect, color);

      // 内描边加粗以提高可见度
      let inner = Rect::at(x_min + 1, y_min + 1).of_size(
        ((x_max - x_min) as u32).saturating_sub(2).max(1),
        ((y_max - y_min) as u32).saturating_sub(2).max(1),
      );
      draw_hollow_rect_mut(surface, inner, color);
    }

    // 标签与百分比分数，置于框左上角上方
    let label = format!("{} {:.2}%", detection.label, detection.score * 100.0);
    let label_y = ((bbox.top - LABEL_TEXT_GAP - label_px) as i32).max(0);
    draw_text_mut(
      surface,
      color,
      x_min,
      label_y,
      PxScale::from(label_px),
      &self.font,
      &label,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn palette_length_matches_display_cap() {
    assert_eq!(PALETTE.len(), DISPLAY_CAP);
  }

  #[test]
  fn preview_crop_is_center_quarter() {
    let image = RgbImage::new(640, 480);
    let crop = Overlay::preview_crop(&image);
    assert_eq!(crop.dimensions(), (320, 240));
  }

  #[test]
  fn palette_accepts_up_to_the_display_cap() {
    for count in 0..=DISPLAY_CAP {
      assert!(Overlay::ensure_palette(count).is_ok());
    }
  }

  #[test]
  fn fifth_detection_violates_the_palette_invariant() {
    assert!(matches!(
      Overlay::ensure_palette(DISPLAY_CAP + 1),
      Err(OverlayError::PaletteExhausted {
        detections: 5,
        palette: 4
      })
    ));
  }

  #[test]
  fn zero_display_size_is_rejected() {
    assert!(matches!(
      Overlay::ensure_display(0, 480),
      Err(OverlayError::ZeroDisplaySize {
        width: 0,
        height: 480
      })
    ));
    assert!(matches!(
      Overlay::ensure_display(640, 0),
      Err(OverlayError::ZeroDisplaySize {
        width: 640,
        height: 0
      })
    ));
    assert!(Overlay::ensure_display(640, 480).is_ok());
  }
}
