// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// tests/pipeline.rs - 管线集成测试
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

use ab_glyph::FontArc;
use image::{Rgb, RgbImage};
use thiserror::Error;

use bomi::analyze::{AnalyzeError, Analyzer};
use bomi::labels::LabelTable;
use bomi::model::{BoundingBox, Detection, Model, ModelFrame, RawDetections};
use bomi::output::{Overlay, OverlayError, PALETTE};
use bomi::preprocess::Preprocessor;
use bomi::select::Selector;

#[derive(Error, Debug)]
enum StubError {
  #[error("桩引擎故障")]
  Broken,
}

/// 返回固定结果的桩引擎，用于在不加载真实模型的情况下测试管线。
struct StubEngine {
  raw: RawDetections,
}

impl Model for StubEngine {
  type Input = ModelFrame;
  type Output = RawDetections;
  type Error = StubError;

  fn infer(&mut self, _input: &ModelFrame) -> Result<RawDetections, StubError> {
    Ok(self.raw.clone())
  }
}

/// 始终失败的桩引擎
struct BrokenEngine;

impl Model for BrokenEngine {
  type Input = ModelFrame;
  type Output = RawDetections;
  type Error = StubError;

  fn infer(&mut self, _input: &ModelFrame) -> Result<RawDetections, StubError> {
    Err(StubError::Broken)
  }
}

/// COCO 风格标签表: 索引 3 为 cat，索引 17 为 dog
fn labels() -> LabelTable {
  let lines: Vec<String> = (0..20)
    .map(|i| match i {
      3 => "cat".to_string(),
      17 => "dog".to_string(),
      other => format!("class{}", other),
    })
    .collect();
  LabelTable::from_lines(&lines.join("\n")).unwrap()
}

fn analyzer_with(raw: RawDetections, width: u32, height: u32) -> Analyzer<StubEngine> {
  Analyzer::new(
    StubEngine { raw },
    labels(),
    Preprocessor::default(),
    Some(width),
    Some(height),
    Selector::default(),
  )
}

/// 渲染测试需要一个真实字体；从系统常见路径查找，找不到则跳过。
fn load_system_font() -> Option<FontArc> {
  const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
  ];
  for path in CANDIDATES {
    if let Ok(bytes) = std::fs::read(path)
      && let Ok(font) = FontArc::try_from_vec(bytes)
    {
      return Some(font);
    }
  }
  None
}

#[test]
fn end_to_end_scenario_returns_single_dog_detection() {
  // 640x480 图像，模型报告两个检测，第二个低于阈值
  let mut raw = RawDetections::default();
  raw.count = 2;
  raw.scores[0] = 0.92;
  raw.scores[1] = 0.10;
  raw.class_indices[0] = 17.0;
  raw.class_indices[1] = 3.0;
  raw.boxes[0] = [0.0, 0.0, 0.5, 0.5];

  let image = RgbImage::from_pixel(640, 480, Rgb([255, 255, 255]));
  let mut analyzer = analyzer_with(raw, 640, 480);

  let detections = analyzer.analyze(&image).unwrap();
  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].label, "dog");
  assert_eq!(detections[0].score, 0.92);
  assert_eq!(
    detections[0].bbox,
    BoundingBox {
      left: 0.0,
      top: 0.0,
      right: 320.0,
      bottom: 240.0,
    }
  );
}

#[test]
fn end_to_end_overlay_draws_palette_zero_box() {
  let Some(font) = load_system_font() else {
    eprintln!("未找到系统字体，跳过渲染断言");
    return;
  };

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

  let image = RgbImage::from_pixel(640, 480, Rgb([255, 255, 255]));
  let overlay = Overlay::new(font, Some(640), Some(480));
  let surface = overlay.render(&image, &detections).unwrap();

  assert_eq!(surface.dimensions(), (640, 480));
  // 调色板第 0 项为红色，框的上边缘位于表面第 0 行
  assert_eq!(*surface.get_pixel(160, 0), Rgb([255, 0, 0]));
  assert_eq!(*surface.get_pixel(319, 0), Rgb([255, 0, 0]));
}

#[test]
fn default_display_size_follows_each_analyzed_image() {
  // 连续分析两张尺寸不同的图像，边界框应各自映射到当次图像的尺寸
  let mut raw = RawDetections::default();
  raw.count = 1;
  raw.scores[0] = 0.9;
  raw.class_indices[0] = 17.0;
  raw.boxes[0] = [0.0, 0.0, 1.0, 1.0];

  let mut analyzer = Analyzer::new(
    StubEngine { raw },
    labels(),
    Preprocessor::default(),
    None,
    None,
    Selector::default(),
  );

  let landscape = analyzer.analyze(&RgbImage::new(640, 480)).unwrap();
  assert_eq!(landscape[0].bbox.right, 640.0);
  assert_eq!(landscape[0].bbox.bottom, 480.0);

  let portrait = analyzer.analyze(&RgbImage::new(480, 640)).unwrap();
  assert_eq!(portrait[0].bbox.right, 480.0);
  assert_eq!(portrait[0].bbox.bottom, 640.0);
}

#[test]
fn default_surface_height_covers_preview_and_text() {
  let Some(font) = load_system_font() else {
    eprintln!("未找到系统字体，跳过渲染断言");
    return;
  };

  let image = RgbImage::from_pixel(640, 480, Rgb([255, 255, 255]));
  let overlay = Overlay::new(font, None, None);
  let surface = overlay.render(&image, &[]).unwrap();

  // 比例为 1 时表面高度为 2h + 300，预览副本落在 h + 20 起的区域内
  assert_eq!(surface.dimensions(), (640, 1260));
  assert_eq!(*surface.get_pixel(160, 700), Rgb([255, 255, 255]));
}

#[test]
fn short_circuit_hides_high_score_after_low_score() {
  let mut raw = RawDetections::default();
  raw.count = 3;
  raw.scores[0] = 0.9;
  raw.scores[1] = 0.3;
  raw.scores[2] = 0.95;
  raw.class_indices[2] = 17.0;

  let image = RgbImage::new(64, 64);
  let mut analyzer = analyzer_with(raw, 64, 64);

  let detections = analyzer.analyze(&image).unwrap();
  // 第三项 0.95 高于阈值，但排在 0.3 之后，永远不会出现
  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].score, 0.9);
}

#[test]
fn six_passing_detections_are_capped_at_four() {
  let mut raw = RawDetections::default();
  raw.count = 6;
  for i in 0..6 {
    raw.scores[i] = 0.9 - 0.01 * i as f32;
    raw.class_indices[i] = i as f32;
  }

  let image = RgbImage::new(64, 64);
  let mut analyzer = analyzer_with(raw, 64, 64);

  let detections = analyzer.analyze(&image).unwrap();
  assert_eq!(detections.len(), 4);
  assert_eq!(detections[0].label, "class0");
  assert_eq!(detections[3].label, "class3");
}

#[test]
fn inference_failure_aborts_the_request_without_partial_results() {
  let mut analyzer = Analyzer::new(
    BrokenEngine,
    labels(),
    Preprocessor::default(),
    Some(64),
    Some(64),
    Selector::default(),
  );

  let image = RgbImage::new(64, 64);
  let result = analyzer.analyze(&image);
  assert!(matches!(result, Err(AnalyzeError::Inference(_))));
}

#[test]
fn out_of_range_class_index_fails_the_whole_analysis() {
  let mut raw = RawDetections::default();
  raw.count = 1;
  raw.scores[0] = 0.9;
  raw.class_indices[0] = 99.0;

  let image = RgbImage::new(64, 64);
  let mut analyzer = analyzer_with(raw, 64, 64);

  assert!(matches!(
    analyzer.analyze(&image),
    Err(AnalyzeError::Decode(_))
  ));
}

#[test]
fn five_detections_are_a_palette_invariant_violation() {
  let Some(font) = load_system_font() else {
    eprintln!("未找到系统字体，跳过渲染断言");
    return;
  };

  let detections: Vec<Detection> = (0..PALETTE.len() + 1)
    .map(|i| Detection {
      score: 0.9,
      label: format!("class{}", i),
      bbox: BoundingBox {
        left: 0.0,
        top: 0.0,
        right: 10.0,
        bottom: 10.0,
      },
    })
    .collect();

  let image = RgbImage::new(64, 64);
  let overlay = Overlay::new(font, Some(64), Some(64));
  assert!(matches!(
    overlay.render(&image, &detections),
    Err(OverlayError::PaletteExhausted {
      detections: 5,
      palette: 4
    })
  ));
}
