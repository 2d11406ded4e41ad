// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/select.rs - 检测结果筛选
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

use tracing::debug;

use crate::model::Detection;

/// 默认置信度阈值
pub const SCORE_THRESHOLD: f32 = 0.5;

/// 显示上限，与绘制调色板的长度保持一致
pub const DISPLAY_CAP: usize = 4;

/// 按阈值与显示上限筛选解码结果。
///
/// 按解码顺序遍历，遇到第一个低于阈值的检测即整体停止——
/// 其后即使有高于阈值的检测也不再纳入。该短路行为依赖模型输出
/// 按置信度降序排列；若引擎不保证降序，排在低分项之后的高分检测
/// 会被静默丢弃。这是既定可观察行为，保持原样。
/// 阈值筛选后再截断到显示上限，顺序保持不变。
#[derive(Debug, Clone, Copy)]
pub struct Selector {
  threshold: f32,
  display_cap: usize,
}

impl Default for Selector {
  fn default() -> Self {
    Self {
      threshold: SCORE_THRESHOLD,
      display_cap: DISPLAY_CAP,
    }
  }
}

impl Selector {
  pub fn new(threshold: f32) -> Self {
    Self {
      threshold,
      display_cap: DISPLAY_CAP,
    }
  }

  #[cfg(test)]
  fn with_display_cap(mut self, display_cap: usize) -> Self {
    self.display_cap = display_cap;
    self
  }

  pub fn select(&self, decoded: Vec<Detection>) -> Vec<Detection> {
    let mut selected = Vec::new();
    for detection in decoded {
      if detection.score < self.threshold {
        // 低于阈值即短路退出，不是逐项过滤
        debug!(
          "短路: {} {:.4} 低于阈值 {:.2}",
          detection.label, detection.score, self.threshold
        );
        break;
      }
      selected.push(detection);
    }

    selected.truncate(self.display_cap);
    debug!("筛选后保留 {} 个检测", selected.len());
    selected
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;

  fn detection(label: &str, score: f32) -> Detection {
    Detection {
      score,
      label: label.to_string(),
      bbox: BoundingBox {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
      },
    }
  }

  #[test]
  fn stops_at_first_score_below_threshold() {
    let decoded = vec![
      detection("a", 0.9),
      detection("b", 0.3),
      detection("c", 0.95),
    ];

    let selected = Selector::default().select(decoded);
    // 第三项虽高于阈值，但排在低分项之后，永远不会被纳入
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].label, "a");
  }

  #[test]
  fn caps_at_four_in_original_order() {
    let decoded = (0..6)
      .map(|i| detection(&format!("d{}", i), 0.9 - 0.01 * i as f32))
      .collect();

    let selected = Selector::default().select(decoded);
    assert_eq!(selected.len(), 4);
    let labels: Vec<&str> = selected.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, ["d0", "d1", "d2", "d3"]);
  }

  #[test]
  fn threshold_equal_scores_are_kept() {
    let decoded = vec![detection("a", 0.5), detection("b", 0.5)];
    let selected = Selector::default().select(decoded);
    assert_eq!(selected.len(), 2);
  }

  #[test]
  fn empty_input_yields_empty_output() {
    assert!(Selector::default().select(Vec::new()).is_empty());
  }

  #[test]
  fn cap_applies_after_threshold_pass() {
    let decoded = (0..6).map(|i| detection(&format!("d{}", i), 0.8)).collect();
    let selected = Selector::new(0.5).with_display_cap(2).select(decoded);
    assert_eq!(selected.len(), 2);
  }
}
