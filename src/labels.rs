// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/labels.rs - 类别标签表
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

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LabelTableError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签表为空")]
  Empty,
}

/// 类别标签表。
///
/// 由换行分隔的 UTF-8 文本加载，第 n 行（从 0 起）对应模型类别索引 n。
/// 启动时加载一次，进程生命周期内只读。
#[derive(Debug, Clone)]
pub struct LabelTable {
  labels: Vec<String>,
}

impl LabelTable {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelTableError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let table = Self::from_lines(&content)?;
    info!(
      "标签表加载完成: {} ({} 个类别)",
      path.as_ref().display(),
      table.len()
    );
    Ok(table)
  }

  pub fn from_lines(content: &str) -> Result<Self, LabelTableError> {
    let labels: Vec<String> = content.lines().map(|line| line.to_string()).collect();
    if labels.is_empty() {
      return Err(LabelTableError::Empty);
    }
    Ok(Self { labels })
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(|s| s.as_str())
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }
}
