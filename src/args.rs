// 该文件是 Bomi （波密桃花沟） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Bomi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// SSD 模型路径（ssd:///path/to/model.onnx）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 标签文件路径，换行分隔的 UTF-8 文本，
  /// 第 n 行对应模型类别索引 n
  #[arg(long, value_name = "FILE")]
  pub labels: String,

  /// 输入图像（image:///path/to/image.jpg）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出端
  /// 支持方案:
  /// - image:///path/to/out.png 保存叠加图像
  /// - record:///path/to/dir 写入时间戳命名的图像与 JSON 记录
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 标签字体文件路径（TTF/OTF）
  #[arg(long, value_name = "FILE")]
  pub font: String,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// 显示宽度，省略时取当次分析图像的宽度，不得为零
  #[arg(long, value_name = "PIXELS")]
  pub display_width: Option<u32>,

  /// 显示高度，省略时取覆盖完整布局（主图、预览副本
  /// 与两行文字）的高度，不得为零
  #[arg(long, value_name = "PIXELS")]
  pub display_height: Option<u32>,

  /// 交互模式: 初始图像分析后，从标准输入逐行读取
  /// 下一张图片的 URL 并重新分析
  #[arg(long)]
  pub interactive: bool,
}
