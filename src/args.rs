// 该文件是 Biaozhu （标注） 项目的一部分。
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

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

use biaozhu::{
  ColorOrder, Label, PoseVariant, RenderStyle,
  style::{
    DEFAULT_ALPHA, DEFAULT_BORDER_WIDTH, DEFAULT_FONT_PATH, DEFAULT_FONT_SIZE, DEFAULT_POINT_SIZE,
    DEFAULT_SKELETON_WIDTH,
  },
};

/// Biaozhu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 绘制点或矩形标注
  Draw(DrawArgs),
  /// 绘制人体姿态骨架
  Pose(PoseArgs),
}

#[derive(clap::Args, Debug)]
pub struct DrawArgs {
  /// 输入图像，例如 image:///path/to/input.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 标注 JSON 文件：一维数组为单个标注，二维数组为批量标注
  #[arg(long, value_name = "FILE")]
  pub annotations: PathBuf,
  /// 输出图像，例如 image:///path/to/output.png
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 标签文本（批量模式下绘制为 文本_序号）
  #[arg(long, conflicts_with_all = ["index_label", "labels"])]
  pub label: Option<String>,
  /// 批量模式下绘制实例序号
  #[arg(long, conflicts_with = "labels")]
  pub index_label: bool,
  /// 每个实例一个标签，以逗号分隔
  #[arg(long, value_delimiter = ',')]
  pub labels: Option<Vec<String>>,
  /// 每个实例的置信度，以逗号分隔
  #[arg(long, value_delimiter = ',')]
  pub probs: Option<Vec<f32>>,
  #[command(flatten)]
  pub style: StyleArgs,
}

impl DrawArgs {
  pub fn label(&self) -> Label {
    match (&self.label, self.index_label, &self.labels) {
      (Some(text), _, _) => Label::Literal(text.clone()),
      (None, true, _) => Label::Index,
      (None, false, Some(labels)) => Label::PerInstance(labels.clone()),
      (None, false, None) => Label::None,
    }
  }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum VariantArg {
  /// 全部关节与骨架边
  Full,
  /// 仅肩、肘、腕
  UpperLimbs,
}

impl From<VariantArg> for PoseVariant {
  fn from(variant: VariantArg) -> Self {
    match variant {
      VariantArg::Full => PoseVariant::FullSkeleton,
      VariantArg::UpperLimbs => PoseVariant::UpperLimbs,
    }
  }
}

#[derive(clap::Args, Debug)]
pub struct PoseArgs {
  /// 输入图像，例如 image:///path/to/input.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 关键点 JSON 文件：17 个 [x, y]，或多个实例组成的数组
  #[arg(long, value_name = "FILE")]
  pub keypoints: PathBuf,
  /// 输出图像
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 骨架绘制方式
  #[arg(long, value_enum, default_value_t = VariantArg::Full)]
  pub variant: VariantArg,
  #[command(flatten)]
  pub style: StyleArgs,
}

#[derive(clap::Args, Debug)]
pub struct StyleArgs {
  /// 点的直径
  #[arg(long, default_value_t = DEFAULT_POINT_SIZE)]
  pub point_size: u32,
  /// 矩形边框宽度
  #[arg(long, default_value_t = DEFAULT_BORDER_WIDTH)]
  pub border_width: u32,
  /// 字体大小
  #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
  pub font_size: f32,
  /// 透明度 (0 - 255)
  #[arg(long, default_value_t = DEFAULT_ALPHA)]
  pub alpha: u8,
  /// 骨架线宽
  #[arg(long, default_value_t = DEFAULT_SKELETON_WIDTH)]
  pub skeleton_width: u32,
  /// 字体文件路径
  #[arg(long, value_name = "FILE", default_value = DEFAULT_FONT_PATH)]
  pub font: PathBuf,
  /// 固定颜色 R,G,B，替代调色板
  #[arg(long, value_delimiter = ',', value_name = "R,G,B")]
  pub color: Option<Vec<u8>>,
  /// 打乱调色板顺序
  #[arg(long)]
  pub shuffle: bool,
  /// 打乱顺序使用的随机种子
  #[arg(long, requires = "shuffle")]
  pub seed: Option<u64>,
}

impl StyleArgs {
  pub fn to_style(&self) -> Result<RenderStyle> {
    let color = match self.color.as_deref() {
      None => None,
      Some(&[r, g, b]) => Some([r, g, b]),
      Some(other) => bail!("颜色需要 3 个分量，实际为 {}", other.len()),
    };
    let color_order = if self.shuffle {
      ColorOrder::Shuffled { seed: self.seed }
    } else {
      ColorOrder::Fixed
    };

    Ok(
      RenderStyle::default()
        .with_point_size(self.point_size)
        .with_border_width(self.border_width)
        .with_font_size(self.font_size)
        .with_alpha(self.alpha)
        .with_skeleton_width(self.skeleton_width)
        .with_font_path(self.font.clone())
        .with_color(color)
        .with_color_order(color_order),
    )
  }
}
