// 该文件是 Biaozhu （标注） 项目的一部分。
// src/style.rs - 绘制样式配置
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

use crate::palette::ColorOrder;

pub const DEFAULT_POINT_SIZE: u32 = 30;
pub const DEFAULT_BORDER_WIDTH: u32 = 10;
pub const DEFAULT_FONT_SIZE: f32 = 40.0;
pub const DEFAULT_ALPHA: u8 = 200;
pub const DEFAULT_SKELETON_WIDTH: u32 = 10;
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
  /// 点的直径，圆半径为其一半
  pub point_size: u32,
  /// 矩形边框宽度（向内绘制）
  pub border_width: u32,
  pub font_size: f32,
  /// 所有颜色共用的透明度
  pub alpha: u8,
  pub skeleton_width: u32,
  pub font_path: PathBuf,
  /// 固定颜色，设置后替代调色板
  pub color: Option<[u8; 3]>,
  pub color_order: ColorOrder,
}

impl Default for RenderStyle {
  fn default() -> Self {
    Self {
      point_size: DEFAULT_POINT_SIZE,
      border_width: DEFAULT_BORDER_WIDTH,
      font_size: DEFAULT_FONT_SIZE,
      alpha: DEFAULT_ALPHA,
      skeleton_width: DEFAULT_SKELETON_WIDTH,
      font_path: PathBuf::from(DEFAULT_FONT_PATH),
      color: None,
      color_order: ColorOrder::Fixed,
    }
  }
}

impl RenderStyle {
  pub fn with_point_size(mut self, point_size: u32) -> Self {
    self.point_size = point_size;
    self
  }

  pub fn with_border_width(mut self, border_width: u32) -> Self {
    self.border_width = border_width;
    self
  }

  pub fn with_font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn with_alpha(mut self, alpha: u8) -> Self {
    self.alpha = alpha;
    self
  }

  pub fn with_skeleton_width(mut self, skeleton_width: u32) -> Self {
    self.skeleton_width = skeleton_width;
    self
  }

  pub fn with_font_path(mut self, font_path: impl Into<PathBuf>) -> Self {
    self.font_path = font_path.into();
    self
  }

  pub fn with_color(mut self, color: Option<[u8; 3]>) -> Self {
    self.color = color;
    self
  }

  pub fn with_color_order(mut self, color_order: ColorOrder) -> Self {
    self.color_order = color_order;
    self
  }

  pub fn point_radius(&self) -> u32 {
    self.point_size / 2
  }
}
