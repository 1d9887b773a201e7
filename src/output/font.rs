// 该文件是 Biaozhu （标注） 项目的一部分。
// src/output/font.rs - 字体加载
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

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FontError {
  #[error("无法读取字体文件 {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("无效的字体文件: {}", path.display())]
  Invalid { path: PathBuf },
}

/// 每次调用都重新读取字体文件，不做缓存
pub fn load_font(path: &Path) -> Result<FontVec, FontError> {
  debug!("加载字体: {}", path.display());
  let data = std::fs::read(path).map_err(|source| FontError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  FontVec::try_from_vec(data).map_err(|_| FontError::Invalid {
    path: path.to_path_buf(),
  })
}

/// 行高：上升高度与下降高度之和
pub fn line_height<F: Font>(font: &F, size: f32) -> f32 {
  let scaled = font.as_scaled(PxScale::from(size));
  scaled.ascent() - scaled.descent()
}
