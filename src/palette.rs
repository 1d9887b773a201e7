// 该文件是 Biaozhu （标注） 项目的一部分。
// src/palette.rs - 实例配色
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

use image::Rgba;
use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

/// 默认调色板
pub const DEFAULT_COLORS: [[u8; 3]; 20] = [
  [4, 42, 255],    // #042aff
  [11, 219, 235],  // #0bdbeb
  [243, 243, 243], // #f3f3f3
  [0, 223, 183],   // #00dfb7
  [17, 31, 104],   // #111f68
  [255, 111, 221], // #ff6fdd
  [255, 68, 79],   // #ff444f
  [204, 237, 0],   // #cced00
  [0, 243, 68],    // #00f344
  [189, 0, 255],   // #bd00ff
  [0, 180, 255],   // #00b4ff
  [221, 0, 186],   // #dd00ba
  [0, 255, 255],   // #00ffff
  [38, 192, 0],    // #26c000
  [1, 255, 179],   // #01ffb3
  [125, 36, 255],  // #7d24ff
  [123, 0, 104],   // #7b0068
  [255, 27, 108],  // #ff1b6c
  [252, 109, 47],  // #fc6d2f
  [162, 255, 11],  // #a2ff0b
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
  #[error("调色板不能为空")]
  Empty,
}

/// 每次调用时颜色列表的排列方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorOrder {
  #[default]
  Fixed,
  /// 打乱顺序；给定种子时结果可复现
  Shuffled { seed: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
  colors: Vec<[u8; 3]>,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      colors: DEFAULT_COLORS.to_vec(),
    }
  }
}

impl Palette {
  pub fn new(colors: Vec<[u8; 3]>) -> Result<Self, PaletteError> {
    if colors.is_empty() {
      return Err(PaletteError::Empty);
    }
    Ok(Self { colors })
  }

  pub fn len(&self) -> usize {
    self.colors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.colors.is_empty()
  }

  /// 附加透明度后的颜色列表，实例 i 使用第 `i % len` 个颜色
  pub fn colors(&self, alpha: u8, order: ColorOrder) -> Vec<Rgba<u8>> {
    let mut colors: Vec<Rgba<u8>> = self
      .colors
      .iter()
      .map(|&[r, g, b]| Rgba([r, g, b, alpha]))
      .collect();

    if let ColorOrder::Shuffled { seed } = order {
      if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        colors.shuffle(&mut rng);
      } else {
        let mut rng = rand::rng();
        colors.shuffle(&mut rng);
      }
    }

    colors
  }
}

/// 按实例序号循环取色，不检查重复
pub fn color_at(colors: &[Rgba<u8>], index: usize) -> Rgba<u8> {
  colors[index % colors.len()]
}
