// 该文件是 Biaozhu （标注） 项目的一部分。
// src/frame.rs - 图像缓冲归一化
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

use image::{DynamicImage, ImageBuffer, ImageReader, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {found}")]
  LengthMismatch { expected: usize, found: usize },
  #[error("不支持的像素缓冲形状: {0:?}")]
  UnsupportedShape(Vec<usize>),
  #[error("像素缓冲为空")]
  Empty,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 原始像素数据，支持 8 位整数与浮点两种取值范围
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
  U8(Vec<u8>),
  F32(Vec<f32>),
}

impl PixelData {
  pub fn len(&self) -> usize {
    match self {
      PixelData::U8(data) => data.len(),
      PixelData::F32(data) => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  // 浮点数据最大值不超过 1 时按 [0, 1] 区间放大到 [0, 255]
  fn to_u8(&self) -> Vec<u8> {
    match self {
      PixelData::U8(data) => data.clone(),
      PixelData::F32(data) => {
        let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let scale = if max <= 1.0 { 255.0 } else { 1.0 };
        data
          .iter()
          .map(|value| (value * scale).round().clamp(0.0, 255.0) as u8)
          .collect()
      }
    }
  }
}

/// 像素缓冲的内存布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// (H, W) 灰度
  Gray,
  /// (3, H, W) 通道优先
  Nchw,
  /// (H, W, C) 通道在后，C 为 1、3 或 4
  Nhwc { channels: usize },
}

/// 带形状信息的像素缓冲
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
  shape: Vec<usize>,
  layout: Layout,
  data: PixelData,
}

impl PixelBuffer {
  pub fn new(shape: Vec<usize>, data: PixelData) -> Result<Self, FrameError> {
    if data.is_empty() {
      return Err(FrameError::Empty);
    }

    let expected: usize = shape.iter().product();
    if expected != data.len() {
      return Err(FrameError::LengthMismatch {
        expected,
        found: data.len(),
      });
    }

    // 与 3 通道优先布局冲突时，优先按通道优先处理
    let layout = match shape.as_slice() {
      [_, _] => Layout::Gray,
      [RGB_CHANNELS, _, _] => Layout::Nchw,
      [_, _, channels @ (1 | 3 | 4)] => Layout::Nhwc {
        channels: *channels,
      },
      _ => return Err(FrameError::UnsupportedShape(shape.clone())),
    };

    Ok(Self {
      shape,
      layout,
      data,
    })
  }

  pub fn from_u8(shape: Vec<usize>, data: Vec<u8>) -> Result<Self, FrameError> {
    Self::new(shape, PixelData::U8(data))
  }

  pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, FrameError> {
    Self::new(shape, PixelData::F32(data))
  }

  /// 将 RGB 图像转为通道优先的 (3, H, W) 缓冲
  pub fn nchw_from_rgb_image(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let plane_size = (width * height) as usize;
    let mut data = vec![0u8; plane_size * RGB_CHANNELS];

    for y in 0..height {
      for x in 0..width {
        let pixel = image.get_pixel(x, y);
        let idx = (y * width + x) as usize;
        data[idx] = pixel[0];
        data[plane_size + idx] = pixel[1];
        data[2 * plane_size + idx] = pixel[2];
      }
    }

    Self {
      shape: vec![RGB_CHANNELS, height as usize, width as usize],
      layout: Layout::Nchw,
      data: PixelData::U8(data),
    }
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn layout(&self) -> Layout {
    self.layout
  }

  pub fn height(&self) -> usize {
    match self.layout {
      Layout::Nchw => self.shape[1],
      Layout::Gray | Layout::Nhwc { .. } => self.shape[0],
    }
  }

  pub fn width(&self) -> usize {
    match self.layout {
      Layout::Nchw => self.shape[2],
      Layout::Gray | Layout::Nhwc { .. } => self.shape[1],
    }
  }
}

impl From<&RgbImage> for PixelBuffer {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    Self {
      shape: vec![height as usize, width as usize, RGB_CHANNELS],
      layout: Layout::Nhwc {
        channels: RGB_CHANNELS,
      },
      data: PixelData::U8(image.as_raw().clone()),
    }
  }
}

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> RgbImage;
}

impl ToRgbImage for PixelBuffer {
  fn to_rgb_image(&self) -> RgbImage {
    let width = self.width();
    let height = self.height();
    let data = self.data.to_u8();

    match self.layout {
      Layout::Gray => ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let value = data[y as usize * width + x as usize];
        Rgb([value, value, value])
      }),
      // 将 NCHW 转为 RGB 图像
      Layout::Nchw => ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let idx = y as usize * width + x as usize;
        let plane = height * width;
        Rgb([data[idx], data[plane + idx], data[2 * plane + idx]])
      }),
      // 将 NHWC 转为 RGB 图像，单通道复制为灰度，第四通道丢弃
      Layout::Nhwc { channels } => ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let idx = (y as usize * width + x as usize) * channels;
        if channels == 1 {
          Rgb([data[idx], data[idx], data[idx]])
        } else {
          Rgb([data[idx], data[idx + 1], data[idx + 2]])
        }
      }),
    }
  }
}

/// 绘制输入：文件路径、已解码图像或原始像素缓冲
#[derive(Debug, Clone)]
pub enum ImageSource {
  Path(PathBuf),
  Image(DynamicImage),
  Buffer(PixelBuffer),
}

impl ImageSource {
  /// 归一化为 8 位 RGB 图像，输入本身不会被修改
  pub fn into_rgb_image(self) -> Result<RgbImage, FrameError> {
    match self {
      ImageSource::Path(path) => {
        debug!("读取图像文件: {}", path.display());
        let image = ImageReader::open(&path)?.decode()?;
        Ok(image.into_rgb8())
      }
      ImageSource::Image(image) => Ok(image.into_rgb8()),
      ImageSource::Buffer(buffer) => Ok(buffer.to_rgb_image()),
    }
  }
}

impl From<PathBuf> for ImageSource {
  fn from(path: PathBuf) -> Self {
    ImageSource::Path(path)
  }
}

impl From<&Path> for ImageSource {
  fn from(path: &Path) -> Self {
    ImageSource::Path(path.to_path_buf())
  }
}

impl From<&str> for ImageSource {
  fn from(path: &str) -> Self {
    ImageSource::Path(PathBuf::from(path))
  }
}

impl From<DynamicImage> for ImageSource {
  fn from(image: DynamicImage) -> Self {
    ImageSource::Image(image)
  }
}

impl From<RgbImage> for ImageSource {
  fn from(image: RgbImage) -> Self {
    ImageSource::Image(DynamicImage::ImageRgb8(image))
  }
}

impl From<&RgbImage> for ImageSource {
  fn from(image: &RgbImage) -> Self {
    ImageSource::Image(DynamicImage::ImageRgb8(image.clone()))
  }
}

impl From<PixelBuffer> for ImageSource {
  fn from(buffer: PixelBuffer) -> Self {
    ImageSource::Buffer(buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_image() -> RgbImage {
    ImageBuffer::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 100) as u8, 7]))
  }

  #[test]
  fn rejects_length_mismatch() {
    let err = PixelBuffer::from_u8(vec![2, 2, 3], vec![0; 10]).unwrap_err();
    assert!(matches!(
      err,
      FrameError::LengthMismatch {
        expected: 12,
        found: 10
      }
    ));
  }

  #[test]
  fn rejects_unsupported_shapes() {
    assert!(matches!(
      PixelBuffer::from_u8(vec![2, 2, 2], vec![0; 8]),
      Err(FrameError::UnsupportedShape(_))
    ));
    assert!(matches!(
      PixelBuffer::from_u8(vec![8], vec![0; 8]),
      Err(FrameError::UnsupportedShape(_))
    ));
    assert!(matches!(
      PixelBuffer::from_u8(vec![0, 0], vec![]),
      Err(FrameError::Empty)
    ));
  }

  #[test]
  fn channel_first_and_channel_last_agree() {
    let image = sample_image();
    let nhwc = PixelBuffer::from(&image);
    let nchw = PixelBuffer::nchw_from_rgb_image(&image);

    assert_eq!(nchw.layout(), Layout::Nchw);
    assert_eq!(nchw.shape(), &[3, 3, 4]);
    assert_eq!(nhwc.to_rgb_image(), image);
    assert_eq!(nchw.to_rgb_image(), image);
  }

  #[test]
  fn unit_floats_scale_to_full_range() {
    let buffer = PixelBuffer::from_f32(vec![1, 2, 3], vec![0.0, 0.5, 1.0, 1.0, 0.2, 0.0]).unwrap();
    let image = buffer.to_rgb_image();
    assert_eq!(image.get_pixel(0, 0), &Rgb([0, 128, 255]));
    assert_eq!(image.get_pixel(1, 0), &Rgb([255, 51, 0]));
  }

  #[test]
  fn wide_range_floats_are_not_rescaled() {
    let buffer = PixelBuffer::from_f32(vec![1, 1, 3], vec![12.0, 300.0, 2.4]).unwrap();
    assert_eq!(buffer.to_rgb_image().get_pixel(0, 0), &Rgb([12, 255, 2]));
  }

  #[test]
  fn u8_buffers_are_never_rescaled() {
    let buffer = PixelBuffer::from_u8(vec![1, 1, 3], vec![1, 0, 1]).unwrap();
    assert_eq!(buffer.to_rgb_image().get_pixel(0, 0), &Rgb([1, 0, 1]));
  }

  #[test]
  fn gray_and_single_channel_replicate() {
    let gray = PixelBuffer::from_u8(vec![1, 2], vec![9, 200]).unwrap();
    assert_eq!(gray.layout(), Layout::Gray);
    assert_eq!(gray.to_rgb_image().get_pixel(1, 0), &Rgb([200, 200, 200]));

    let single = PixelBuffer::from_u8(vec![2, 1, 1], vec![5, 6]).unwrap();
    assert_eq!(single.to_rgb_image().get_pixel(0, 1), &Rgb([6, 6, 6]));
  }

  #[test]
  fn rgba_channel_is_dropped() {
    let buffer = PixelBuffer::from_u8(vec![1, 1, 4], vec![1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.to_rgb_image().get_pixel(0, 0), &Rgb([1, 2, 3]));
  }

  #[test]
  fn missing_file_is_io_error() {
    let source = ImageSource::from("/definitely/not/here.png");
    assert!(matches!(
      source.into_rgb_image(),
      Err(FrameError::IoError(_))
    ));
  }
}
