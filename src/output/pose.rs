// 该文件是 Biaozhu （标注） 项目的一部分。
// src/output/pose.rs - 人体姿态骨架绘制
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

use image::RgbImage;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
  annotation::json_numbers,
  frame::ImageSource,
  output::{
    RenderError,
    draw::{AnnotationRenderer, Layer, draw_point, draw_thick_line},
  },
  palette::color_at,
};

pub const KEYPOINT_COUNT: usize = 17;

/// 关键点名称，顺序即索引
pub const KEYPOINT_NAMES: [&str; KEYPOINT_COUNT] = [
  "nose",
  "left_eye",
  "right_eye",
  "left_ear",
  "right_ear",
  "left_shoulder",
  "right_shoulder",
  "left_elbow",
  "right_elbow",
  "left_wrist",
  "right_wrist",
  "left_hip",
  "right_hip",
  "left_knee",
  "right_knee",
  "left_ankle",
  "right_ankle",
];

/// COCO-Pose 骨架连接（关键点索引对）
pub const SKELETON: [[usize; 2]; 19] = [
  [15, 13], // left ankle to left knee
  [13, 11], // left knee to left hip
  [16, 14], // right ankle to right knee
  [14, 12], // right knee to right hip
  [11, 12], // left hip to right hip
  [5, 11],  // left shoulder to left hip
  [6, 12],  // right shoulder to right hip
  [5, 6],   // left shoulder to right shoulder
  [5, 7],   // left shoulder to left elbow
  [6, 8],   // right shoulder to right elbow
  [7, 9],   // left elbow to left wrist
  [8, 10],  // right elbow to right wrist
  [1, 2],   // left eye to right eye
  [0, 1],   // nose to left eye
  [0, 2],   // nose to right eye
  [1, 3],   // left eye to left ear
  [2, 4],   // right eye to right ear
  [3, 5],   // left ear to left shoulder
  [4, 6],   // right ear to right shoulder
];

const ALL_JOINTS: [usize; KEYPOINT_COUNT] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

/// 肩、肘、腕
const UPPER_LIMB_JOINTS: [usize; 6] = [5, 6, 7, 8, 9, 10];

/// 与肘部相连的骨架边
const UPPER_LIMB_EDGES: [[usize; 2]; 4] = [[5, 7], [6, 8], [7, 9], [8, 10]];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
  #[error("关键点数量不匹配: 期望 {expected}, 实际 {found}")]
  KeypointCount { expected: usize, found: usize },
  #[error("关键点坐标长度无效: {0}，只支持 2 或 3")]
  InvalidKeypoint(usize),
  #[error("展平关键点数组长度无效: {0}，只支持 34 或 51")]
  FlatLength(usize),
  #[error("无法解析关键点 JSON: {0}")]
  InvalidJson(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
}

/// 一个人体实例的 17 个关键点
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
  pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl Pose {
  pub fn from_points(points: &[[f32; 2]]) -> Result<Self, PoseError> {
    if points.len() != KEYPOINT_COUNT {
      return Err(PoseError::KeypointCount {
        expected: KEYPOINT_COUNT,
        found: points.len(),
      });
    }

    let mut keypoints = [Keypoint::default(); KEYPOINT_COUNT];
    for (keypoint, &[x, y]) in keypoints.iter_mut().zip(points) {
      *keypoint = Keypoint { x, y };
    }
    Ok(Self { keypoints })
  }

  /// 每行为 (x, y) 或 (x, y, score)，分数被忽略
  pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, PoseError> {
    let points = rows
      .iter()
      .map(|row| match *row.as_ref() {
        [x, y] | [x, y, _] => Ok([x, y]),
        ref other => Err(PoseError::InvalidKeypoint(other.len())),
      })
      .collect::<Result<Vec<_>, _>>()?;
    Self::from_points(&points)
  }

  /// 展平的 34 个 (x, y) 或 51 个 (x, y, score) 数值
  pub fn from_flat(values: &[f32]) -> Result<Self, PoseError> {
    let stride = match values.len() {
      n if n == KEYPOINT_COUNT * 2 => 2,
      n if n == KEYPOINT_COUNT * 3 => 3,
      n => return Err(PoseError::FlatLength(n)),
    };
    let rows: Vec<&[f32]> = values.chunks(stride).collect();
    Self::from_rows(&rows)
  }

  /// 单个实例（17 行或展平数组）或多个实例的数组
  pub fn from_json(value: &Value) -> Result<Vec<Self>, PoseError> {
    let items = value
      .as_array()
      .ok_or_else(|| PoseError::InvalidJson(format!("期望数组，实际为 {value}")))?;

    if let Some(values) = json_numbers(items) {
      return Ok(vec![Self::from_flat(&values)?]);
    }
    if let Some(rows) = json_rows(items) {
      return Ok(vec![Self::from_rows(&rows)?]);
    }

    items
      .iter()
      .map(|item| {
        let inner = item
          .as_array()
          .ok_or_else(|| PoseError::InvalidJson(format!("无效的姿态实例: {item}")))?;
        if let Some(values) = json_numbers(inner) {
          Self::from_flat(&values)
        } else if let Some(rows) = json_rows(inner) {
          Self::from_rows(&rows)
        } else {
          Err(PoseError::InvalidJson(format!("无效的姿态实例: {item}")))
        }
      })
      .collect()
  }
}

fn json_rows(items: &[Value]) -> Option<Vec<Vec<f32>>> {
  items
    .iter()
    .map(|item| item.as_array().and_then(|row| json_numbers(row)))
    .collect()
}

/// 骨架绘制方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoseVariant {
  /// 全部 17 个关节与 19 条骨架边
  #[default]
  FullSkeleton,
  /// 仅肩、肘、腕 6 个关节与肘部相连的 4 条边
  UpperLimbs,
}

impl PoseVariant {
  pub fn joints(&self) -> &'static [usize] {
    match self {
      PoseVariant::FullSkeleton => &ALL_JOINTS,
      PoseVariant::UpperLimbs => &UPPER_LIMB_JOINTS,
    }
  }

  pub fn edges(&self) -> &'static [[usize; 2]] {
    match self {
      PoseVariant::FullSkeleton => &SKELETON,
      PoseVariant::UpperLimbs => &UPPER_LIMB_EDGES,
    }
  }
}

impl AnnotationRenderer {
  /// 绘制人体骨架：先画关节（按关键点索引取色），再画骨架边（取起点关节颜色）
  pub fn draw_pose(
    &self,
    image: impl Into<ImageSource>,
    poses: &[Pose],
    variant: PoseVariant,
  ) -> Result<RgbImage, RenderError> {
    let image = image.into().into_rgb_image()?;
    let colors = self.instance_colors();
    let style = self.style();
    let radius = style.point_radius();

    debug!("绘制 {} 个姿态实例（{:?}）", poses.len(), variant);

    let mut layer = Layer::new(image);
    for (index, pose) in poses.iter().enumerate() {
      trace!("姿态实例 {}", index);

      for &joint in variant.joints() {
        let Keypoint { x, y } = pose.keypoints[joint];
        draw_point(layer.coverage(), x, y, radius);
        layer.composite(color_at(&colors, joint));
      }

      for &[a, b] in variant.edges() {
        let (start, end) = (pose.keypoints[a], pose.keypoints[b]);
        draw_thick_line(
          layer.coverage(),
          (start.x, start.y),
          (end.x, end.y),
          style.skeleton_width,
        );
        layer.composite(color_at(&colors, a));
      }
    }

    Ok(layer.finish())
  }
}
