// 该文件是 Biaozhu （标注） 项目的一部分。
// src/annotation.rs - 标注数据定义
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

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
  #[error("标注长度无效: {0}，只支持 0、2、3、4、5")]
  InvalidLength(usize),
  #[error("无法解析标注 JSON: {0}")]
  InvalidJson(String),
}

/// 单个标注实体，由数值元组的长度决定类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
  Empty,
  Point { x: f32, y: f32 },
  ScoredPoint { x: f32, y: f32, score: f32 },
  Box { x1: f32, y1: f32, x2: f32, y2: f32 },
  ScoredBox { x1: f32, y1: f32, x2: f32, y2: f32, score: f32 },
}

/// 标注在图像上占据的外接矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl TryFrom<&[f32]> for Annotation {
  type Error = AnnotationError;

  fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
    match *values {
      [] => Ok(Annotation::Empty),
      [x, y] => Ok(Annotation::Point { x, y }),
      [x, y, score] => Ok(Annotation::ScoredPoint { x, y, score }),
      [x1, y1, x2, y2] => Ok(Annotation::Box { x1, y1, x2, y2 }),
      [x1, y1, x2, y2, score] => Ok(Annotation::ScoredBox {
        x1,
        y1,
        x2,
        y2,
        score,
      }),
      _ => Err(AnnotationError::InvalidLength(values.len())),
    }
  }
}

impl Annotation {
  pub fn is_empty(&self) -> bool {
    matches!(self, Annotation::Empty)
  }

  pub fn score(&self) -> Option<f32> {
    match *self {
      Annotation::ScoredPoint { score, .. } | Annotation::ScoredBox { score, .. } => Some(score),
      _ => None,
    }
  }

  /// 点按给定半径展开为圆的外接矩形；框的角点顺序会被规整
  pub fn bounds(&self, point_radius: f32) -> Option<Bounds> {
    match *self {
      Annotation::Empty => None,
      Annotation::Point { x, y } | Annotation::ScoredPoint { x, y, .. } => Some(Bounds {
        left: x - point_radius,
        top: y - point_radius,
        right: x + point_radius,
        bottom: y + point_radius,
      }),
      Annotation::Box { x1, y1, x2, y2 } | Annotation::ScoredBox { x1, y1, x2, y2, .. } => {
        Some(Bounds {
          left: x1.min(x2),
          top: y1.min(y2),
          right: x1.max(x2),
          bottom: y1.max(y2),
        })
      }
    }
  }
}

/// 一次绘制调用的全部标注：单个实体或一批实体
#[derive(Debug, Clone, PartialEq)]
pub enum Annotations {
  Single(Annotation),
  Batch(Vec<Annotation>),
}

impl Annotations {
  pub fn single(values: &[f32]) -> Result<Self, AnnotationError> {
    Ok(Annotations::Single(Annotation::try_from(values)?))
  }

  pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, AnnotationError> {
    let annotations = rows
      .iter()
      .map(|row| Annotation::try_from(row.as_ref()))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Annotations::Batch(annotations))
  }

  /// 按嵌套深度区分单个与批量：一维数组为单个实体，二维数组为批量。
  /// 任意层级长度为 1 的维度都会被压缩，`[[x, y]]` 视为单个点，
  /// `[[[x1, y1]], [[x2, y2]]]` 视为两个点。
  pub fn from_json(value: &Value) -> Result<Self, AnnotationError> {
    let value = squeeze(value);
    let Value::Array(items) = &value else {
      return Err(AnnotationError::InvalidJson(format!(
        "期望数组，实际为 {value}"
      )));
    };

    if let Some(values) = json_numbers(items) {
      return Self::single(&values);
    }

    let rows = items
      .iter()
      .map(|item| {
        item
          .as_array()
          .and_then(|row| json_numbers(row))
          .ok_or_else(|| AnnotationError::InvalidJson(format!("无效的标注行: {item}")))
      })
      .collect::<Result<Vec<_>, _>>()?;
    Self::from_rows(&rows)
  }

  /// 实例数量，单个模式下为 1
  pub fn len(&self) -> usize {
    match self {
      Annotations::Single(_) => 1,
      Annotations::Batch(items) => items.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn is_single(&self) -> bool {
    matches!(self, Annotations::Single(_))
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
    match self {
      Annotations::Single(annotation) => std::slice::from_ref(annotation).iter(),
      Annotations::Batch(items) => items.iter(),
    }
  }
}

/// 去掉长度为 1 的维度：单元素数组展开为其中的数组；
/// 子项全部为单元素数组时逐个展开
fn squeeze(value: &Value) -> Value {
  let Value::Array(items) = value else {
    return value.clone();
  };
  if let [inner @ Value::Array(_)] = items.as_slice() {
    return squeeze(inner);
  }

  let items: Vec<Value> = items.iter().map(squeeze).collect();
  let all_singletons = !items.is_empty()
    && items
      .iter()
      .all(|item| matches!(item, Value::Array(inner) if inner.len() == 1));
  if !all_singletons {
    return Value::Array(items);
  }

  Value::Array(
    items
      .into_iter()
      .map(|item| match item {
        Value::Array(mut inner) => inner.remove(0),
        other => other,
      })
      .collect(),
  )
}

pub(crate) fn json_numbers(items: &[Value]) -> Option<Vec<f32>> {
  items
    .iter()
    .map(|item| item.as_f64().map(|value| value as f32))
    .collect()
}

/// 标签绘制方式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Label {
  #[default]
  None,
  /// 批量模式下绘制实例序号
  Index,
  /// 单个模式下原样绘制，批量模式下绘制为 `文本_序号`
  Literal(String),
  /// 每个实例一个标签
  PerInstance(Vec<String>),
}

impl Label {
  pub fn text_for(&self, index: usize, single: bool) -> Option<String> {
    match self {
      Label::None => None,
      Label::Index if single => None,
      Label::Index => Some(index.to_string()),
      Label::Literal(text) if single => Some(text.clone()),
      Label::Literal(text) => Some(format!("{text}_{index}")),
      Label::PerInstance(labels) => labels.get(index).cloned(),
    }
  }
}
