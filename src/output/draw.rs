// 该文件是 Biaozhu （标注） 项目的一部分。
// src/output/draw.rs - 标注结果可视化
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

use ab_glyph::{FontVec, PxScale};
use image::{GrayImage, Luma, RgbImage, Rgba};
use imageproc::drawing::{
  Canvas, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::{debug, trace};

use crate::{
  annotation::{Annotation, Annotations, Label},
  frame::ImageSource,
  output::{
    RenderError,
    font::{line_height, load_font},
  },
  palette::{Palette, color_at},
  style::RenderStyle,
};

/// 掩码中的完全覆盖值
const INK: Luma<u8> = Luma([255]);

/// 透明度与覆盖值相乘后的满权重
const FULL_WEIGHT: u32 = 255 * 255;

/// 坐标取整前的截断范围，超出部分必然落在图像外
const COORD_LIMIT: f32 = 1.0e12;

/// 线宽一半的上限
const MAX_HALF_WIDTH: f32 = (1 << 24) as f32;

/// 单个图元的覆盖掩码，记录被写入过的区域
pub(crate) struct Coverage {
  mask: GrayImage,
  dirty: Option<[u32; 4]>,
}

impl Canvas for Coverage {
  type Pixel = Luma<u8>;

  fn dimensions(&self) -> (u32, u32) {
    self.mask.dimensions()
  }

  fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel {
    *self.mask.get_pixel(x, y)
  }

  fn draw_pixel(&mut self, x: u32, y: u32, color: Self::Pixel) {
    self.mask.put_pixel(x, y, color);
    self.dirty = Some(match self.dirty {
      None => [x, y, x, y],
      Some([left, top, right, bottom]) => [left.min(x), top.min(y), right.max(x), bottom.max(y)],
    });
  }
}

/// 绘制层：图元先以不透明方式写入掩码，再按颜色透明度一次性混合到图像
pub(crate) struct Layer {
  image: RgbImage,
  coverage: Coverage,
}

impl Layer {
  pub(crate) fn new(image: RgbImage) -> Self {
    let (width, height) = image.dimensions();
    Self {
      image,
      coverage: Coverage {
        mask: GrayImage::new(width, height),
        dirty: None,
      },
    }
  }

  pub(crate) fn coverage(&mut self) -> &mut Coverage {
    &mut self.coverage
  }

  /// 将掩码以给定颜色混合到图像上，每个像素只混合一次，随后清空掩码
  pub(crate) fn composite(&mut self, color: Rgba<u8>) {
    let Some([left, top, right, bottom]) = self.coverage.dirty.take() else {
      return;
    };
    let Rgba([r, g, b, alpha]) = color;

    for y in top..=bottom {
      for x in left..=right {
        let Luma([cover]) = *self.coverage.mask.get_pixel(x, y);
        if cover == 0 {
          continue;
        }
        self.coverage.mask.put_pixel(x, y, Luma([0]));

        let weight = alpha as u32 * cover as u32;
        let pixel = self.image.get_pixel_mut(x, y);
        for (channel, value) in pixel.0.iter_mut().zip([r, g, b]) {
          *channel = blend_channel(*channel, value, weight);
        }
      }
    }
  }

  pub(crate) fn finish(self) -> RgbImage {
    self.image
  }
}

fn blend_channel(base: u8, over: u8, weight: u32) -> u8 {
  let mixed = base as u32 * (FULL_WEIGHT - weight) + over as u32 * weight;
  ((mixed + FULL_WEIGHT / 2) / FULL_WEIGHT) as u8
}

/// 浮点坐标取整，先截断到有限范围，保证后续整数运算不溢出
fn to_pixel(value: f32) -> i64 {
  value.clamp(-COORD_LIMIT, COORD_LIMIT).round() as i64
}

/// 填充含端点的整数矩形，先裁剪到画布范围
fn fill_rect<C: Canvas<Pixel = Luma<u8>>>(
  canvas: &mut C,
  left: i64,
  top: i64,
  right: i64,
  bottom: i64,
) {
  let (width, height) = canvas.dimensions();
  let (left, top) = (left.max(0), top.max(0));
  let (right, bottom) = (right.min(width as i64 - 1), bottom.min(height as i64 - 1));
  if left > right || top > bottom {
    return;
  }

  let rect = Rect::at(left as i32, top as i32)
    .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
  draw_filled_rect_mut(canvas, rect, INK);
}

/// 在 (x, y) 处绘制实心圆，只遍历图像内的行
pub(crate) fn draw_point<C: Canvas<Pixel = Luma<u8>>>(canvas: &mut C, x: f32, y: f32, radius: u32) {
  if !x.is_finite() || !y.is_finite() {
    return;
  }

  let (cx, cy, r) = (to_pixel(x), to_pixel(y), radius as i64);
  let (_, height) = canvas.dimensions();
  for row in (cy - r).max(0)..=(cy + r).min(height as i64 - 1) {
    let dy = row - cy;
    let half = ((r * r - dy * dy) as f64).sqrt() as i64;
    fill_rect(canvas, cx - half, row, cx + half, row);
  }
}

/// 绘制空心矩形，边框从外沿向内加粗；边框超过一半尺寸时退化为实心
pub(crate) fn draw_box<C: Canvas<Pixel = Luma<u8>>>(canvas: &mut C, corners: [f32; 4], width: u32) {
  if corners.iter().any(|v| !v.is_finite()) {
    return;
  }

  let [x1, y1, x2, y2] = corners.map(to_pixel);
  let (left, right) = (x1.min(x2), x1.max(x2));
  let (top, bottom) = (y1.min(y2), y1.max(y2));
  let band = width.max(1) as i64 - 1;

  fill_rect(canvas, left, top, right, (top + band).min(bottom));
  fill_rect(canvas, left, (bottom - band).max(top), right, bottom);
  fill_rect(canvas, left, top, (left + band).min(right), bottom);
  fill_rect(canvas, (right - band).max(left), top, right, bottom);
}

/// 将线段裁剪到矩形范围内（Liang-Barsky），完全在外时返回 None
fn clip_segment(
  start: (f32, f32),
  end: (f32, f32),
  min: (f32, f32),
  max: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
  if ![start.0, start.1, end.0, end.1].iter().all(|v| v.is_finite()) {
    return None;
  }

  let (x0, y0) = (start.0 as f64, start.1 as f64);
  let (dx, dy) = (end.0 as f64 - x0, end.1 as f64 - y0);
  let (mut t0, mut t1) = (0.0f64, 1.0f64);

  for (p, q) in [
    (-dx, x0 - min.0 as f64),
    (dx, max.0 as f64 - x0),
    (-dy, y0 - min.1 as f64),
    (dy, max.1 as f64 - y0),
  ] {
    if p == 0.0 {
      if q < 0.0 {
        return None;
      }
    } else if p < 0.0 {
      t0 = t0.max(q / p);
    } else {
      t1 = t1.min(q / p);
    }
  }

  if t0 > t1 {
    return None;
  }
  let at = |t: f64| ((x0 + t * dx) as f32, (y0 + t * dy) as f32);
  Some((at(t0), at(t1)))
}

/// 绘制指定宽度的线段，宽线以四边形填充；线段先裁剪到图像附近
pub(crate) fn draw_thick_line<C: Canvas<Pixel = Luma<u8>>>(
  canvas: &mut C,
  start: (f32, f32),
  end: (f32, f32),
  width: u32,
) {
  let (canvas_width, canvas_height) = canvas.dimensions();
  let half = (width as f32 / 2.0).min(MAX_HALF_WIDTH);
  let margin = half + 2.0;
  let Some((start, end)) = clip_segment(
    start,
    end,
    (-margin, -margin),
    (canvas_width as f32 + margin, canvas_height as f32 + margin),
  ) else {
    return;
  };

  let (dx, dy) = (end.0 - start.0, end.1 - start.1);
  let length = dx.hypot(dy);

  if length < 1.0 || half < 1.0 {
    draw_line_segment_mut(canvas, start, end, INK);
    return;
  }

  let (nx, ny) = (-dy / length * half, dx / length * half);
  let corner = |x: f32, y: f32| Point::new(x.round() as i32, y.round() as i32);
  let polygon = [
    corner(start.0 + nx, start.1 + ny),
    corner(end.0 + nx, end.1 + ny),
    corner(end.0 - nx, end.1 - ny),
    corner(start.0 - nx, start.1 - ny),
  ];

  // 首尾顶点重合时多边形无法填充
  if polygon[0] == polygon[3] {
    draw_line_segment_mut(canvas, start, end, INK);
    return;
  }
  draw_polygon_mut(canvas, &polygon, INK);
}

/// 绘制文字覆盖；完全落在图像外的文字直接跳过
fn draw_text<C: Canvas<Pixel = Luma<u8>>>(
  canvas: &mut C,
  font: &FontVec,
  scale: PxScale,
  position: (f32, f32),
  text: &str,
) {
  let (width, height) = canvas.dimensions();
  let (text_width, text_height) = text_size(scale, font, text);
  let (x, y) = position;
  let visible = x <= width as f32
    && y <= height as f32
    && x + text_width as f32 + scale.x >= 0.0
    && y + text_height as f32 + scale.y >= 0.0;
  if !visible {
    return;
  }

  draw_text_mut(canvas, INK, x.round() as i32, y.round() as i32, scale, font, text);
}

/// 标注渲染器：在图像副本上绘制点、框、骨架及文字
#[derive(Debug, Clone, Default)]
pub struct AnnotationRenderer {
  style: RenderStyle,
  palette: Palette,
}

impl AnnotationRenderer {
  pub fn new(style: RenderStyle, palette: Palette) -> Self {
    Self { style, palette }
  }

  pub fn with_style(style: RenderStyle) -> Self {
    Self {
      style,
      palette: Palette::default(),
    }
  }

  pub fn style(&self) -> &RenderStyle {
    &self.style
  }

  /// 本次调用的颜色列表；设置固定颜色时所有实例共用
  pub(crate) fn instance_colors(&self) -> Vec<Rgba<u8>> {
    match self.style.color {
      Some([r, g, b]) => vec![Rgba([r, g, b, self.style.alpha])],
      None => self.palette.colors(self.style.alpha, self.style.color_order),
    }
  }

  /// 在图像上绘制点或矩形标注，可附带标签与置信度。
  ///
  /// 单个模式下的空标注原样返回归一化后的图像，不检查置信度；
  /// 其余情况下置信度数量必须与实例数量一致，否则直接返回错误，不产生任何输出。
  /// 批量模式下跳过空标注。
  pub fn draw_annotations(
    &self,
    image: impl Into<ImageSource>,
    annotations: &Annotations,
    label: &Label,
    probs: Option<&[f32]>,
  ) -> Result<RgbImage, RenderError> {
    let image = image.into().into_rgb_image()?;

    if let Annotations::Single(Annotation::Empty) = annotations {
      debug!("空标注，跳过绘制");
      return Ok(image);
    }

    if let Some(probs) = probs
      && probs.len() != annotations.len()
    {
      return Err(RenderError::ProbabilityCount {
        expected: annotations.len(),
        found: probs.len(),
      });
    }

    let single = annotations.is_single();
    let needs_text = probs.is_some()
      || annotations
        .iter()
        .enumerate()
        .any(|(index, a)| !a.is_empty() && label.text_for(index, single).is_some());
    let font = if needs_text {
      Some(load_font(&self.style.font_path)?)
    } else {
      None
    };

    let colors = self.instance_colors();
    let radius = self.style.point_radius();
    let scale = PxScale::from(self.style.font_size);
    let text_height = font
      .as_ref()
      .map(|f| line_height(f, self.style.font_size))
      .unwrap_or_default();

    debug!(
      "绘制 {} 个标注实例（{}）",
      annotations.len(),
      if single { "单个" } else { "批量" }
    );

    let mut layer = Layer::new(image);
    for (index, annotation) in annotations.iter().enumerate() {
      let Some(bounds) = annotation.bounds(radius as f32) else {
        continue;
      };
      let color = color_at(&colors, index);
      trace!("实例 {}: {:?}", index, annotation);

      match *annotation {
        Annotation::Point { x, y } | Annotation::ScoredPoint { x, y, .. } => {
          draw_point(layer.coverage(), x, y, radius);
        }
        Annotation::Box { x1, y1, x2, y2 } | Annotation::ScoredBox { x1, y1, x2, y2, .. } => {
          draw_box(layer.coverage(), [x1, y1, x2, y2], self.style.border_width);
        }
        Annotation::Empty => {}
      }
      layer.composite(color);

      let Some(font) = font.as_ref() else {
        continue;
      };

      if let Some(text) = label.text_for(index, single) {
        draw_text(
          layer.coverage(),
          font,
          scale,
          (bounds.left, bounds.top),
          &text,
        );
        layer.composite(color);
      }

      if let Some(prob) = probs.and_then(|probs| probs.get(index)) {
        draw_text(
          layer.coverage(),
          font,
          scale,
          (bounds.left, bounds.bottom - text_height),
          &format!("{prob:.2}"),
        );
        layer.composite(color);
      }
    }

    Ok(layer.finish())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::palette::{ColorOrder, DEFAULT_COLORS};
  use image::Rgb;

  fn changed_pixels(before: &RgbImage, after: &RgbImage) -> Vec<(u32, u32)> {
    before
      .enumerate_pixels()
      .filter(|(x, y, pixel)| after.get_pixel(*x, *y) != *pixel)
      .map(|(x, y, _)| (x, y))
      .collect()
  }

  fn rgb_of(color: Rgba<u8>) -> Rgb<u8> {
    let Rgba([r, g, b, _]) = color;
    Rgb([r, g, b])
  }

  fn black(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width, height)
  }

  fn opaque() -> AnnotationRenderer {
    AnnotationRenderer::with_style(
      RenderStyle::default()
        .with_alpha(255)
        .with_font_path("/no/such/font.ttf"),
    )
  }

  #[test]
  fn empty_single_annotation_is_identity() {
    let image = RgbImage::from_fn(20, 10, |x, y| Rgb([x as u8, y as u8, 3]));
    let out = opaque()
      .draw_annotations(
        &image,
        &Annotations::Single(Annotation::Empty),
        &Label::Literal("ignored".into()),
        None,
      )
      .unwrap();
    assert_eq!(out, image);
  }

  #[test]
  fn point_changes_stay_inside_its_square() {
    let image = black(100, 100);
    let renderer = opaque();
    let out = renderer
      .draw_annotations(
        &image,
        &Annotations::single(&[40.0, 50.0]).unwrap(),
        &Label::None,
        None,
      )
      .unwrap();

    let r = renderer.style().point_radius();
    let changed = changed_pixels(&image, &out);
    assert!(!changed.is_empty());
    assert!(
      changed
        .iter()
        .all(|&(x, y)| (40 - r..=40 + r).contains(&x) && (50 - r..=50 + r).contains(&y))
    );
    assert_eq!(out.get_pixel(40, 50), &Rgb(DEFAULT_COLORS[0]));
  }

  #[test]
  fn box_outline_uses_border_width() {
    let image = black(60, 60);
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default().with_alpha(255).with_border_width(3),
    );
    let out = renderer
      .draw_annotations(
        &image,
        &Annotations::single(&[10.0, 10.0, 40.0, 40.0, 0.7]).unwrap(),
        &Label::None,
        None,
      )
      .unwrap();

    let color = Rgb(DEFAULT_COLORS[0]);
    for t in 0..3 {
      assert_eq!(out.get_pixel(25, 10 + t), &color);
      assert_eq!(out.get_pixel(10 + t, 25), &color);
      assert_eq!(out.get_pixel(40 - t, 25), &color);
    }
    assert_eq!(out.get_pixel(25, 13), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(25, 25), &Rgb([0, 0, 0]));
    assert_eq!(out.get_pixel(9, 25), &Rgb([0, 0, 0]));
  }

  #[test]
  fn probability_count_mismatch_fails() {
    let annotations = Annotations::from_rows(&[vec![1.0f32, 1.0], vec![5.0, 5.0]]).unwrap();
    let err = opaque()
      .draw_annotations(&black(10, 10), &annotations, &Label::None, Some(&[0.5]))
      .unwrap_err();
    assert!(matches!(
      err,
      RenderError::ProbabilityCount {
        expected: 2,
        found: 1
      }
    ));
  }

  #[test]
  fn text_requests_need_the_font() {
    let annotations = Annotations::from_rows(&[vec![1.0f32, 1.0]]).unwrap();
    let err = opaque()
      .draw_annotations(&black(10, 10), &annotations, &Label::Index, None)
      .unwrap_err();
    assert!(matches!(err, RenderError::FontError(_)));
  }

  #[test]
  fn override_color_applies_to_every_instance() {
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default()
        .with_alpha(255)
        .with_point_size(4)
        .with_color(Some([9, 8, 7])),
    );
    let annotations = Annotations::from_rows(&[vec![5.0f32, 5.0], vec![20.0, 20.0]]).unwrap();
    let out = renderer
      .draw_annotations(&black(30, 30), &annotations, &Label::None, None)
      .unwrap();
    assert_eq!(out.get_pixel(5, 5), &Rgb([9, 8, 7]));
    assert_eq!(out.get_pixel(20, 20), &Rgb([9, 8, 7]));
  }

  fn distinct_colors(before: &RgbImage, after: &RgbImage) -> Vec<Rgb<u8>> {
    let mut colors: Vec<Rgb<u8>> = changed_pixels(before, after)
      .into_iter()
      .map(|(x, y)| *after.get_pixel(x, y))
      .collect();
    colors.sort_by_key(|c| c.0);
    colors.dedup();
    colors
  }

  #[test]
  fn translucent_shapes_blend_each_pixel_once() {
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default()
        .with_alpha(100)
        .with_border_width(3)
        .with_color(Some([255, 255, 255])),
    );
    let image = black(40, 40);
    for values in [&[20.0, 20.0][..], &[5.0, 5.0, 34.0, 34.0][..]] {
      let out = renderer
        .draw_annotations(
          &image,
          &Annotations::single(values).unwrap(),
          &Label::None,
          None,
        )
        .unwrap();
      assert_eq!(distinct_colors(&image, &out), vec![Rgb([100, 100, 100])]);
    }

    let mut layer = Layer::new(image.clone());
    draw_thick_line(layer.coverage(), (3.0, 4.0), (36.0, 30.0), 6);
    layer.composite(Rgba([255, 255, 255, 100]));
    assert_eq!(
      distinct_colors(&image, &layer.finish()),
      vec![Rgb([100, 100, 100])]
    );
  }

  #[test]
  fn overlapping_instances_blend_in_order() {
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default()
        .with_alpha(128)
        .with_point_size(6)
        .with_color(Some([255, 255, 255])),
    );
    let annotations = Annotations::from_rows(&[vec![10.0f32, 10.0], vec![10.0, 10.0]]).unwrap();
    let out = renderer
      .draw_annotations(&black(20, 20), &annotations, &Label::None, None)
      .unwrap();
    // 128 + (255 - 128) * 128 / 255
    assert_eq!(out.get_pixel(10, 10), &Rgb([192, 192, 192]));
  }

  #[test]
  fn far_away_coordinates_are_clipped() {
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default().with_alpha(255).with_border_width(2),
    );
    let image = black(20, 20);
    let color = Rgb(DEFAULT_COLORS[0]);

    let out = renderer
      .draw_annotations(
        &image,
        &Annotations::single(&[-3e9, 0.0, 3e9, 10.0]).unwrap(),
        &Label::None,
        None,
      )
      .unwrap();
    for y in [0, 1, 9, 10] {
      assert_eq!(out.get_pixel(10, y), &color);
    }
    assert_eq!(out.get_pixel(10, 5), &Rgb([0, 0, 0]));

    for values in [
      &[3e9, 5.0][..],
      &[-3e9, -3e9, 0.5][..],
      &[-1e30, -1e30, 1e30, 1e30][..],
      &[f32::NAN, 5.0][..],
      &[f32::INFINITY, 0.0, 5.0, 5.0][..],
    ] {
      let out = renderer
        .draw_annotations(
          &image,
          &Annotations::single(values).unwrap(),
          &Label::None,
          None,
        )
        .unwrap();
      assert_eq!(out, image, "{values:?}");
    }
  }

  #[test]
  fn empty_single_ignores_probabilities() {
    let image = black(10, 10);
    let out = opaque()
      .draw_annotations(
        &image,
        &Annotations::Single(Annotation::Empty),
        &Label::None,
        Some(&[0.1, 0.2]),
      )
      .unwrap();
    assert_eq!(out, image);
  }

  #[test]
  fn segments_are_clipped_to_the_window() {
    assert_eq!(
      clip_segment((-100.0, 5.0), (100.0, 5.0), (0.0, 0.0), (10.0, 10.0)),
      Some(((0.0, 5.0), (10.0, 5.0)))
    );
    assert_eq!(
      clip_segment((2.0, 3.0), (4.0, 6.0), (0.0, 0.0), (10.0, 10.0)),
      Some(((2.0, 3.0), (4.0, 6.0)))
    );
    assert_eq!(
      clip_segment((-5.0, -5.0), (-1.0, 20.0), (0.0, 0.0), (10.0, 10.0)),
      None
    );
    assert_eq!(
      clip_segment((f32::NAN, 0.0), (1.0, 1.0), (0.0, 0.0), (10.0, 10.0)),
      None
    );
  }

  #[test]
  fn shuffled_colors_follow_the_seed() {
    let order = ColorOrder::Shuffled { seed: Some(7) };
    let renderer = AnnotationRenderer::with_style(
      RenderStyle::default()
        .with_alpha(255)
        .with_point_size(2)
        .with_color_order(order),
    );
    let expected = rgb_of(Palette::default().colors(255, order)[0]);
    let out = renderer
      .draw_annotations(
        &black(10, 10),
        &Annotations::single(&[5.0, 5.0]).unwrap(),
        &Label::None,
        None,
      )
      .unwrap();
    assert_eq!(out.get_pixel(5, 5), &expected);
  }

  #[test]
  fn thick_line_covers_its_midpoint() {
    let mut layer = Layer::new(black(50, 50));
    draw_thick_line(layer.coverage(), (5.0, 5.0), (45.0, 25.0), 4);
    layer.composite(Rgba([10, 20, 30, 255]));
    let out = layer.finish();
    assert_eq!(out.get_pixel(25, 15), &Rgb([10, 20, 30]));
    assert_eq!(out.get_pixel(25, 30), &Rgb([0, 0, 0]));
  }
}
