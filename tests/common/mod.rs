#![allow(dead_code)]

use biaozhu::{Annotations, Pose, palette::DEFAULT_COLORS};
use image::{Rgb, RgbImage};

/// 17 keypoints of a standing figure on a 400x400 canvas
pub const BODY: [[f32; 2]; 17] = [
  [200.0, 60.0],  // nose
  [210.0, 50.0],  // left_eye
  [190.0, 50.0],  // right_eye
  [225.0, 55.0],  // left_ear
  [175.0, 55.0],  // right_ear
  [240.0, 110.0], // left_shoulder
  [160.0, 110.0], // right_shoulder
  [270.0, 170.0], // left_elbow
  [130.0, 170.0], // right_elbow
  [290.0, 230.0], // left_wrist
  [110.0, 230.0], // right_wrist
  [225.0, 240.0], // left_hip
  [175.0, 240.0], // right_hip
  [230.0, 310.0], // left_knee
  [170.0, 310.0], // right_knee
  [235.0, 380.0], // left_ankle
  [165.0, 380.0], // right_ankle
];

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

pub fn body() -> Pose {
  Pose::from_points(&BODY).unwrap()
}

pub fn batch(rows: &[&[f32]]) -> Annotations {
  Annotations::from_rows(rows).unwrap()
}

pub fn black(width: u32, height: u32) -> RgbImage {
  RgbImage::new(width, height)
}

pub fn gradient(width: u32, height: u32) -> RgbImage {
  RgbImage::from_fn(width, height, |x, y| {
    Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
  })
}

pub fn palette_rgb(index: usize) -> Rgb<u8> {
  Rgb(DEFAULT_COLORS[index % DEFAULT_COLORS.len()])
}

pub fn changed_pixels(before: &RgbImage, after: &RgbImage) -> Vec<(u32, u32)> {
  before
    .enumerate_pixels()
    .filter(|(x, y, pixel)| after.get_pixel(*x, *y) != *pixel)
    .map(|(x, y, _)| (x, y))
    .collect()
}

pub fn pixel_at(image: &RgbImage, point: [f32; 2]) -> Rgb<u8> {
  *image.get_pixel(point[0].round() as u32, point[1].round() as u32)
}

pub fn midpoint(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
  [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

/// The joint color survives on at least one side of the joint center
pub fn joint_has_color(image: &RgbImage, center: [f32; 2], color: Rgb<u8>) -> bool {
  [[4.0, 0.0], [-4.0, 0.0], [0.0, 4.0], [0.0, -4.0]]
    .iter()
    .any(|[dx, dy]| pixel_at(image, [center[0] + dx, center[1] + dy]) == color)
}
