// 该文件是 Biaozhu （标注） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use args::{Args, Command, DrawArgs, PoseArgs};
use biaozhu::{
  AnnotationRenderer, Annotations, FromUrl, Pose,
  input::{ImageFileInput, read_json_file},
  output::SaveImageFileOutput,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  match args.command {
    Command::Draw(args) => run_draw(args),
    Command::Pose(args) => run_pose(args),
  }
}

fn run_draw(args: DrawArgs) -> Result<()> {
  info!("输入来源: {}", args.input);
  info!("标注文件: {}", args.annotations.display());
  info!("输出路径: {}", args.output);

  let input = ImageFileInput::from_url(&args.input)?;
  let output = SaveImageFileOutput::from_url(&args.output)?;
  let annotations = Annotations::from_json(&read_json_file(&args.annotations)?)?;
  let renderer = AnnotationRenderer::with_style(args.style.to_style()?);

  info!("开始绘制 {} 个标注...", annotations.len());
  let now = std::time::Instant::now();
  let image = renderer.draw_annotations(
    input,
    &annotations,
    &args.label(),
    args.probs.as_deref(),
  )?;
  info!("绘制完成，耗时: {:.2?}", now.elapsed());

  output.save(&image)?;
  Ok(())
}

fn run_pose(args: PoseArgs) -> Result<()> {
  info!("输入来源: {}", args.input);
  info!("关键点文件: {}", args.keypoints.display());
  info!("输出路径: {}", args.output);

  let input = ImageFileInput::from_url(&args.input)?;
  let output = SaveImageFileOutput::from_url(&args.output)?;
  let poses = Pose::from_json(&read_json_file(&args.keypoints)?)?;
  let renderer = AnnotationRenderer::with_style(args.style.to_style()?);

  info!("开始绘制 {} 个姿态...", poses.len());
  let now = std::time::Instant::now();
  let image = renderer.draw_pose(input, &poses, args.variant.into())?;
  info!("绘制完成，耗时: {:.2?}", now.elapsed());

  output.save(&image)?;
  Ok(())
}
