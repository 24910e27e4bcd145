// 该文件是 Lupai （路牌） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像的路牌检测
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use lupai::{
  FromUrl,
  classifier::SvmClassifierBuilder,
  config::DetectorConfig,
  input::InputWrapper,
  output::OutputWrapper,
  pipeline::DetectionPipeline,
  task::{OneShotTask, Task},
};

/// Lupai 单帧检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// SVM 模型文件，例如 svm:///path/to/model.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，例如 image:///path/to/frame.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 image:///path/to/out.png
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// TOML 配置文件
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = match &args.config {
    Some(path) => DetectorConfig::load(path)?,
    None => DetectorConfig::default(),
  };
  let input = InputWrapper::from_url(&args.input)?;
  let classifier = SvmClassifierBuilder::from_url(&args.model)?.build()?;
  let model = DetectionPipeline::from_config(&config, classifier)?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, model, output)?;

  Ok(())
}
