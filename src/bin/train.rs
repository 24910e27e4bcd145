// 该文件是 Lupai （路牌） 项目的一部分。
// src/bin/train.rs - 从样本目录训练路牌分类模型
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
  input::ImageDirectoryStore,
  training::TrainingPipeline,
};

/// Lupai 训练参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 样本根目录，包含 1/、2/、3/ 三个类别子目录
  #[arg(long, value_name = "DIR")]
  pub data: PathBuf,
  /// 模型保存位置，例如 svm:///path/to/model.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// TOML 配置文件
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("样本目录: {}", args.data.display());
  info!("模型文件路径: {}", args.model);

  let config = match &args.config {
    Some(path) => DetectorConfig::load(path)?,
    None => DetectorConfig::default(),
  };
  let model_path = SvmClassifierBuilder::from_url(&args.model)?;

  let store = ImageDirectoryStore::new(&args.data);
  let classifier = TrainingPipeline::new(store, &config).run()?;
  classifier.save(model_path.model_path())?;

  if let Some(model) = classifier.model() {
    info!(
      "模型已保存: {} 个类别, {} 个支持向量",
      model.classes.len(),
      model.support_vector_count()
    );
  }

  Ok(())
}
