// 该文件是 Lupai （路牌） 项目的一部分。
// src/input/labeled_directory.rs - 按类别子目录组织的训练样本
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

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  input::{list_image_files, read_rgb_image},
  label::Label,
  training::LabeledExampleStore,
};

#[derive(Error, Debug)]
pub enum ImageDirectoryStoreError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("样本 {path} 读取失败: {source}")]
  ImageError {
    path: PathBuf,
    source: image::ImageError,
  },
}

/// `<root>/<标签编号>/*.png` 形式的样本目录
///
/// 类别目录不存在时视为没有样本。
#[derive(Debug, Clone)]
pub struct ImageDirectoryStore {
  root: PathBuf,
}

impl ImageDirectoryStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn category_dir(&self, label: Label) -> PathBuf {
    self.root.join(label.id().to_string())
  }
}

impl LabeledExampleStore for ImageDirectoryStore {
  type Error = ImageDirectoryStoreError;

  fn load_category(&self, label: Label) -> Result<Vec<RgbImage>, Self::Error> {
    let directory = self.category_dir(label);
    if !directory.is_dir() {
      warn!("类别目录 {} 不存在", directory.display());
      return Ok(Vec::new());
    }

    let files = list_image_files(&directory)?;
    debug!("类别 {}: 读取 {} 个文件", label, files.len());
    files
      .into_iter()
      .map(|path| read_rgb_image(&path).map_err(|source| ImageDirectoryStoreError::ImageError { path, source }))
      .collect()
  }
}
