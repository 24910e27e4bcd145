// 该文件是 Lupai （路牌） 项目的一部分。
// src/input/image_directory.rs - 图像目录帧序列输入
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
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  input::{list_image_files, read_rgb_image},
};

#[derive(Error, Debug)]
pub enum ImageDirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无效的帧率: {0}")]
  InvalidFps(String),
}

/// 按文件名顺序把目录中的图像当作连续帧
///
/// `dir:///path/to/frames?fps=25` 时按帧率推算时间戳，否则使用实际经过的时间。
/// 无法解码的文件会被跳过。
pub struct ImageDirectoryInput {
  files: std::vec::IntoIter<PathBuf>,
  index: u64,
  fps: Option<f64>,
  started: Instant,
}

impl FromUrlWithScheme for ImageDirectoryInput {
  const SCHEME: &'static str = "dir";
}

impl FromUrl for ImageDirectoryInput {
  type Error = ImageDirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageDirectoryInputError::SchemeMismatch);
    }

    let mut fps = None;
    for (k, v) in url.query_pairs() {
      if k == "fps" {
        let value: f64 = v
          .parse()
          .map_err(|_| ImageDirectoryInputError::InvalidFps(v.to_string()))?;
        if value <= 0.0 || !value.is_finite() {
          return Err(ImageDirectoryInputError::InvalidFps(v.to_string()));
        }
        fps = Some(value);
      }
    }

    Ok(Self::open(Path::new(url.path()))?.with_fps(fps))
  }
}

impl ImageDirectoryInput {
  pub fn open(directory: &Path) -> Result<Self, ImageDirectoryInputError> {
    let files = list_image_files(directory)?;
    info!("图像目录 {}: 共 {} 帧", directory.display(), files.len());
    Ok(Self {
      files: files.into_iter(),
      index: 0,
      fps: None,
      started: Instant::now(),
    })
  }

  pub fn with_fps(mut self, fps: Option<f64>) -> Self {
    self.fps = fps;
    self
  }

  fn timestamp_ms(&self, index: u64) -> u64 {
    match self.fps {
      Some(fps) => (index as f64 * 1000.0 / fps) as u64,
      None => self.started.elapsed().as_millis() as u64,
    }
  }
}

impl Iterator for ImageDirectoryInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match read_rgb_image(&path) {
        Ok(image) => {
          let index = self.index;
          self.index += 1;
          let timestamp_ms = self.timestamp_ms(index);
          return Some(Frame::new(image, index, timestamp_ms));
        }
        Err(e) => error!("无法读取帧 {}: {}", path.display(), e),
      }
    }
    None
  }
}
