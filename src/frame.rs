// 该文件是 Lupai （路牌） 项目的一部分。
// src/frame.rs - 帧、区域与候选图块定义
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
use serde::{Deserialize, Serialize};

/// 帧数据
#[derive(Debug, Clone)]
pub struct Frame {
  /// RGB 图像数据
  pub image: RgbImage,
  /// 帧索引
  pub index: u64,
  /// 时间戳（毫秒）
  pub timestamp_ms: u64,
}

impl Frame {
  pub fn new(image: RgbImage, index: u64, timestamp_ms: u64) -> Self {
    Self {
      image,
      index,
      timestamp_ms,
    }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }
}

impl From<RgbImage> for Frame {
  fn from(image: RgbImage) -> Self {
    Frame::new(image, 0, 0)
  }
}

/// 帧坐标系下的轴对齐矩形区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl Region {
  pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 高宽比 height / width
  pub fn aspect_ratio(&self) -> f64 {
    if self.width == 0 {
      return f64::INFINITY;
    }
    self.height as f64 / self.width as f64
  }

  pub fn area(&self) -> u64 {
    self.width as u64 * self.height as u64
  }

  /// 将区域裁剪到帧范围内，退化区域返回 None
  pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<Region> {
    if self.x >= frame_width || self.y >= frame_height {
      return None;
    }
    let width = self.width.min(frame_width - self.x);
    let height = self.height.min(frame_height - self.y);
    if width == 0 || height == 0 {
      return None;
    }
    Some(Region::new(self.x, self.y, width, height))
  }

  /// 归一化坐标 [x_min, y_min, x_max, y_max]
  pub fn normalized(&self, frame_width: u32, frame_height: u32) -> [f32; 4] {
    let (w, h) = (frame_width as f32, frame_height as f32);
    [
      self.x as f32 / w,
      self.y as f32 / h,
      (self.x + self.width) as f32 / w,
      (self.y + self.height) as f32 / h,
    ]
  }
}

/// 候选图块：区域、重采样后的固定尺寸图块以及区域面积
#[derive(Debug, Clone)]
pub struct Candidate {
  pub region: Region,
  pub patch: RgbImage,
  pub area: u64,
}
