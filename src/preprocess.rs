// 该文件是 Lupai （路牌） 项目的一部分。
// src/preprocess.rs - 帧去噪
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
use imageproc::filter::filter_clamped;
use imageproc::kernel::Kernel;

use crate::config::PreprocessConfig;

// [1,2,1;2,4,2;1,2,1]/16，各权重在 f32 下精确
const GAUSSIAN_3X3: [f32; 9] = [
  0.0625, 0.125, 0.0625, //
  0.125, 0.25, 0.125, //
  0.0625, 0.125, 0.0625,
];

/// 分割前对帧做 3x3 高斯平滑，抑制传感器噪声
///
/// 核半径为 1，色块边界最多向外扩散一个像素。
#[derive(Debug, Clone)]
pub struct Preprocessor {
  smooth: bool,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self::new(&PreprocessConfig::default())
  }
}

impl Preprocessor {
  pub fn new(config: &PreprocessConfig) -> Self {
    Self {
      smooth: config.smooth,
    }
  }

  pub fn denoise(&self, frame: &RgbImage) -> RgbImage {
    if !self.smooth || frame.width() == 0 || frame.height() == 0 {
      return frame.clone();
    }
    filter_clamped::<_, f32, u8>(frame, Kernel::new(&GAUSSIAN_3X3, 3, 3))
  }
}
