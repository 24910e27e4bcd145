// 该文件是 Lupai （路牌） 项目的一部分。
// src/proposal/saliency.rs - 红/蓝饱和度显著性掩码
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

use image::{GrayImage, Luma, Rgb, RgbImage};

pub const SALIENT: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// 归一化饱和度 255 * channel / (r + g + b)，0/0 记为 0
fn normalized_ratio(channel: u8, sum: u32) -> u8 {
  if sum == 0 {
    return 0;
  }
  (255 * channel as u32 / sum) as u8
}

/// 单个像素的显著值：红、蓝归一化饱和度的较大者
pub fn red_blue_saturation(pixel: &Rgb<u8>) -> u8 {
  let [r, g, b] = pixel.0;
  let sum = r as u32 + g as u32 + b as u32;
  normalized_ratio(r, sum).max(normalized_ratio(b, sum))
}

/// 生成二值显著性掩码，严格大于阈值的像素置为 255
pub fn saliency_mask(frame: &RgbImage, threshold: u8) -> GrayImage {
  let mut mask = GrayImage::new(frame.width(), frame.height());
  for (x, y, pixel) in frame.enumerate_pixels() {
    let value = if red_blue_saturation(pixel) > threshold {
      SALIENT
    } else {
      BACKGROUND
    };
    mask.put_pixel(x, y, Luma([value]));
  }
  mask
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn black_pixel_has_no_saturation() {
    assert_eq!(red_blue_saturation(&Rgb([0, 0, 0])), 0);
  }

  #[test]
  fn pure_red_and_blue_are_fully_saturated() {
    assert_eq!(red_blue_saturation(&Rgb([200, 0, 0])), 255);
    assert_eq!(red_blue_saturation(&Rgb([0, 0, 90])), 255);
  }

  #[test]
  fn green_and_gray_are_not_salient() {
    assert_eq!(red_blue_saturation(&Rgb([0, 255, 0])), 0);
    assert_eq!(red_blue_saturation(&Rgb([100, 100, 100])), 85);
  }

  #[test]
  fn threshold_is_strict() {
    // 255 * 200 / 255 = 200，不超过阈值
    let frame = RgbImage::from_pixel(2, 2, Rgb([200, 55, 0]));
    let mask = saliency_mask(&frame, 200);
    assert!(mask.pixels().all(|p| p[0] == BACKGROUND));

    let frame = RgbImage::from_pixel(2, 2, Rgb([220, 30, 0]));
    let mask = saliency_mask(&frame, 200);
    assert!(mask.pixels().all(|p| p[0] == SALIENT));
  }
}
