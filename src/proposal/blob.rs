// 该文件是 Lupai （路牌） 项目的一部分。
// src/proposal/blob.rs - 显著连通区域检测
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

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::frame::Region;
use crate::proposal::saliency::BACKGROUND;

/// 连通区域统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
  pub bbox: Region,
  /// 区域内显著像素个数
  pub pixels: u32,
}

#[derive(Debug, Clone, Copy)]
struct BlobAccumulator {
  min_x: u32,
  min_y: u32,
  max_x: u32,
  max_y: u32,
  pixels: u32,
}

impl BlobAccumulator {
  fn new(x: u32, y: u32) -> Self {
    Self {
      min_x: x,
      min_y: y,
      max_x: x,
      max_y: y,
      pixels: 0,
    }
  }

  fn add(&mut self, x: u32, y: u32) {
    self.min_x = self.min_x.min(x);
    self.min_y = self.min_y.min(y);
    self.max_x = self.max_x.max(x);
    self.max_y = self.max_y.max(y);
    self.pixels += 1;
  }

  fn finish(self) -> Blob {
    Blob {
      bbox: Region::new(
        self.min_x,
        self.min_y,
        self.max_x - self.min_x + 1,
        self.max_y - self.min_y + 1,
      ),
      pixels: self.pixels,
    }
  }
}

/// 在二值掩码上检测 8 连通的显著区域
///
/// 结果按光栅扫描中首次遇到的顺序排列，只保留像素数位于
/// `[min_area, max_area]` 内的区域。
pub fn detect_blobs(mask: &GrayImage, min_area: u32, max_area: u32) -> Vec<Blob> {
  let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

  let mut order: Vec<BlobAccumulator> = Vec::new();
  let mut index_of: HashMap<u32, usize> = HashMap::new();

  for (x, y, label) in labels.enumerate_pixels() {
    let label = label[0];
    if label == 0 {
      continue;
    }
    let idx = *index_of.entry(label).or_insert_with(|| {
      order.push(BlobAccumulator::new(x, y));
      order.len() - 1
    });
    order[idx].add(x, y);
  }

  order
    .into_iter()
    .map(BlobAccumulator::finish)
    .filter(|blob| blob.pixels >= min_area && blob.pixels <= max_area)
    .collect()
}
