// 该文件是 Lupai （路牌） 项目的一部分。
// src/proposal.rs - 基于颜色的候选区域提取
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

use image::{RgbImage, imageops};
use tracing::debug;

use crate::config::ProposalConfig;
use crate::frame::{Candidate, Region};

pub mod blob;
pub mod saliency;

pub use self::blob::{Blob, detect_blobs};
pub use self::saliency::saliency_mask;

/// 候选区域提取器
///
/// 红/蓝饱和度掩码 -> 连通区域 -> 高宽比过滤 -> 裁剪并重采样为固定尺寸图块。
#[derive(Debug, Clone)]
pub struct RegionProposer {
  config: ProposalConfig,
}

impl Default for RegionProposer {
  fn default() -> Self {
    Self::new(ProposalConfig::default())
  }
}

impl RegionProposer {
  pub fn new(config: ProposalConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ProposalConfig {
    &self.config
  }

  /// 高宽比位于开区间 (min_aspect, max_aspect) 内才保留
  pub fn accepts_aspect(&self, region: &Region) -> bool {
    let ratio = region.aspect_ratio();
    ratio > self.config.min_aspect && ratio < self.config.max_aspect
  }

  /// 将区域从帧中裁剪出来并重采样为 patch_size x patch_size
  pub fn crop_patch(&self, frame: &RgbImage, region: &Region) -> RgbImage {
    let size = self.config.patch_size;
    let view = imageops::crop_imm(frame, region.x, region.y, region.width, region.height);
    imageops::resize(&*view, size, size, imageops::FilterType::Triangle)
  }

  /// 先裁剪到帧内，再对实际输出的区域做高宽比过滤
  pub fn admit_region(&self, bbox: &Region, frame_width: u32, frame_height: u32) -> Option<Region> {
    let Some(region) = bbox.clamp_to(frame_width, frame_height) else {
      debug!("区域 {:?} 超出帧范围且退化，丢弃", bbox);
      return None;
    };
    if !self.accepts_aspect(&region) {
      debug!(
        "区域 {:?} 高宽比 {:.3} 不符合要求，丢弃",
        region,
        region.aspect_ratio()
      );
      return None;
    }
    Some(region)
  }

  /// 对已去噪的帧提取候选图块，顺序与连通区域检测顺序一致
  pub fn propose(&self, frame: &RgbImage) -> Vec<Candidate> {
    let mask = saliency_mask(frame, self.config.saturation_threshold);
    let blobs = detect_blobs(
      &mask,
      self.config.min_region_area,
      self.config.max_region_area,
    );
    debug!("显著连通区域数量: {}", blobs.len());

    let mut candidates = Vec::with_capacity(blobs.len());
    for blob in blobs {
      let Some(region) = self.admit_region(&blob.bbox, frame.width(), frame.height()) else {
        continue;
      };

      let patch = self.crop_patch(frame, &region);
      candidates.push(Candidate {
        region,
        area: region.area(),
        patch,
      });
    }

    debug!("候选区域数量: {}", candidates.len());
    candidates
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn frame_with_blob(x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) -> RgbImage {
    let mut frame = RgbImage::new(160, 120);
    for yy in y..y + h {
      for xx in x..x + w {
        frame.put_pixel(xx, yy, Rgb(color));
      }
    }
    frame
  }

  #[test]
  fn black_frame_yields_no_candidates() {
    let frame = RgbImage::new(160, 120);
    assert!(RegionProposer::default().propose(&frame).is_empty());
  }

  #[test]
  fn square_red_blob_yields_one_candidate() {
    let frame = frame_with_blob(30, 20, 48, 48, [230, 10, 10]);
    let candidates = RegionProposer::default().propose(&frame);
    assert_eq!(candidates.len(), 1);

    let candidate = &candidates[0];
    assert_eq!(candidate.region, Region::new(30, 20, 48, 48));
    assert_eq!(candidate.area, 48 * 48);
    assert_eq!(candidate.patch.dimensions(), (64, 64));
  }

  #[test]
  fn elongated_blob_is_filtered() {
    let frame = frame_with_blob(10, 10, 80, 30, [0, 0, 240]);
    assert!(RegionProposer::default().propose(&frame).is_empty());
  }

  #[test]
  fn green_blob_is_not_salient() {
    let frame = frame_with_blob(30, 20, 48, 48, [10, 230, 10]);
    assert!(RegionProposer::default().propose(&frame).is_empty());
  }

  #[test]
  fn blob_below_min_area_is_ignored() {
    // 20x20 = 400 像素 < 1000
    let frame = frame_with_blob(30, 20, 20, 20, [230, 10, 10]);
    assert!(RegionProposer::default().propose(&frame).is_empty());
  }

  #[test]
  fn aspect_bounds_are_exclusive() {
    let proposer = RegionProposer::default();
    assert!(proposer.accepts_aspect(&Region::new(0, 0, 40, 40)));
    assert!(proposer.accepts_aspect(&Region::new(0, 0, 40, 47)));
    assert!(!proposer.accepts_aspect(&Region::new(0, 0, 40, 48)));
    assert!(!proposer.accepts_aspect(&Region::new(0, 0, 50, 40)));
  }

  #[test]
  fn emitted_regions_respect_aspect_filter() {
    let mut frame = frame_with_blob(5, 5, 40, 40, [230, 0, 0]);
    for yy in 60..110 {
      for xx in 60..100 {
        frame.put_pixel(xx, yy, Rgb([0, 0, 230]));
      }
    }
    let proposer = RegionProposer::default();
    for candidate in proposer.propose(&frame) {
      let ratio = candidate.region.aspect_ratio();
      assert!(ratio > 0.8 && ratio < 1.2);
    }
  }

  #[test]
  fn aspect_is_checked_on_clamped_region() {
    let proposer = RegionProposer::default();
    // 原始 40/60 不合格，裁剪到帧内后为 40x40
    assert_eq!(
      proposer.admit_region(&Region::new(100, 0, 60, 40), 140, 120),
      Some(Region::new(100, 0, 40, 40))
    );
    // 原始 40/44 合格，裁剪后只剩 20 宽
    assert_eq!(proposer.admit_region(&Region::new(120, 0, 44, 40), 140, 120), None);
    assert_eq!(proposer.admit_region(&Region::new(140, 0, 40, 40), 140, 120), None);
  }

  #[test]
  fn patch_is_resampled_from_subregion() {
    let frame = frame_with_blob(30, 20, 48, 48, [230, 10, 10]);
    let patch = RegionProposer::default().crop_patch(&frame, &Region::new(30, 20, 48, 48));
    assert_eq!(patch.dimensions(), (64, 64));
    for p in [patch.get_pixel(0, 0), patch.get_pixel(63, 63)] {
      assert!(p[0].abs_diff(230) <= 1 && p[1].abs_diff(10) <= 1);
    }
  }
}
