// 该文件是 Lupai （路牌） 项目的一部分。
// tests/common/mod.rs - 集成测试共用的合成样本
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

#![allow(dead_code)]

use image::{Rgb, RgbImage};

use lupai::{
  classifier::SvmClassifier,
  config::DetectorConfig,
  label::Label,
  preprocess::Preprocessor,
  proposal::RegionProposer,
  training::{MemoryExampleStore, TrainingPipeline},
};

pub const RED: [u8; 3] = [230, 0, 0];
pub const GREEN: [u8; 3] = [0, 230, 0];
pub const BLUE: [u8; 3] = [0, 0, 230];

pub const SIGN_SIZES: [u32; 5] = [40, 44, 48, 50, 52];

/// 红 -> Forward，绿 -> Turn，蓝 -> Stop
pub const SIGN_COLORS: [([u8; 3], Label); 3] = [
  (RED, Label::FORWARD),
  (GREEN, Label::TURN),
  (BLUE, Label::STOP),
];

pub fn paint(frame: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
  for yy in y..y + h {
    for xx in x..x + w {
      frame.put_pixel(xx, yy, Rgb(color));
    }
  }
}

pub fn solid(color: [u8; 3]) -> RgbImage {
  RgbImage::from_pixel(64, 64, Rgb(color))
}

/// 黑底方块经去噪后按检测外接框裁剪出的图块，与检测流程得到的图块一致
///
/// 绿色不会被显著性掩码选中，外接框取同尺寸红色方块的结果。
pub fn sign_patch(config: &DetectorConfig, color: [u8; 3], size: u32) -> RgbImage {
  let preprocessor = Preprocessor::new(&config.preprocess);
  let proposer = RegionProposer::new(config.proposal.clone());

  let mut locator = RgbImage::new(size * 3, size * 3);
  paint(&mut locator, size, size, size, size, RED);
  let candidates = proposer.propose(&preprocessor.denoise(&locator));
  assert_eq!(candidates.len(), 1, "size {size} should give one candidate");
  let region = candidates[0].region;

  let mut frame = RgbImage::new(size * 3, size * 3);
  paint(&mut frame, size, size, size, size, color);
  proposer.crop_patch(&preprocessor.denoise(&frame), &region)
}

pub fn sign_store(config: &DetectorConfig) -> MemoryExampleStore {
  let mut store = MemoryExampleStore::new();
  for (color, label) in SIGN_COLORS {
    for size in SIGN_SIZES {
      store.insert(label, sign_patch(config, color, size));
    }
  }
  store
}

pub fn sign_classifier(config: &DetectorConfig) -> SvmClassifier {
  TrainingPipeline::new(sign_store(config), config).run().unwrap()
}

pub fn solid_classifier(config: &DetectorConfig) -> SvmClassifier {
  let store = MemoryExampleStore::new()
    .with(Label::FORWARD, solid(RED))
    .with(Label::TURN, solid(GREEN))
    .with(Label::STOP, solid(BLUE));
  TrainingPipeline::new(store, config).run().unwrap()
}
