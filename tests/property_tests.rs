// 该文件是 Lupai （路牌） 项目的一部分。
// tests/property_tests.rs - 描述子性质测试
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
use proptest::prelude::*;

use lupai::{config::HogConfig, descriptor::HogDescriptor, frame::Region};

fn patch(size: u32) -> impl Strategy<Value = RgbImage> {
  prop::collection::vec(any::<u8>(), (size * size * 3) as usize)
    .prop_map(move |data| RgbImage::from_raw(size, size, data).unwrap())
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn descriptor_length_is_fixed(image in patch(64)) {
    let extractor = HogDescriptor::new(HogConfig::default());
    let descriptor = extractor.compute(&image).unwrap();
    prop_assert_eq!(descriptor.len(), 1767);
    prop_assert_eq!(descriptor.len(), extractor.descriptor_len());
  }

  #[test]
  fn descriptor_values_are_bounded(image in patch(64)) {
    let descriptor = HogDescriptor::default().compute(&image).unwrap();
    for value in descriptor {
      prop_assert!(value.is_finite());
      prop_assert!((0.0..=1.0 + 1e-5).contains(&value));
    }
  }

  #[test]
  fn clamped_region_stays_inside(
    x in 0u32..400, y in 0u32..400, w in 0u32..400, h in 0u32..400,
    fw in 1u32..300, fh in 1u32..300,
  ) {
    if let Some(region) = Region::new(x, y, w, h).clamp_to(fw, fh) {
      prop_assert!(region.width > 0 && region.height > 0);
      prop_assert!(region.x + region.width <= fw);
      prop_assert!(region.y + region.height <= fh);
    }
  }
}
