// 该文件是 Lupai （路牌） 项目的一部分。
// src/model.rs - 推理模型接口与检测结果
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

use serde::{Deserialize, Serialize};

use crate::frame::Region;
use crate::label::Label;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 区域与其预测标签直接绑定，不依赖并行数组的下标对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
  pub region: Region,
  pub label: Label,
}

/// 单帧的检测结果，顺序与区域检测顺序一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
  pub items: Box<[DetectionResult]>,
}

impl Detections {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn regions(&self) -> impl Iterator<Item = &Region> {
    self.items.iter().map(|item| &item.region)
  }

  pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
    self.items.iter().map(|item| item.label)
  }
}

impl From<Vec<DetectionResult>> for Detections {
  fn from(items: Vec<DetectionResult>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}
