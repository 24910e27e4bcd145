// 该文件是 Lupai （路牌） 项目的一部分。
// src/classifier.rs - 分类器接口
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

use thiserror::Error;

use crate::descriptor::SampleMatrix;
use crate::label::Label;

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("训练集无效: {0}")]
  InvalidTrainingSet(String),
  #[error("模型尚未训练")]
  ModelNotTrained,
  #[error("特征维度不匹配: 期望 {expected}, 实际 {actual}")]
  DimensionMismatch { expected: usize, actual: usize },
  #[error("模型文件 I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("模型序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

/// 监督分类器: 先训练，再逐行预测
pub trait Classifier {
  type Error;

  /// 以 `samples` 的第 i 行对应 `labels[i]` 训练，重复调用会替换已有模型
  fn train(&mut self, samples: &SampleMatrix, labels: &[Label]) -> Result<(), Self::Error>;

  /// 每行返回一个标签，顺序与行顺序一致
  fn predict(&self, samples: &SampleMatrix) -> Result<Vec<Label>, Self::Error>;
}

mod smo;
mod svm;
pub use self::svm::{BinaryDecision, Kernel, SvmClassifier, SvmClassifierBuilder, SvmModel};
