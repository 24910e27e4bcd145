// 该文件是 Lupai （路牌） 项目的一部分。
// src/training.rs - 离线训练流程
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
use std::convert::Infallible;

use image::{RgbImage, imageops};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  classifier::{Classifier, ClassifierError, SvmClassifier},
  config::{DetectorConfig, SvmConfig},
  descriptor::{DescriptorError, HogDescriptor},
  label::{Label, SignKind},
};

#[derive(Error, Debug)]
pub enum TrainingError {
  #[error("类别 {0} 没有训练样本")]
  EmptyDataset(Label),
  #[error("训练样本读取错误: {0}")]
  StoreError(Box<dyn std::error::Error + Send + Sync>),
  #[error("描述子错误: {0}")]
  DescriptorError(#[from] DescriptorError),
  #[error("分类器错误: {0}")]
  ClassifierError(#[from] ClassifierError),
}

/// 按类别提供已裁剪好的样本图像
pub trait LabeledExampleStore {
  type Error: std::error::Error + Send + Sync + 'static;

  fn load_category(&self, label: Label) -> Result<Vec<RgbImage>, Self::Error>;
}

/// 内存中的样本集合
#[derive(Debug, Clone, Default)]
pub struct MemoryExampleStore {
  examples: HashMap<Label, Vec<RgbImage>>,
}

impl MemoryExampleStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, label: Label, image: RgbImage) {
    self.examples.entry(label).or_default().push(image);
  }

  pub fn with(mut self, label: Label, image: RgbImage) -> Self {
    self.insert(label, image);
    self
  }
}

impl LabeledExampleStore for MemoryExampleStore {
  type Error = Infallible;

  fn load_category(&self, label: Label) -> Result<Vec<RgbImage>, Self::Error> {
    Ok(self.examples.get(&label).cloned().unwrap_or_default())
  }
}

/// 读取各类别样本、计算 HOG 描述子并训练 SVM
pub struct TrainingPipeline<S> {
  store: S,
  categories: Vec<Label>,
  patch_size: u32,
  extractor: HogDescriptor,
  svm: SvmConfig,
}

impl<S: LabeledExampleStore> TrainingPipeline<S> {
  /// 使用默认的三个路牌类别
  pub fn new(store: S, config: &DetectorConfig) -> Self {
    Self {
      store,
      categories: SignKind::ALL.iter().map(SignKind::label).collect(),
      patch_size: config.proposal.patch_size,
      extractor: HogDescriptor::new(config.descriptor.clone()),
      svm: config.svm.clone(),
    }
  }

  pub fn with_categories(mut self, categories: Vec<Label>) -> Self {
    self.categories = categories;
    self
  }

  fn resize(&self, image: RgbImage) -> RgbImage {
    let size = self.patch_size;
    if image.dimensions() == (size, size) {
      return image;
    }
    imageops::resize(&image, size, size, imageops::FilterType::Triangle)
  }

  /// 一次性批量训练，任何类别为空时不进行训练
  pub fn run(&self) -> Result<SvmClassifier, TrainingError> {
    info!("SVM 训练阶段开始...");

    let mut patches = Vec::new();
    let mut labels = Vec::new();
    for &label in &self.categories {
      let images = self
        .store
        .load_category(label)
        .map_err(|e| TrainingError::StoreError(Box::new(e)))?;
      if images.is_empty() {
        return Err(TrainingError::EmptyDataset(label));
      }
      info!("类别 {} ({}): {} 张样本", label.id(), label, images.len());
      for image in images {
        patches.push(self.resize(image));
        labels.push(label);
      }
    }

    let refs: Vec<&RgbImage> = patches.iter().collect();
    let samples = self.extractor.extract_patches(&refs)?;
    debug!("训练样本矩阵: {}x{}", samples.rows(), samples.cols());

    let mut classifier = SvmClassifier::new(self.svm.clone());
    classifier.train(&samples, &labels)?;
    info!("SVM 训练阶段完成");
    Ok(classifier)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  struct FailingStore;

  impl LabeledExampleStore for FailingStore {
    type Error = std::io::Error;

    fn load_category(&self, _: Label) -> Result<Vec<RgbImage>, Self::Error> {
      Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
    }
  }

  fn solid(color: [u8; 3], size: u32) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb(color))
  }

  #[test]
  fn empty_category_aborts_training() {
    let store = MemoryExampleStore::new()
      .with(Label::FORWARD, solid([255, 0, 0], 64))
      .with(Label::STOP, solid([0, 0, 255], 64));
    let pipeline = TrainingPipeline::new(store, &DetectorConfig::default());
    assert!(matches!(
      pipeline.run(),
      Err(TrainingError::EmptyDataset(label)) if label == Label::TURN
    ));
  }

  #[test]
  fn store_errors_are_wrapped() {
    let pipeline = TrainingPipeline::new(FailingStore, &DetectorConfig::default());
    assert!(matches!(pipeline.run(), Err(TrainingError::StoreError(_))));
  }

  #[test]
  fn resizes_examples_to_patch_size() {
    let store = MemoryExampleStore::new()
      .with(Label::FORWARD, solid([255, 0, 0], 30))
      .with(Label::TURN, solid([0, 255, 0], 100))
      .with(Label::STOP, solid([0, 0, 255], 64));
    let classifier = TrainingPipeline::new(store, &DetectorConfig::default())
      .run()
      .unwrap();
    let model = classifier.model().unwrap();
    assert_eq!(model.feature_len, DetectorConfig::default().descriptor.descriptor_len());
    assert_eq!(model.classes.len(), 3);
  }

  #[test]
  fn custom_categories() {
    let store = MemoryExampleStore::new()
      .with(Label::new(5).unwrap(), solid([255, 0, 0], 64))
      .with(Label::new(9).unwrap(), solid([0, 0, 255], 64));
    let classifier = TrainingPipeline::new(store, &DetectorConfig::default())
      .with_categories(vec![Label::new(5).unwrap(), Label::new(9).unwrap()])
      .run()
      .unwrap();
    assert_eq!(classifier.model().unwrap().decisions.len(), 1);
  }
}
