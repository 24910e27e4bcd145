// 该文件是 Lupai （路牌） 项目的一部分。
// src/pipeline.rs - 单帧检测与分类流程
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
use thiserror::Error;
use tracing::debug;

use crate::{
  classifier::{Classifier, ClassifierError, SvmClassifier},
  config::{ConfigError, DetectorConfig},
  descriptor::{DescriptorError, HogDescriptor},
  frame::Frame,
  model::{DetectionResult, Detections, Model},
  preprocess::Preprocessor,
  proposal::RegionProposer,
  session::DetectionSession,
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("描述子错误: {0}")]
  DescriptorError(#[from] DescriptorError),
  #[error("分类器错误: {0}")]
  ClassifierError(#[from] ClassifierError),
  #[error("标签数 {labels} 与区域数 {regions} 不一致")]
  LabelCountMismatch { regions: usize, labels: usize },
}

/// 去噪 -> 候选区域 -> HOG -> 分类
pub struct DetectionPipeline<C = SvmClassifier> {
  preprocessor: Preprocessor,
  proposer: RegionProposer,
  extractor: HogDescriptor,
  classifier: C,
}

impl DetectionPipeline<SvmClassifier> {
  /// 校验配置后组装各阶段，无效配置不会进入检测
  pub fn from_config(config: &DetectorConfig, classifier: SvmClassifier) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self::new(
      Preprocessor::new(&config.preprocess),
      RegionProposer::new(config.proposal.clone()),
      HogDescriptor::new(config.descriptor.clone()),
      classifier,
    ))
  }
}

impl<C> DetectionPipeline<C>
where
  C: Classifier<Error = ClassifierError>,
{
  pub fn new(
    preprocessor: Preprocessor,
    proposer: RegionProposer,
    extractor: HogDescriptor,
    classifier: C,
  ) -> Self {
    Self {
      preprocessor,
      proposer,
      extractor,
      classifier,
    }
  }

  pub fn classifier(&self) -> &C {
    &self.classifier
  }

  /// 每次推理都作为会话中的一个检测周期，帧在检测开始前即成为当前帧
  pub fn with_session(self, session: DetectionSession) -> SessionPipeline<C> {
    SessionPipeline {
      pipeline: self,
      session,
    }
  }

  /// 检测并分类一帧，没有候选区域时返回空列表
  pub fn detect_and_classify(&self, frame: &RgbImage) -> Result<Vec<DetectionResult>, PipelineError> {
    let denoised = self.preprocessor.denoise(frame);
    let candidates = self.proposer.propose(&denoised);
    if candidates.is_empty() {
      debug!("没有候选区域");
      return Ok(Vec::new());
    }

    let samples = self.extractor.extract(&candidates)?;
    let labels = self.classifier.predict(&samples)?;
    if labels.len() != candidates.len() {
      return Err(PipelineError::LabelCountMismatch {
        regions: candidates.len(),
        labels: labels.len(),
      });
    }

    let results: Vec<DetectionResult> = candidates
      .iter()
      .zip(labels)
      .map(|(candidate, label)| DetectionResult {
        region: candidate.region,
        label,
      })
      .collect();
    debug!("检测结果: {:?}", results);
    Ok(results)
  }

  /// 完成一个检测周期并把帧与结果交给会话，供可视化读取
  pub fn detect_into(
    &self,
    session: &DetectionSession,
    frame: Frame,
  ) -> Result<Detections, PipelineError> {
    let cycle = session.begin_cycle(frame);
    let detections = Detections::from(self.detect_and_classify(cycle.image())?);
    session.complete_cycle(cycle, detections.clone());
    Ok(detections)
  }
}

impl<C> Model for DetectionPipeline<C>
where
  C: Classifier<Error = ClassifierError>,
{
  type Input = Frame;
  type Output = Detections;
  type Error = PipelineError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("处理第 {} 帧, 尺寸 {}x{}", input.index, input.width(), input.height());
    Ok(Detections::from(self.detect_and_classify(&input.image)?))
  }
}

/// 绑定了会话的检测流程
pub struct SessionPipeline<C = SvmClassifier> {
  pipeline: DetectionPipeline<C>,
  session: DetectionSession,
}

impl<C> SessionPipeline<C> {
  pub fn session(&self) -> &DetectionSession {
    &self.session
  }
}

impl<C> Model for SessionPipeline<C>
where
  C: Classifier<Error = ClassifierError>,
{
  type Input = Frame;
  type Output = Detections;
  type Error = PipelineError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("会话处理第 {} 帧", input.index);
    self.pipeline.detect_into(&self.session, input.clone())
  }
}
