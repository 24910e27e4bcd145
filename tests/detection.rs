// 该文件是 Lupai （路牌） 项目的一部分。
// tests/detection.rs - 端到端检测场景
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

mod common;

use image::RgbImage;

use lupai::{
  classifier::Classifier,
  config::DetectorConfig,
  descriptor::HogDescriptor,
  frame::{Frame, Region},
  label::Label,
  model::Model,
  pipeline::DetectionPipeline,
  preprocess::Preprocessor,
  proposal::RegionProposer,
  session::DetectionSession,
};

use common::{BLUE, GREEN, RED, paint, sign_classifier, solid, solid_classifier};

fn close(a: u32, b: u32) -> bool {
  a.abs_diff(b) <= 3
}

fn pipeline(config: &DetectorConfig) -> DetectionPipeline {
  DetectionPipeline::from_config(config, sign_classifier(config)).unwrap()
}

#[test]
fn solid_training_patches_are_recovered() {
  let config = DetectorConfig::default();
  let classifier = solid_classifier(&config);
  let extractor = HogDescriptor::new(config.descriptor.clone());

  let patches = [solid(RED), solid(GREEN), solid(BLUE)];
  let refs: Vec<&RgbImage> = patches.iter().collect();
  let samples = extractor.extract_patches(&refs).unwrap();
  assert_eq!(
    classifier.predict(&samples).unwrap(),
    vec![Label::FORWARD, Label::TURN, Label::STOP]
  );
}

#[test]
fn black_frame_gives_no_detections() {
  let config = DetectorConfig::default();
  let pipeline = DetectionPipeline::from_config(&config, solid_classifier(&config)).unwrap();
  let results = pipeline.detect_and_classify(&RgbImage::new(320, 240)).unwrap();
  assert!(results.is_empty());
}

#[test]
fn single_red_square_is_detected_and_classified() {
  let config = DetectorConfig::default();
  let pipeline = pipeline(&config);

  let mut frame = RgbImage::new(200, 150);
  paint(&mut frame, 60, 40, 48, 48, RED);

  let results = pipeline.detect_and_classify(&frame).unwrap();
  assert_eq!(results.len(), 1);
  let Region {
    x,
    y,
    width,
    height,
  } = results[0].region;
  assert!(close(x, 60) && close(y, 40), "region {:?}", results[0].region);
  assert!(close(width, 48) && close(height, 48), "region {:?}", results[0].region);
  assert_eq!(results[0].label, Label::FORWARD);
}

#[test]
fn denoised_sign_grows_one_pixel_per_side() {
  let config = DetectorConfig::default();
  let mut frame = RgbImage::new(200, 150);
  paint(&mut frame, 60, 40, 48, 48, RED);

  let denoised = Preprocessor::new(&config.preprocess).denoise(&frame);
  let candidates = RegionProposer::new(config.proposal.clone()).propose(&denoised);
  assert_eq!(candidates.len(), 1);
  assert_eq!(candidates[0].region, Region::new(59, 39, 50, 50));
}

#[test]
fn results_match_aspect_filtered_regions() {
  let config = DetectorConfig::default();
  let pipeline = pipeline(&config);

  let mut frame = RgbImage::new(320, 200);
  paint(&mut frame, 20, 20, 48, 48, RED);
  paint(&mut frame, 120, 30, 90, 30, RED); // 过宽
  paint(&mut frame, 230, 110, 50, 50, BLUE);

  let denoised = Preprocessor::new(&config.preprocess).denoise(&frame);
  let candidates = RegionProposer::new(config.proposal.clone()).propose(&denoised);
  assert_eq!(candidates.len(), 2);

  let results = pipeline.detect_and_classify(&frame).unwrap();
  assert_eq!(results.len(), candidates.len());
  for (result, candidate) in results.iter().zip(&candidates) {
    assert_eq!(result.region, candidate.region);
  }
  assert_eq!(results[0].label, Label::FORWARD);
  assert_eq!(results[1].label, Label::STOP);
}

#[test]
fn repeated_detection_is_deterministic() {
  let config = DetectorConfig::default();
  let pipeline = pipeline(&config);

  let mut frame = RgbImage::new(240, 160);
  paint(&mut frame, 30, 30, 40, 40, BLUE);
  paint(&mut frame, 150, 60, 52, 52, RED);

  let first = pipeline.detect_and_classify(&frame).unwrap();
  assert_eq!(first.len(), 2);
  for _ in 0..3 {
    assert_eq!(pipeline.detect_and_classify(&frame).unwrap(), first);
  }
}

#[test]
fn model_trait_and_session_agree() {
  let config = DetectorConfig::default();
  let pipeline = pipeline(&config);

  let mut image = RgbImage::new(200, 150);
  paint(&mut image, 80, 50, 44, 44, BLUE);

  let inferred = pipeline.infer(&Frame::new(image.clone(), 1, 0)).unwrap();
  let session = DetectionSession::new();
  let published = pipeline
    .detect_into(&session, Frame::new(image, 2, 40))
    .unwrap();

  assert_eq!(inferred, published);
  let snapshot = session.snapshot().unwrap();
  assert_eq!(snapshot.frame.index, 2);
  assert_eq!(snapshot.detections.labels().collect::<Vec<_>>(), vec![Label::STOP]);
}
