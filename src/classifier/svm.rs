// 该文件是 Lupai （路牌） 项目的一部分。
// src/classifier/svm.rs - RBF 核 C-SVC 多分类器
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

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::{Classifier, ClassifierError, smo},
  config::SvmConfig,
  descriptor::SampleMatrix,
  label::Label,
};

/// 核函数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
  /// exp(-gamma * |x - y|^2)
  Rbf { gamma: f64 },
}

impl Kernel {
  pub fn eval(&self, a: &[f32], b: &[f32]) -> f64 {
    match self {
      Kernel::Rbf { gamma } => {
        let dist2: f64 = a
          .iter()
          .zip(b)
          .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
          })
          .sum();
        (-gamma * dist2).exp()
      }
    }
  }
}

/// 一对类别之间的二分类决策函数，正值判为 `positive`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryDecision {
  pub positive: Label,
  pub negative: Label,
  pub support_vectors: Vec<Vec<f32>>,
  /// alpha_i * y_i
  pub coefficients: Vec<f64>,
  pub rho: f64,
}

impl BinaryDecision {
  pub fn decision_value(&self, kernel: &Kernel, sample: &[f32]) -> f64 {
    self
      .support_vectors
      .iter()
      .zip(&self.coefficients)
      .map(|(sv, coef)| coef * kernel.eval(sv, sample))
      .sum::<f64>()
      - self.rho
  }
}

/// 训练得到的模型状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
  pub kernel: Kernel,
  pub c: f64,
  pub feature_len: usize,
  /// 升序排列的类别
  pub classes: Vec<Label>,
  /// 一对一决策函数，按 (classes[i], classes[j]), i < j 的顺序排列
  pub decisions: Vec<BinaryDecision>,
}

impl SvmModel {
  /// 一对一投票，票数相同时取较小的标签
  fn predict_one(&self, sample: &[f32]) -> Label {
    if self.classes.len() == 1 {
      return self.classes[0];
    }

    let mut votes = vec![0usize; self.classes.len()];
    let mut pair = 0;
    for i in 0..self.classes.len() {
      for j in (i + 1)..self.classes.len() {
        let value = self.decisions[pair].decision_value(&self.kernel, sample);
        if value > 0.0 {
          votes[i] += 1;
        } else {
          votes[j] += 1;
        }
        pair += 1;
      }
    }

    let mut best = 0;
    for (idx, count) in votes.iter().enumerate() {
      if *count > votes[best] {
        best = idx;
      }
    }
    self.classes[best]
  }

  pub fn support_vector_count(&self) -> usize {
    self.decisions.iter().map(|d| d.support_vectors.len()).sum()
  }

  /// 检查模型结构：类别升序、决策函数按类别对排列、支持向量维度一致
  fn check(&self) -> Result<(), String> {
    if self.classes.is_empty() {
      return Err("没有类别".to_string());
    }
    if self.classes.windows(2).any(|w| w[0] >= w[1]) {
      return Err(format!("类别未严格升序: {:?}", self.classes));
    }
    let expected_pairs = self.classes.len() * (self.classes.len() - 1) / 2;
    if self.decisions.len() != expected_pairs {
      return Err(format!(
        "{} 个类别需要 {} 个决策函数, 实际 {} 个",
        self.classes.len(),
        expected_pairs,
        self.decisions.len()
      ));
    }

    let pairs = (0..self.classes.len())
      .flat_map(|i| ((i + 1)..self.classes.len()).map(move |j| (i, j)));
    for (k, ((i, j), decision)) in pairs.zip(&self.decisions).enumerate() {
      if decision.positive != self.classes[i] || decision.negative != self.classes[j] {
        return Err(format!(
          "第 {} 个决策函数应为 ({}, {}), 实际为 ({}, {})",
          k, self.classes[i], self.classes[j], decision.positive, decision.negative
        ));
      }
      if decision.coefficients.len() != decision.support_vectors.len() {
        return Err(format!(
          "第 {} 个决策函数有 {} 个系数, {} 个支持向量",
          k,
          decision.coefficients.len(),
          decision.support_vectors.len()
        ));
      }
      if let Some(sv) = decision
        .support_vectors
        .iter()
        .find(|sv| sv.len() != self.feature_len)
      {
        return Err(format!(
          "第 {} 个决策函数的支持向量长度 {} 与特征长度 {} 不一致",
          k,
          sv.len(),
          self.feature_len
        ));
      }
    }
    Ok(())
  }
}

/// RBF 核 C-SVC，一对一多分类
#[derive(Debug, Clone, Default)]
pub struct SvmClassifier {
  config: SvmConfig,
  model: Option<SvmModel>,
}

impl SvmClassifier {
  pub fn new(config: SvmConfig) -> Self {
    Self {
      config,
      model: None,
    }
  }

  pub fn from_model(model: SvmModel) -> Self {
    let Kernel::Rbf { gamma } = model.kernel;
    let config = SvmConfig {
      c: model.c,
      gamma,
      ..SvmConfig::default()
    };
    Self {
      config,
      model: Some(model),
    }
  }

  pub fn config(&self) -> &SvmConfig {
    &self.config
  }

  pub fn model(&self) -> Option<&SvmModel> {
    self.model.as_ref()
  }

  pub fn is_trained(&self) -> bool {
    self.model.is_some()
  }

  /// 将模型以 JSON 格式保存
  pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ClassifierError> {
    let model = self.model.as_ref().ok_or(ClassifierError::ModelNotTrained)?;
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(model)?;
    std::fs::write(path, data)?;
    info!(
      "模型已保存: {}, 支持向量 {} 个",
      path.display(),
      model.support_vector_count()
    );
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
    let path = path.as_ref();
    info!("加载模型文件: {}", path.display());
    let data = std::fs::read(path)?;
    debug!("模型文件大小: {:.2} KB", data.len() as f64 / 1024.0);
    let model: SvmModel = serde_json::from_slice(&data)?;
    model
      .check()
      .map_err(|e| ClassifierError::ModelPathError(format!("{}: {}", path.display(), e)))?;

    debug!("模型类别: {:?}", model.classes);
    Ok(Self::from_model(model))
  }

  fn train_pair(
    &self,
    kernel: &Kernel,
    samples: &SampleMatrix,
    labels: &[Label],
    positive: Label,
    negative: Label,
  ) -> BinaryDecision {
    let indices: Vec<usize> = labels
      .iter()
      .enumerate()
      .filter(|(_, l)| **l == positive || **l == negative)
      .map(|(i, _)| i)
      .collect();
    let y: Vec<f64> = indices
      .iter()
      .map(|&i| if labels[i] == positive { 1.0 } else { -1.0 })
      .collect();

    let n = indices.len();
    let gram: Vec<f64> = (0..n * n)
      .into_par_iter()
      .map(|k| kernel.eval(samples.row(indices[k / n]), samples.row(indices[k % n])))
      .collect();

    let solution = smo::solve(
      &gram,
      &y,
      self.config.c,
      self.config.tolerance,
      self.config.max_iterations,
    );

    let mut support_vectors = Vec::new();
    let mut coefficients = Vec::new();
    for (k, alpha) in solution.alpha.iter().enumerate() {
      if *alpha > 0.0 {
        support_vectors.push(samples.row(indices[k]).to_vec());
        coefficients.push(alpha * y[k]);
      }
    }

    debug!(
      "类别 {} vs {}: 样本 {} 个, 支持向量 {} 个, 迭代 {} 次",
      positive.id(),
      negative.id(),
      n,
      support_vectors.len(),
      solution.iterations
    );

    BinaryDecision {
      positive,
      negative,
      support_vectors,
      coefficients,
      rho: solution.rho,
    }
  }
}

impl Classifier for SvmClassifier {
  type Error = ClassifierError;

  fn train(&mut self, samples: &SampleMatrix, labels: &[Label]) -> Result<(), Self::Error> {
    if samples.rows() != labels.len() {
      return Err(ClassifierError::InvalidTrainingSet(format!(
        "样本数 {} 与标签数 {} 不一致",
        samples.rows(),
        labels.len()
      )));
    }
    if labels.is_empty() {
      return Err(ClassifierError::InvalidTrainingSet("训练集为空".to_string()));
    }

    let mut classes = labels.to_vec();
    classes.sort();
    classes.dedup();

    info!(
      "开始训练 SVM: 样本 {} 个, 特征维度 {}, 类别 {:?}, C={}, gamma={}",
      samples.rows(),
      samples.cols(),
      classes.iter().map(|c| c.id()).collect::<Vec<_>>(),
      self.config.c,
      self.config.gamma
    );

    let kernel = Kernel::Rbf {
      gamma: self.config.gamma,
    };
    let mut decisions = Vec::with_capacity(classes.len() * classes.len().saturating_sub(1) / 2);
    for i in 0..classes.len() {
      for j in (i + 1)..classes.len() {
        decisions.push(self.train_pair(&kernel, samples, labels, classes[i], classes[j]));
      }
    }

    let model = SvmModel {
      kernel,
      c: self.config.c,
      feature_len: samples.cols(),
      classes,
      decisions,
    };
    info!("SVM 训练完成, 支持向量 {} 个", model.support_vector_count());
    self.model = Some(model);
    Ok(())
  }

  fn predict(&self, samples: &SampleMatrix) -> Result<Vec<Label>, Self::Error> {
    let model = self.model.as_ref().ok_or(ClassifierError::ModelNotTrained)?;
    if samples.cols() != model.feature_len {
      return Err(ClassifierError::DimensionMismatch {
        expected: model.feature_len,
        actual: samples.cols(),
      });
    }

    let labels: Vec<Label> = samples
      .iter_rows()
      .collect::<Vec<_>>()
      .par_iter()
      .map(|row| model.predict_one(row))
      .collect();
    debug!("预测结果: {:?}", labels);
    Ok(labels)
  }
}

pub struct SvmClassifierBuilder {
  model_path: String,
}

impl FromUrlWithScheme for SvmClassifierBuilder {
  const SCHEME: &'static str = "svm";
}

impl FromUrl for SvmClassifierBuilder {
  type Error = ClassifierError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ClassifierError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Ok(SvmClassifierBuilder {
      model_path: url.path().to_string(),
    })
  }
}

impl SvmClassifierBuilder {
  pub fn model_path(&self) -> &str {
    &self.model_path
  }

  pub fn build(self) -> Result<SvmClassifier, ClassifierError> {
    SvmClassifier::load(&self.model_path)
  }
}
