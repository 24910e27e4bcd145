// 该文件是 Lupai （路牌） 项目的一部分。
// src/config.rs - 检测与分类参数配置
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

// 以下默认值均为经验调参结果，保持不变
const DEFAULT_SATURATION_THRESHOLD: u8 = 200;
const DEFAULT_MIN_ASPECT: f64 = 0.8;
const DEFAULT_MAX_ASPECT: f64 = 1.2;
const DEFAULT_PATCH_SIZE: u32 = 64;
const DEFAULT_MIN_REGION_AREA: u32 = 1000;
const DEFAULT_MAX_REGION_AREA: u32 = 14400;
const DEFAULT_SVM_C: f64 = 12.5;
const DEFAULT_SVM_GAMMA: f64 = 0.50625;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件解析错误: {0}")]
  TomlError(#[from] toml::de::Error),
  #[error("配置无效: {0}")]
  Invalid(String),
}

/// 完整的检测器配置
///
/// 训练与推理必须使用同一份描述子配置，否则特征长度不一致。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
  pub preprocess: PreprocessConfig,
  pub proposal: ProposalConfig,
  pub descriptor: HogConfig,
  pub svm: SvmConfig,
}

/// 去噪参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
  /// 是否做 3x3 高斯平滑，关闭时原样输出
  pub smooth: bool,
}

impl Default for PreprocessConfig {
  fn default() -> Self {
    Self { smooth: true }
  }
}

/// 候选区域提取参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
  /// 红/蓝归一化饱和度的二值化阈值，严格大于该值的像素为显著像素
  pub saturation_threshold: u8,
  /// 高宽比下界（开区间）
  pub min_aspect: f64,
  /// 高宽比上界（开区间）
  pub max_aspect: f64,
  /// 候选图块重采样后的边长
  pub patch_size: u32,
  /// 连通区域最小像素数
  pub min_region_area: u32,
  /// 连通区域最大像素数
  pub max_region_area: u32,
}

impl Default for ProposalConfig {
  fn default() -> Self {
    Self {
      saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
      min_aspect: DEFAULT_MIN_ASPECT,
      max_aspect: DEFAULT_MAX_ASPECT,
      patch_size: DEFAULT_PATCH_SIZE,
      min_region_area: DEFAULT_MIN_REGION_AREA,
      max_region_area: DEFAULT_MAX_REGION_AREA,
    }
  }
}

/// 梯度方向直方图（HOG）描述子参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HogConfig {
  /// 检测窗口边长，输入图块必须与之相同
  pub window_size: u32,
  /// 单元格边长（像素）
  pub cell_size: u32,
  /// 块边长（单元格个数）
  pub block_cells: u32,
  /// 块步长（单元格个数）
  pub block_stride_cells: u32,
  /// 方向直方图分箱数（无符号梯度，0-180 度）
  pub bins: usize,
  /// L2-Hys 截断阈值
  pub l2_hys_threshold: f32,
  /// 是否在描述子末尾追加 RGB 均值
  pub color_summary: bool,
}

impl Default for HogConfig {
  fn default() -> Self {
    Self {
      window_size: DEFAULT_PATCH_SIZE,
      cell_size: 8,
      block_cells: 2,
      block_stride_cells: 1,
      bins: 9,
      l2_hys_threshold: 0.2,
      color_summary: true,
    }
  }
}

impl HogConfig {
  pub fn cells_per_side(&self) -> usize {
    (self.window_size / self.cell_size) as usize
  }

  pub fn blocks_per_side(&self) -> usize {
    let cells = self.cells_per_side();
    let block = self.block_cells as usize;
    let stride = self.block_stride_cells as usize;
    if cells < block {
      return 0;
    }
    (cells - block) / stride + 1
  }

  pub fn block_len(&self) -> usize {
    let block = self.block_cells as usize;
    block * block * self.bins
  }

  /// 描述子长度，对同一配置恒定
  pub fn descriptor_len(&self) -> usize {
    let blocks = self.blocks_per_side();
    let color = if self.color_summary { 3 } else { 0 };
    blocks * blocks * self.block_len() + color
  }
}

/// RBF 核 C-SVC 超参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
  /// 正则化系数 C
  pub c: f64,
  /// RBF 核宽度 gamma
  pub gamma: f64,
  /// SMO 停止条件
  pub tolerance: f64,
  /// SMO 最大迭代次数
  pub max_iterations: usize,
}

impl Default for SvmConfig {
  fn default() -> Self {
    Self {
      c: DEFAULT_SVM_C,
      gamma: DEFAULT_SVM_GAMMA,
      tolerance: 1e-3,
      max_iterations: 100_000,
    }
  }
}

impl DetectorConfig {
  /// 从 TOML 文件加载配置，缺省字段使用默认值
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let config: DetectorConfig = toml::from_str(&text)?;
    config.validate()?;
    debug!("配置内容: {:?}", config);
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let proposal = &self.proposal;
    if !(proposal.min_aspect > 0.0 && proposal.min_aspect < proposal.max_aspect) {
      return Err(ConfigError::Invalid(format!(
        "高宽比区间无效: ({}, {})",
        proposal.min_aspect, proposal.max_aspect
      )));
    }
    if proposal.min_region_area > proposal.max_region_area {
      return Err(ConfigError::Invalid(format!(
        "区域面积区间无效: [{}, {}]",
        proposal.min_region_area, proposal.max_region_area
      )));
    }

    let hog = &self.descriptor;
    if proposal.patch_size != hog.window_size {
      return Err(ConfigError::Invalid(format!(
        "图块边长 {} 与 HOG 窗口 {} 不一致",
        proposal.patch_size, hog.window_size
      )));
    }
    if hog.cell_size == 0
      || hog.block_cells == 0
      || hog.block_stride_cells == 0
      || hog.bins == 0
      || hog.window_size % hog.cell_size != 0
      || hog.blocks_per_side() == 0
    {
      return Err(ConfigError::Invalid(format!("HOG 配置无效: {:?}", hog)));
    }

    if !(self.svm.c > 0.0 && self.svm.gamma > 0.0 && self.svm.tolerance > 0.0) {
      return Err(ConfigError::Invalid(format!(
        "SVM 超参数必须为正数: C={}, gamma={}, tolerance={}",
        self.svm.c, self.svm.gamma, self.svm.tolerance
      )));
    }

    Ok(())
  }
}
