// 该文件是 Lupai （路牌） 项目的一部分。
// src/descriptor.rs - HOG 描述子与样本矩阵
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

use std::f32::consts::PI;

use image::RgbImage;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::config::HogConfig;
use crate::frame::Candidate;

const NORM_EPS: f32 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
  #[error("配置不匹配: {0}")]
  ConfigMismatch(String),
}

/// 行优先的稠密样本矩阵，每一行是一个特征向量
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
  rows: usize,
  cols: usize,
  data: Vec<f32>,
}

impl SampleMatrix {
  /// 由若干等长特征向量构造，空输入或长度不一致时报错
  pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, DescriptorError> {
    let Some(first) = rows.first() else {
      return Err(DescriptorError::ConfigMismatch(
        "没有样本，无法确定矩阵形状".to_string(),
      ));
    };
    let cols = first.len();
    if cols == 0 {
      return Err(DescriptorError::ConfigMismatch("特征向量长度为 0".to_string()));
    }

    let mut data = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
      if row.len() != cols {
        return Err(DescriptorError::ConfigMismatch(format!(
          "第 {} 行长度为 {}, 期望 {}",
          i,
          row.len(),
          cols
        )));
      }
      data.extend_from_slice(row);
    }

    Ok(Self {
      rows: rows.len(),
      cols,
      data,
    })
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn row(&self, index: usize) -> &[f32] {
    &self.data[index * self.cols..(index + 1) * self.cols]
  }

  pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
    self.data.chunks_exact(self.cols)
  }
}

/// 梯度方向直方图描述子
#[derive(Debug, Clone, Default)]
pub struct HogDescriptor {
  config: HogConfig,
}

impl HogDescriptor {
  pub fn new(config: HogConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &HogConfig {
    &self.config
  }

  pub fn descriptor_len(&self) -> usize {
    self.config.descriptor_len()
  }

  /// 按输入顺序为每个候选图块计算描述子
  pub fn extract(&self, candidates: &[Candidate]) -> Result<SampleMatrix, DescriptorError> {
    let patches: Vec<&RgbImage> = candidates.iter().map(|c| &c.patch).collect();
    self.extract_patches(&patches)
  }

  pub fn extract_patches(&self, patches: &[&RgbImage]) -> Result<SampleMatrix, DescriptorError> {
    if patches.is_empty() {
      return Err(DescriptorError::ConfigMismatch(
        "候选列表为空，无法构造样本矩阵".to_string(),
      ));
    }

    let rows = patches
      .par_iter()
      .map(|patch| self.compute(patch))
      .collect::<Result<Vec<_>, _>>()?;
    debug!(
      "计算 {} 个 HOG 描述子, 长度 {}",
      rows.len(),
      self.descriptor_len()
    );
    SampleMatrix::from_rows(rows)
  }

  /// 计算单个图块的描述子
  pub fn compute(&self, patch: &RgbImage) -> Result<Vec<f32>, DescriptorError> {
    let size = self.config.window_size;
    if patch.dimensions() != (size, size) {
      return Err(DescriptorError::ConfigMismatch(format!(
        "图块尺寸 {:?} 与 HOG 窗口 {}x{} 不一致",
        patch.dimensions(),
        size,
        size
      )));
    }

    let (magnitude, orientation) = gradients(patch);
    let cells = self.cell_histograms(&magnitude, &orientation);
    let mut descriptor = self.normalize_blocks(&cells);

    if self.config.color_summary {
      descriptor.extend(color_summary(patch));
    }

    Ok(descriptor)
  }

  fn cell_histograms(&self, magnitude: &[f32], orientation: &[f32]) -> Vec<f32> {
    let width = self.config.window_size as usize;
    let cell = self.config.cell_size as usize;
    let n_cells = self.config.cells_per_side();
    let bins = self.config.bins;
    let bin_width = 180.0 / bins as f32;

    let mut hists = vec![0.0f32; n_cells * n_cells * bins];
    for y in 0..n_cells * cell {
      let cy = y / cell;
      for x in 0..n_cells * cell {
        let cx = x / cell;
        let mag = magnitude[y * width + x];
        if mag == 0.0 {
          continue;
        }

        // 在相邻两个方向分箱之间线性插值
        let pos = orientation[y * width + x] / bin_width - 0.5;
        let lower = pos.floor();
        let frac = pos - lower;
        let b0 = (lower as i64).rem_euclid(bins as i64) as usize;
        let b1 = (b0 + 1) % bins;

        let base = (cy * n_cells + cx) * bins;
        hists[base + b0] += mag * (1.0 - frac);
        hists[base + b1] += mag * frac;
      }
    }
    hists
  }

  fn normalize_blocks(&self, cells: &[f32]) -> Vec<f32> {
    let n_cells = self.config.cells_per_side();
    let block = self.config.block_cells as usize;
    let stride = self.config.block_stride_cells as usize;
    let n_blocks = self.config.blocks_per_side();
    let bins = self.config.bins;
    let clip = self.config.l2_hys_threshold;

    let mut descriptor = Vec::with_capacity(n_blocks * n_blocks * self.config.block_len());
    let mut block_vec = Vec::with_capacity(self.config.block_len());
    for by in 0..n_blocks {
      for bx in 0..n_blocks {
        block_vec.clear();
        for dy in 0..block {
          for dx in 0..block {
            let c = (by * stride + dy) * n_cells + (bx * stride + dx);
            block_vec.extend_from_slice(&cells[c * bins..(c + 1) * bins]);
          }
        }

        // L2-Hys: 归一化、截断、再归一化
        l2_normalize(&mut block_vec);
        for v in block_vec.iter_mut() {
          *v = v.min(clip);
        }
        l2_normalize(&mut block_vec);

        descriptor.extend_from_slice(&block_vec);
      }
    }
    descriptor
  }
}

fn l2_normalize(values: &mut [f32]) {
  let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
  if norm > NORM_EPS {
    for v in values.iter_mut() {
      *v /= norm;
    }
  }
}

/// 逐像素中心差分梯度，取三个通道中幅值最大的一个；边界像素复制
fn gradients(patch: &RgbImage) -> (Vec<f32>, Vec<f32>) {
  let (width, height) = patch.dimensions();
  let mut magnitude = vec![0.0f32; (width * height) as usize];
  let mut orientation = vec![0.0f32; (width * height) as usize];

  for y in 0..height {
    let y0 = y.saturating_sub(1);
    let y1 = (y + 1).min(height - 1);
    for x in 0..width {
      let x0 = x.saturating_sub(1);
      let x1 = (x + 1).min(width - 1);

      let (left, right) = (patch.get_pixel(x0, y), patch.get_pixel(x1, y));
      let (up, down) = (patch.get_pixel(x, y0), patch.get_pixel(x, y1));

      let mut best = (0.0f32, 0.0f32, 0.0f32);
      for c in 0..3 {
        let gx = right[c] as f32 - left[c] as f32;
        let gy = down[c] as f32 - up[c] as f32;
        let mag2 = gx * gx + gy * gy;
        if mag2 > best.0 {
          best = (mag2, gx, gy);
        }
      }

      let idx = (y * width + x) as usize;
      let (mag2, gx, gy) = best;
      magnitude[idx] = mag2.sqrt();
      let mut angle = gy.atan2(gx) * 180.0 / PI;
      if angle < 0.0 {
        angle += 180.0;
      }
      if angle >= 180.0 {
        angle -= 180.0;
      }
      orientation[idx] = angle;
    }
  }

  (magnitude, orientation)
}

/// RGB 三通道均值，缩放到 [0, 1]
fn color_summary(patch: &RgbImage) -> [f32; 3] {
  let mut sums = [0.0f64; 3];
  for pixel in patch.pixels() {
    for (sum, value) in sums.iter_mut().zip(pixel.0) {
      *sum += value as f64;
    }
  }
  let count = (patch.width() as f64 * patch.height() as f64).max(1.0);
  sums.map(|s| (s / count / 255.0) as f32)
}
