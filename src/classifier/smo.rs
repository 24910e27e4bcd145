// 该文件是 Lupai （路牌） 项目的一部分。
// src/classifier/smo.rs - 二分类 C-SVC 的 SMO 求解器
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

//! 对偶问题
//!
//! ```text
//! min 0.5 * a^T Q a - e^T a,  0 <= a_i <= C,  y^T a = 0,  Q_ij = y_i y_j K_ij
//! ```
//!
//! 使用二阶信息选择工作集（Fan, Chen, Lin 2005），核矩阵预先整体计算。

use tracing::{debug, warn};

const TAU: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct BinarySolution {
  pub alpha: Vec<f64>,
  pub rho: f64,
  pub iterations: usize,
}

struct Solver<'a> {
  n: usize,
  kernel: &'a [f64],
  y: &'a [f64],
  c: f64,
  alpha: Vec<f64>,
  grad: Vec<f64>,
}

impl<'a> Solver<'a> {
  fn q(&self, i: usize, j: usize) -> f64 {
    self.y[i] * self.y[j] * self.kernel[i * self.n + j]
  }

  fn qd(&self, i: usize) -> f64 {
    self.kernel[i * self.n + i]
  }

  fn is_upper_bound(&self, i: usize) -> bool {
    self.alpha[i] >= self.c
  }

  fn is_lower_bound(&self, i: usize) -> bool {
    self.alpha[i] <= 0.0
  }

  /// 返回违反 KKT 条件最严重的一对下标，已收敛时返回 None
  fn select_working_set(&self, eps: f64) -> Option<(usize, usize)> {
    let mut gmax = f64::NEG_INFINITY;
    let mut gmax_idx = None;
    for t in 0..self.n {
      if self.y[t] > 0.0 {
        if !self.is_upper_bound(t) && -self.grad[t] >= gmax {
          gmax = -self.grad[t];
          gmax_idx = Some(t);
        }
      } else if !self.is_lower_bound(t) && self.grad[t] >= gmax {
        gmax = self.grad[t];
        gmax_idx = Some(t);
      }
    }

    let i = gmax_idx?;
    let mut gmax2 = f64::NEG_INFINITY;
    let mut gmin_idx = None;
    let mut obj_diff_min = f64::INFINITY;

    for j in 0..self.n {
      let (grad_diff, quad_coef) = if self.y[j] > 0.0 {
        if self.is_lower_bound(j) {
          continue;
        }
        gmax2 = gmax2.max(self.grad[j]);
        (
          gmax + self.grad[j],
          self.qd(i) + self.qd(j) - 2.0 * self.y[i] * self.q(i, j),
        )
      } else {
        if self.is_upper_bound(j) {
          continue;
        }
        gmax2 = gmax2.max(-self.grad[j]);
        (
          gmax - self.grad[j],
          self.qd(i) + self.qd(j) + 2.0 * self.y[i] * self.q(i, j),
        )
      };

      if grad_diff > 0.0 {
        let quad_coef = if quad_coef > 0.0 { quad_coef } else { TAU };
        let obj_diff = -(grad_diff * grad_diff) / quad_coef;
        if obj_diff <= obj_diff_min {
          gmin_idx = Some(j);
          obj_diff_min = obj_diff;
        }
      }
    }

    if gmax + gmax2 < eps {
      return None;
    }
    gmin_idx.map(|j| (i, j))
  }

  fn update_pair(&mut self, i: usize, j: usize) {
    let c = self.c;
    let old_ai = self.alpha[i];
    let old_aj = self.alpha[j];
    let qij = self.q(i, j);

    if self.y[i] != self.y[j] {
      let quad_coef = (self.qd(i) + self.qd(j) + 2.0 * qij).max(TAU);
      let delta = (-self.grad[i] - self.grad[j]) / quad_coef;
      let diff = old_ai - old_aj;
      let (mut ai, mut aj) = (old_ai + delta, old_aj + delta);

      if diff > 0.0 {
        if aj < 0.0 {
          aj = 0.0;
          ai = diff;
        }
      } else if ai < 0.0 {
        ai = 0.0;
        aj = -diff;
      }
      if diff > 0.0 {
        if ai > c {
          ai = c;
          aj = c - diff;
        }
      } else if aj > c {
        aj = c;
        ai = c + diff;
      }

      self.alpha[i] = ai;
      self.alpha[j] = aj;
    } else {
      let quad_coef = (self.qd(i) + self.qd(j) - 2.0 * qij).max(TAU);
      let delta = (self.grad[i] - self.grad[j]) / quad_coef;
      let sum = old_ai + old_aj;
      let (mut ai, mut aj) = (old_ai - delta, old_aj + delta);

      if sum > c {
        if ai > c {
          ai = c;
          aj = sum - c;
        }
      } else if aj < 0.0 {
        aj = 0.0;
        ai = sum;
      }
      if sum > c {
        if aj > c {
          aj = c;
          ai = sum - c;
        }
      } else if ai < 0.0 {
        ai = 0.0;
        aj = sum;
      }

      self.alpha[i] = ai;
      self.alpha[j] = aj;
    }

    let delta_i = self.alpha[i] - old_ai;
    let delta_j = self.alpha[j] - old_aj;
    for k in 0..self.n {
      self.grad[k] += self.q(i, k) * delta_i + self.q(j, k) * delta_j;
    }
  }

  fn compute_rho(&self) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_count = 0usize;
    let mut free_sum = 0.0;

    for i in 0..self.n {
      let yg = self.y[i] * self.grad[i];
      if self.is_upper_bound(i) {
        if self.y[i] < 0.0 {
          upper = upper.min(yg);
        } else {
          lower = lower.max(yg);
        }
      } else if self.is_lower_bound(i) {
        if self.y[i] > 0.0 {
          upper = upper.min(yg);
        } else {
          lower = lower.max(yg);
        }
      } else {
        free_count += 1;
        free_sum += yg;
      }
    }

    if free_count > 0 {
      free_sum / free_count as f64
    } else {
      (upper + lower) / 2.0
    }
  }
}

/// 求解二分类对偶问题
///
/// `kernel` 为 n x n 行优先核矩阵，`y` 取值 +1/-1。
pub fn solve(kernel: &[f64], y: &[f64], c: f64, eps: f64, max_iterations: usize) -> BinarySolution {
  let n = y.len();
  debug_assert_eq!(kernel.len(), n * n);

  let mut solver = Solver {
    n,
    kernel,
    y,
    c,
    alpha: vec![0.0; n],
    grad: vec![-1.0; n],
  };

  let mut iterations = 0;
  while iterations < max_iterations {
    let Some((i, j)) = solver.select_working_set(eps) else {
      break;
    };
    solver.update_pair(i, j);
    iterations += 1;
  }

  if iterations >= max_iterations {
    warn!("SMO 达到最大迭代次数 {}, 结果可能未收敛", max_iterations);
  } else {
    debug!("SMO 在 {} 次迭代后收敛", iterations);
  }

  let rho = solver.compute_rho();
  BinarySolution {
    alpha: solver.alpha,
    rho,
    iterations,
  }
}
