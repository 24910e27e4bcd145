// 该文件是 Lupai （路牌） 项目的一部分。
// src/session.rs - 检测与可视化之间共享的会话状态
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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use tracing::{debug, warn};

use crate::{frame::Frame, model::Detections};

/// 一个完整检测周期的结果：帧与其检测结果总是成对出现
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
  pub cycle: u64,
  pub frame: Arc<Frame>,
  pub detections: Detections,
}

/// 正在进行中的检测周期
#[derive(Debug)]
pub struct Cycle {
  id: u64,
  frame: Arc<Frame>,
}

impl Cycle {
  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn frame(&self) -> &Frame {
    &self.frame
  }

  pub fn image(&self) -> &RgbImage {
    &self.frame.image
  }
}

#[derive(Debug, Default)]
struct SessionState {
  cycle: u64,
  current_frame: Option<Arc<Frame>>,
  latest: Option<SessionSnapshot>,
}

/// 帧回调（写当前帧）、检测（写结果）与可视化（读快照）之间的交接点
///
/// 克隆得到的句柄共享同一份状态。
#[derive(Debug, Clone, Default)]
pub struct DetectionSession {
  state: Arc<Mutex<SessionState>>,
}

impl DetectionSession {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 记录新到达的帧并开启一个检测周期
  pub fn begin_cycle(&self, frame: Frame) -> Cycle {
    let frame = Arc::new(frame);
    let mut state = self.lock();
    state.cycle += 1;
    state.current_frame = Some(frame.clone());
    debug!("开始检测周期 {}", state.cycle);
    Cycle {
      id: state.cycle,
      frame,
    }
  }

  /// 提交检测结果，已被更新的周期覆盖时丢弃
  pub fn complete_cycle(&self, cycle: Cycle, detections: Detections) -> bool {
    let mut state = self.lock();
    if state.cycle != cycle.id {
      warn!("检测周期 {} 已过期（当前 {}），丢弃结果", cycle.id, state.cycle);
      return false;
    }
    state.latest = Some(SessionSnapshot {
      cycle: cycle.id,
      frame: cycle.frame,
      detections,
    });
    true
  }

  /// 最近收到的帧，可能尚未完成检测
  pub fn current_frame(&self) -> Option<Arc<Frame>> {
    self.lock().current_frame.clone()
  }

  /// 最近一次完成的检测周期
  pub fn snapshot(&self) -> Option<SessionSnapshot> {
    self.lock().latest.clone()
  }

  pub fn clear(&self) {
    let mut state = self.lock();
    state.current_frame = None;
    state.latest = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{frame::Region, label::Label, model::DetectionResult};

  fn detections(n: u32) -> Detections {
    (0..n)
      .map(|i| DetectionResult {
        region: Region::new(i, i, 10, 10),
        label: Label::STOP,
      })
      .collect::<Vec<_>>()
      .into()
  }

  #[test]
  fn empty_session_has_no_snapshot() {
    let session = DetectionSession::new();
    assert!(session.snapshot().is_none());
    assert!(session.current_frame().is_none());
  }

  #[test]
  fn snapshot_pairs_frame_with_results() {
    let session = DetectionSession::new();
    let cycle = session.begin_cycle(Frame::new(RgbImage::new(4, 4), 3, 30));
    assert!(session.snapshot().is_none());
    assert_eq!(session.current_frame().unwrap().index, 3);

    assert!(session.complete_cycle(cycle, detections(2)));
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.frame.index, 3);
    assert_eq!(snapshot.detections.len(), 2);
  }

  #[test]
  fn stale_cycle_is_dropped() {
    let session = DetectionSession::new();
    let old = session.begin_cycle(Frame::new(RgbImage::new(4, 4), 1, 0));
    let new = session.begin_cycle(Frame::new(RgbImage::new(4, 4), 2, 0));

    assert!(!session.complete_cycle(old, detections(1)));
    assert!(session.snapshot().is_none());
    assert!(session.complete_cycle(new, detections(3)));
    assert_eq!(session.snapshot().unwrap().frame.index, 2);
  }

  #[test]
  fn clones_share_state_across_threads() {
    let session = DetectionSession::new();
    let producer = session.clone();
    std::thread::spawn(move || {
      let cycle = producer.begin_cycle(Frame::new(RgbImage::new(2, 2), 9, 0));
      assert!(producer.complete_cycle(cycle, detections(1)));
    })
    .join()
    .unwrap();

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.frame.index, 9);
    assert_eq!(snapshot.detections.len(), 1);
  }
}
