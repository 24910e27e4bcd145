// 该文件是 Lupai （路牌） 项目的一部分。
// src/label.rs - 路牌类别标签
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

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
  #[error("标签必须为正整数, 实际为 {0}")]
  NonPositive(i32),
}

/// 类别标签，取值为正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Label(i32);

impl Label {
  pub const FORWARD: Label = Label(1);
  pub const TURN: Label = Label(2);
  pub const STOP: Label = Label(3);

  pub fn new(id: i32) -> Result<Self, LabelError> {
    if id <= 0 {
      return Err(LabelError::NonPositive(id));
    }
    Ok(Label(id))
  }

  pub fn id(&self) -> i32 {
    self.0
  }
}

impl TryFrom<i32> for Label {
  type Error = LabelError;

  fn try_from(id: i32) -> Result<Self, Self::Error> {
    Label::new(id)
  }
}

impl From<Label> for i32 {
  fn from(label: Label) -> Self {
    label.0
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_label_str())
  }
}

/// 训练集中的三类路牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignKind {
  Forward,
  Turn,
  Stop,
}

impl SignKind {
  pub const ALL: [SignKind; 3] = [SignKind::Forward, SignKind::Turn, SignKind::Stop];

  pub fn label(&self) -> Label {
    match self {
      SignKind::Forward => Label::FORWARD,
      SignKind::Turn => Label::TURN,
      SignKind::Stop => Label::STOP,
    }
  }

  pub fn from_label(label: Label) -> Option<Self> {
    SignKind::ALL.into_iter().find(|kind| kind.label() == label)
  }

  pub fn name(&self) -> &'static str {
    match self {
      SignKind::Forward => "Forward",
      SignKind::Turn => "Turn",
      SignKind::Stop => "Stop",
    }
  }
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> i32;
}

impl WithLabel for Label {
  fn to_label_str(&self) -> String {
    match SignKind::from_label(*self) {
      Some(kind) => kind.name().to_string(),
      None => format!("Sign#{}", self.0),
    }
  }

  fn to_label_id(&self) -> i32 {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_non_positive_ids() {
    assert_eq!(Label::new(0), Err(LabelError::NonPositive(0)));
    assert_eq!(Label::new(-3), Err(LabelError::NonPositive(-3)));
    assert_eq!(Label::new(2).map(|l| l.id()), Ok(2));
  }

  #[test]
  fn sign_names() {
    assert_eq!(Label::FORWARD.to_label_str(), "Forward");
    assert_eq!(Label::TURN.to_label_str(), "Turn");
    assert_eq!(Label::STOP.to_label_str(), "Stop");
    assert_eq!(Label::new(7).unwrap().to_label_str(), "Sign#7");
  }

  #[test]
  fn serde_rejects_invalid_label() {
    assert!(serde_json::from_str::<Label>("0").is_err());
    assert_eq!(serde_json::from_str::<Label>("3").unwrap(), Label::STOP);
  }
}
