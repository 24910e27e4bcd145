// 该文件是 Lupai （路牌） 项目的一部分。
// src/output/draw.rs - 检测结果可视化与文本记录
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

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::{frame::Region, label::WithLabel, model::Detections};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BOX_THICKNESS: u32 = 2;
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无法解析字体文件")]
  InvalidFont,
}

/// 在帧上绘制检测框，提供字体时在框上方绘制类别名
pub struct Draw {
  font: Option<FontVec>,
  font_size: f32,
  box_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: None,
      font_size: LABEL_FONT_SIZE,
      box_color: BOX_COLOR,
    }
  }
}

impl Draw {
  pub fn with_font_file(path: &Path) -> Result<Self, DrawError> {
    let data = std::fs::read(path)?;
    let font = FontVec::try_from_vec(data).map_err(|_| DrawError::InvalidFont)?;
    Ok(Self {
      font: Some(font),
      ..Self::default()
    })
  }

  pub fn with_font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  pub fn draw_detections(&self, frame: &RgbImage, detections: &Detections) -> RgbImage {
    let mut image = frame.clone();
    for item in detections.items.iter() {
      self.draw_region_with_label(&mut image, &item.region, &item.label);
    }
    image
  }

  fn draw_region_with_label<T: WithLabel>(&self, image: &mut RgbImage, region: &Region, kind: &T) {
    let Some(region) = region.clamp_to(image.width(), image.height()) else {
      return;
    };

    let color = Rgb(self.box_color);
    for t in 0..BOX_THICKNESS {
      if region.width <= 2 * t || region.height <= 2 * t {
        break;
      }
      let rect = Rect::at((region.x + t) as i32, (region.y + t) as i32)
        .of_size(region.width - 2 * t, region.height - 2 * t);
      draw_hollow_rect_mut(image, rect, color);
    }

    let Some(font) = &self.font else {
      return;
    };

    let label = kind.to_label_str();
    let scale = PxScale::from(self.font_size);
    let (text_width, text_height) = text_size(scale, font, &label);
    let text_height = text_height as i32 + 2 * LABEL_TEXT_VERTICAL_PADDING;

    // 标签放在边框上方，贴近顶部时压在框内
    let label_x = region.x as i32;
    let label_y = (region.y as i32 - text_height).max(0);
    let label_width = text_width.min(image.width() - region.x);
    if label_width == 0 || text_height <= 0 {
      return;
    }

    let rect = Rect::at(label_x, label_y).of_size(label_width, text_height as u32);
    draw_filled_rect_mut(image, rect, color);
    draw_text_mut(
      image,
      Rgb(TEXT_COLOR),
      label_x,
      label_y + LABEL_TEXT_VERTICAL_PADDING,
      scale,
      font,
      &label,
    );
  }
}

/// 以文本形式记录检测结果，每行一个区域
pub struct Record {
  pub label_with_name: bool,
}

impl Record {
  pub fn format(&self, detections: &Detections, frame_width: u32, frame_height: u32) -> String {
    detections
      .items
      .iter()
      .map(|item| {
        let name = if self.label_with_name {
          item.label.to_label_str()
        } else {
          item.label.to_label_id().to_string()
        };
        let [x_min, y_min, x_max, y_max] = item.region.normalized(frame_width, frame_height);
        format!(
          "{}, {}, {}, {}, {}, {:.4}, {:.4}, {:.4}, {:.4}",
          name,
          item.region.x,
          item.region.y,
          item.region.width,
          item.region.height,
          x_min,
          y_min,
          x_max,
          y_max
        )
      })
      .collect::<Vec<_>>()
      .join("\n")
  }

  pub fn record(
    &self,
    detections: &Detections,
    frame_width: u32,
    frame_height: u32,
    path: &Path,
  ) -> Result<(), std::io::Error> {
    std::fs::write(
      path.with_extension("txt"),
      self.format(detections, frame_width, frame_height),
    )
  }
}
