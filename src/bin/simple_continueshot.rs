// 该文件是 Lupai （路牌） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续帧的路牌检测
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

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use url::Url;

use lupai::{
  FromUrl,
  classifier::SvmClassifierBuilder,
  config::DetectorConfig,
  input::InputWrapper,
  output::{OutputWrapper, Render},
  pipeline::DetectionPipeline,
  session::DetectionSession,
  task::{ContinuousTask, Task},
};

/// Lupai 连续检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// SVM 模型文件，例如 svm:///path/to/model.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，例如 dir:///path/to/frames?fps=25
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 dir:///path/to/records
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 预览输出，周期性写出最近一次完成的检测结果
  #[arg(long, value_name = "PREVIEW")]
  pub preview: Option<Url>,
  /// 预览刷新间隔（毫秒）
  #[arg(long, value_name = "MS", default_value_t = 500)]
  pub preview_interval: u64,
  /// TOML 配置文件
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

/// 在独立线程中读取会话快照并渲染，只渲染新完成的周期
fn spawn_preview(
  session: DetectionSession,
  preview: OutputWrapper,
  interval: Duration,
  running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
  thread::spawn(move || {
    let mut last_cycle = 0;
    loop {
      let stopping = !running.load(Ordering::Acquire);
      if let Some(snapshot) = session.snapshot()
        && snapshot.cycle != last_cycle
      {
        last_cycle = snapshot.cycle;
        if let Err(e) = preview.render_result(&*snapshot.frame, &snapshot.detections) {
          error!("预览渲染失败: {}", e);
        }
      }
      if stopping {
        break;
      }
      thread::sleep(interval);
    }
  })
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let config = match &args.config {
    Some(path) => DetectorConfig::load(path)?,
    None => DetectorConfig::default(),
  };
  let input = InputWrapper::from_url(&args.input)?;
  let classifier = SvmClassifierBuilder::from_url(&args.model)?.build()?;
  let output = OutputWrapper::from_url(&args.output)?;

  let session = DetectionSession::new();
  let model = DetectionPipeline::from_config(&config, classifier)?.with_session(session.clone());
  let running = Arc::new(AtomicBool::new(true));
  let preview = match &args.preview {
    Some(url) => {
      info!("预览输出: {}", url);
      let preview = OutputWrapper::from_url(url)?;
      Some(spawn_preview(
        session,
        preview,
        Duration::from_millis(args.preview_interval),
        running.clone(),
      ))
    }
    None => None,
  };

  let result = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_interrupt_handler()
    .run_task(input, model, output);

  running.store(false, Ordering::Release);
  if let Some(handle) = preview
    && handle.join().is_err()
  {
    error!("预览线程异常退出");
  }

  result
}
