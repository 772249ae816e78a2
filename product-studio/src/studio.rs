//! Sequential three-angle generation session.
//!
//! A [`Studio`] owns the whole UI-facing state: the source image, the style
//! prompt, the results gathered so far and the current [`GenerationState`].
//! Angles are rendered one after another with a fixed pause in between. A
//! rate-limit error stops the sequence and starts a cooldown; once it has
//! elapsed the caller may [`Studio::resume`] from the first angle that did not
//! finish. Any other error ends the sequence for good.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use product_studio_types::studio::{GenerationState, ProductImage, StylePreset, ANGLES};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::render::ImageRenderer;
use crate::source::{SourceImage, MAX_SOURCE_BYTES};

/// 两次调用之间的默认间隔。
pub const DEFAULT_ANGLE_DELAY: Duration = Duration::from_millis(2500);
/// 服务端未给出 `Retry-After` 时的默认冷却时长。
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// 进度起点（开始生成时立即显示）。
const INITIAL_PROGRESS: u8 = 5;

/// 会话配置。
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub angle_delay: Duration,
    pub cooldown: Duration,
    pub max_source_bytes: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            angle_delay: DEFAULT_ANGLE_DELAY,
            cooldown: DEFAULT_COOLDOWN,
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }
}

/// 推送给界面的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    State(GenerationState),
    Progress { percent: u8, task: String },
    Rendered(ProductImage),
    CooldownStarted { remaining: Duration },
    Failed { message: String },
}

pub struct Studio<R> {
    renderer: R,
    config: StudioConfig,
    source: Option<Arc<SourceImage>>,
    style_prompt: String,
    results: Vec<ProductImage>,
    state: GenerationState,
    progress: u8,
    current_task: String,
    error: Option<String>,
    cooldown_until: Option<Instant>,
    resume_from: Option<usize>,
    events: Option<UnboundedSender<StudioEvent>>,
}

impl<R: ImageRenderer> Studio<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, StudioConfig::default())
    }

    pub fn with_config(renderer: R, config: StudioConfig) -> Self {
        Self {
            renderer,
            config,
            source: None,
            style_prompt: String::new(),
            results: Vec::new(),
            state: GenerationState::Idle,
            progress: 0,
            current_task: String::new(),
            error: None,
            cooldown_until: None,
            resume_from: None,
            events: None,
        }
    }

    /// 订阅状态事件。再次调用会替换之前的订阅者。
    pub fn subscribe(&mut self) -> UnboundedReceiver<StudioEvent> {
        let (tx, rx) = unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// 载入新的源图像，清空旧结果与错误。
    ///
    /// # Errors
    /// 图像超过配置的大小上限时返回 `Error::SourceTooLarge`，此时会话保持不变，
    /// 仅记录错误提示。
    pub fn load_source(&mut self, source: SourceImage) -> Result<()> {
        let size = source.len() as u64;
        if size > self.config.max_source_bytes {
            return Err(self.reject_input(Error::SourceTooLarge {
                size,
                limit: self.config.max_source_bytes,
            }));
        }
        info!(bytes = size, mime_type = source.mime_type(), "source image loaded");
        self.source = Some(Arc::new(source));
        self.results.clear();
        self.error = None;
        self.resume_from = None;
        self.progress = 0;
        self.current_task.clear();
        self.set_state(GenerationState::Idle);
        Ok(())
    }

    /// 从文件载入源图像。
    ///
    /// # Errors
    /// 文件不可读、不是图像或超过大小上限时返回错误。
    pub async fn load_source_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match SourceImage::from_path(path, self.config.max_source_bytes).await {
            Ok(source) => self.load_source(source),
            Err(err) => Err(self.reject_input(err)),
        }
    }

    pub fn set_style_prompt(&mut self, prompt: impl Into<String>) {
        self.style_prompt = prompt.into();
    }

    pub fn apply_preset(&mut self, preset: StylePreset) {
        self.style_prompt = preset.prompt().to_string();
    }

    /// 依次生成三个角度。每次调用都会重新请求，不复用上一次的结果。
    ///
    /// # Errors
    /// 没有源图像、仍在冷却或任一角度生成失败时返回错误；已得到的结果会保留。
    pub async fn run(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(self.reject_input(Error::MissingSource));
        }
        if let Some(remaining) = self.cooldown_remaining() {
            return Err(Error::CoolingDown { remaining });
        }

        info!(angles = ANGLES.len(), "starting generation session");
        self.results.clear();
        self.error = None;
        self.resume_from = None;
        self.cooldown_until = None;
        self.set_state(GenerationState::Loading);
        self.set_progress(INITIAL_PROGRESS);
        self.generate_from(0).await
    }

    /// 限流冷却结束后，从第一个未完成的角度继续。由调用方手动触发。
    ///
    /// # Errors
    /// 没有可续跑的会话、冷却未结束或后续角度失败时返回错误。
    pub async fn resume(&mut self) -> Result<()> {
        let Some(start) = self.resume_from else {
            return Err(Error::NothingToResume);
        };
        if let Some(remaining) = self.cooldown_remaining() {
            return Err(Error::CoolingDown { remaining });
        }

        info!(from_angle = ANGLES[start].id, "resuming generation session");
        self.error = None;
        self.resume_from = None;
        self.cooldown_until = None;
        self.set_state(GenerationState::Loading);
        let progress = start
            .checked_sub(1)
            .map_or(INITIAL_PROGRESS, progress_after);
        self.set_progress(progress);
        self.generate_from(start).await
    }

    /// 清空源图像、结果、风格提示词、错误与冷却，回到 `Idle`。
    pub fn reset(&mut self) {
        self.source = None;
        self.results.clear();
        self.style_prompt.clear();
        self.error = None;
        self.cooldown_until = None;
        self.resume_from = None;
        self.progress = 0;
        self.current_task.clear();
        self.set_state(GenerationState::Idle);
    }

    async fn generate_from(&mut self, start: usize) -> Result<()> {
        let source = self.source.clone().ok_or(Error::MissingSource)?;
        let style = self.style_prompt.trim().to_string();
        let style = (!style.is_empty()).then_some(style.as_str());

        for (index, angle) in ANGLES.iter().enumerate().skip(start) {
            self.current_task = format!("Rendering {}...", angle.label);
            self.emit(StudioEvent::Progress {
                percent: self.progress,
                task: self.current_task.clone(),
            });

            if index > start {
                tokio::time::sleep(self.config.angle_delay).await;
            }

            match self.renderer.render(&source, angle, style).await {
                Ok(url) => {
                    let image = ProductImage::new(angle, url);
                    info!(angle = angle.label, "angle rendered");
                    self.results.push(image.clone());
                    self.emit(StudioEvent::Rendered(image));
                    self.set_progress(progress_after(index));
                }
                Err(err) => return Err(self.fail(index, err)),
            }
        }

        self.current_task.clear();
        self.set_progress(100);
        self.set_state(GenerationState::Success);
        info!(results = self.results.len(), "generation session finished");
        Ok(())
    }

    fn fail(&mut self, index: usize, err: Error) -> Error {
        if let Error::RateLimited { retry_after, .. } = &err {
            let now = Instant::now();
            let requested = retry_after.unwrap_or(self.config.cooldown);
            let (cooldown, until) = now
                .checked_add(requested)
                .map(|until| (requested, until))
                .or_else(|| {
                    now.checked_add(self.config.cooldown)
                        .map(|until| (self.config.cooldown, until))
                })
                .unwrap_or((Duration::ZERO, now));
            warn!(
                angle = ANGLES[index].label,
                cooldown_secs = cooldown.as_secs_f64(),
                "rate limited, pausing session"
            );
            self.resume_from = Some(index);
            self.cooldown_until = Some(until);
            self.emit(StudioEvent::CooldownStarted {
                remaining: cooldown,
            });
        } else {
            warn!(angle = ANGLES[index].label, error = %err, "generation failed");
        }

        let message = err.user_message();
        self.error = Some(message.clone());
        self.emit(StudioEvent::Failed { message });
        self.set_state(GenerationState::Error);
        err
    }

    fn reject_input(&mut self, err: Error) -> Error {
        let message = err.user_message();
        self.error = Some(message.clone());
        self.emit(StudioEvent::Failed { message });
        err
    }

    fn set_state(&mut self, state: GenerationState) {
        self.state = state;
        self.emit(StudioEvent::State(state));
    }

    fn set_progress(&mut self, percent: u8) {
        self.progress = percent;
        self.emit(StudioEvent::Progress {
            percent,
            task: self.current_task.clone(),
        });
    }

    fn emit(&self, event: StudioEvent) {
        if let Some(events) = &self.events {
            // 没有订阅者时丢弃事件。
            let _ = events.send(event);
        }
    }

    #[must_use]
    pub const fn state(&self) -> GenerationState {
        self.state
    }

    #[must_use]
    pub fn results(&self) -> &[ProductImage] {
        &self.results
    }

    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn style_prompt(&self) -> &str {
        &self.style_prompt
    }

    #[must_use]
    pub const fn config(&self) -> &StudioConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_resumable(&self) -> bool {
        self.resume_from.is_some()
    }

    /// 剩余冷却时间；未在冷却中返回 `None`。
    #[must_use]
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.cooldown_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }
}

/// 第 `index` 个角度完成后的进度。
fn progress_after(index: usize) -> u8 {
    let percent = 10 + (index + 1) * 30;
    u8::try_from(percent.min(100)).unwrap_or(100)
}
