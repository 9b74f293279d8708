use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::ConfigError;
use crate::StartupError;

use super::frame::{
    normalize_non_zero_duration, run_headless, FrameDriver, DEFAULT_MAX_FRAME_DELTA,
};
use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::overlay::HudData;
use super::{InputAction, InputSnapshot, MetricsHandle, Renderer, SceneCommand};

pub const SLOW_FRAME_ENV_VAR: &str = "GALLERY_SLOW_FRAME_MS";

/// Radians of yaw per pixel of horizontal mouse drag.
const LOOK_RADIANS_PER_PIXEL: f64 = 0.002;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    /// Run this many frames without a window, then exit.
    pub headless_frames: Option<u64>,
    pub headless_frame_delta: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Gallery".to_string(),
            window_width: 1280,
            window_height: 720,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            headless_frames: None,
            headless_frame_delta: Duration::from_secs_f64(1.0 / 60.0),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, driver: FrameDriver) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, driver, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut driver: FrameDriver,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    if let Some(frames) = config.headless_frames {
        let fixed_delta =
            normalize_non_zero_duration(config.headless_frame_delta, Duration::from_millis(16));
        let summary = run_headless(&mut driver, frames, fixed_delta);
        info!(
            frames_run = summary.frames_run,
            elapsed_seconds = summary.elapsed_seconds,
            clamped_frames = summary.clamped_frames,
            entity_count = summary.entity_count,
            quit_requested = summary.quit_requested,
            "headless_summary"
        );
        return Ok(());
    }

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    driver.load();
    info!(
        max_frame_delta_ms = config.max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut hud_visible = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.handle_cursor_moved(position.x);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        input_collector.handle_key(code, event.state);
                    }
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.take_hud_toggle_pressed() {
                        hud_visible = !hud_visible;
                        info!(hud_visible, "hud_toggled");
                    }

                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only; not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let input = input_collector.snapshot_for_frame();
                    let outcome = driver.step(raw_frame_dt, &input);
                    if outcome.command == SceneCommand::Quit {
                        info!(reason = "scene_command", "shutdown_requested");
                        window_target.exit();
                        return;
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let entity_count = driver.world().entity_count();
                    let hud = hud_visible.then(|| HudData {
                        metrics: metrics_handle.snapshot(),
                        render_fps_cap: effective_render_cap,
                        entity_count,
                        elapsed_seconds: outcome.frame.elapsed_seconds,
                        title: driver.debug_title(),
                    });
                    if let Err(error) = renderer.render(driver.world().minimap(), hud.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = driver.debug_title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(raw_frame_dt, outcome.frame.clamped);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now, entity_count) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_time_ms = snapshot.worst_frame_time_ms,
                            clamped_frames = snapshot.clamped_frames,
                            entity_count = snapshot.entity_count,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                driver.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Edge-triggered key latch: reports a press once until the key is released.
#[derive(Debug, Default, Clone, Copy)]
struct KeyLatch {
    is_down: bool,
    pressed_edge: bool,
}

impl KeyLatch {
    fn handle(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    reset: KeyLatch,
    minimap_toggle: KeyLatch,
    hud_toggle: KeyLatch,
    action_states: ActionStates,
    dragging: bool,
    last_cursor_x: Option<f64>,
    pending_look_delta: f64,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.action_states.set(InputAction::MoveForward, is_pressed);
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::MoveBackward, is_pressed);
            }
            KeyCode::KeyA => self.action_states.set(InputAction::StrafeLeft, is_pressed),
            KeyCode::KeyD => self.action_states.set(InputAction::StrafeRight, is_pressed),
            KeyCode::KeyQ | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::TurnLeft, is_pressed);
            }
            KeyCode::KeyE | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::TurnRight, is_pressed);
            }
            KeyCode::KeyR => self.reset.handle(state),
            KeyCode::Tab | KeyCode::KeyM => self.minimap_toggle.handle(state),
            KeyCode::F3 => self.hud_toggle.handle(state),
            KeyCode::Escape => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    fn handle_cursor_moved(&mut self, x: f64) {
        if let Some(last_x) = self.last_cursor_x {
            if self.dragging {
                self.pending_look_delta -= (x - last_x) * LOOK_RADIANS_PER_PIXEL;
            }
        }
        self.last_cursor_x = Some(x);
    }

    fn clear_cursor(&mut self) {
        self.last_cursor_x = None;
        self.dragging = false;
    }

    fn take_hud_toggle_pressed(&mut self) -> bool {
        self.hud_toggle.take()
    }

    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.reset.take(),
            self.minimap_toggle.take(),
            self.action_states,
            std::mem::take(&mut self.pending_look_delta),
        )
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}
