//! # Adapter 模块
//!
//! 把渲染表面和一个定时器后端组合成 [`CurtainHost`]。
//!
//! 实时舞台用 tokio 定时器，headless 运行与测试用 [`VirtualTimers`]，
//! 两者共享同一套副作用实现。

use std::io::Write;
use std::time::Duration;

use tracing::debug;

use curtain_runtime::{
    CurtainController, CurtainHost, Diagnostic, Particle, SideEffectFailure, TimerId,
    VirtualTimers,
};

use crate::config::Settings;
use crate::error::{HostError, HostResult};
use crate::surface::TerminalSurface;

/// 定时器后端
pub trait TimerBackend {
    /// 安排一次性定时器
    fn schedule_once(&mut self, timer: TimerId, delay: Duration);

    /// 安排重复定时器
    fn schedule_repeating(&mut self, timer: TimerId, interval: Duration);

    /// 取消定时器
    fn cancel(&mut self, timer: TimerId);
}

impl TimerBackend for VirtualTimers {
    fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        VirtualTimers::schedule_once(self, timer, delay);
    }

    fn schedule_repeating(&mut self, timer: TimerId, interval: Duration) {
        VirtualTimers::schedule_repeating(self, timer, interval);
    }

    fn cancel(&mut self, timer: TimerId) {
        VirtualTimers::cancel(self, timer);
    }
}

/// 渲染表面 + 定时器后端
pub struct SurfaceHost<T: TimerBackend, W: Write> {
    /// 渲染表面
    pub surface: TerminalSurface<W>,
    /// 定时器后端
    pub timers: T,
    /// 收到的诊断
    pub diagnostics: Vec<Diagnostic>,
}

impl<T: TimerBackend, W: Write> SurfaceHost<T, W> {
    /// 创建宿主
    pub fn new(surface: TerminalSurface<W>, timers: T) -> Self {
        Self {
            surface,
            timers,
            diagnostics: Vec::new(),
        }
    }
}

impl<T: TimerBackend, W: Write> CurtainHost for SurfaceHost<T, W> {
    fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        debug!(curtain = %self.surface.id(), %timer, ?delay, "安排定时器");
        self.timers.schedule_once(timer, delay);
    }

    fn schedule_repeating(&mut self, timer: TimerId, interval: Duration) {
        debug!(curtain = %self.surface.id(), %timer, ?interval, "安排重复定时器");
        self.timers.schedule_repeating(timer, interval);
    }

    fn cancel(&mut self, timer: TimerId) {
        debug!(curtain = %self.surface.id(), %timer, "取消定时器");
        self.timers.cancel(timer);
    }

    fn on_open_start(&mut self) {
        self.surface.draw_open_start();
    }

    fn on_open_complete(&mut self) {
        self.surface.draw_open_complete();
    }

    fn play_sound(&mut self) -> Result<(), SideEffectFailure> {
        self.surface.ring_bell()
    }

    fn on_particle_tick(&mut self, particle: Particle) {
        self.surface.draw_particle(particle);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.surface.draw_diagnostic(&diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// 创建一块幕布并挂载到新的渲染表面
///
/// 挂载成功后画出合拢状态；自动开幕按设置安排。
pub fn mount<T: TimerBackend, W: Write>(
    id: &str,
    settings: &Settings,
    particle_seed: Option<u64>,
    timers: T,
    out: W,
) -> HostResult<CurtainController<SurfaceHost<T, W>>> {
    let config = settings.resolve_config()?;
    let surface = TerminalSurface::new(id, settings.resolve_presentation(), out);

    let mut curtain = CurtainController::new(id);
    if let Some(seed) = particle_seed {
        curtain = curtain.with_particle_seed(seed);
    }
    curtain
        .attach(config, SurfaceHost::new(surface, timers))
        .map_err(|source| HostError::Config {
            curtain: id.to_string(),
            source,
        })?;

    if let Some(host) = curtain.host_mut() {
        host.surface.render_closed();
    }
    Ok(curtain)
}
