//! # Host 模块
//!
//! 控制器对宿主（渲染表面）的要求。
//!
//! ```text
//! Host                                 Controller
//!   │                                      │
//!   │──── attach / open / reset ─────────►│
//!   │◄─── schedule_once / cancel ──────────│
//!   │◄─── on_open_start / play_sound ──────│
//!   │                                      │
//!   │──── on_timer(TimerId) ─────────────►│  （定时器到期）
//!   │◄─── on_particle_tick / complete ─────│
//! ```
//!
//! 回调都只拿到宿主自身的 `&mut self`，无法在回调中重入控制器；
//! 需要联动其他幕布的宿主应当把请求排队，在回调返回后再处理。

use std::time::Duration;

use crate::diagnostic::Diagnostic;
use crate::error::SideEffectFailure;
use crate::particle::Particle;
use crate::timer::TimerId;

/// 幕布宿主
pub trait CurtainHost {
    /// 调度一次性定时器，到期后宿主调用 `CurtainController::on_timer(timer)`
    fn schedule_once(&mut self, timer: TimerId, delay: Duration);

    /// 调度周期性定时器，每个周期调用一次 `on_timer(timer)`，直到被取消
    fn schedule_repeating(&mut self, timer: TimerId, interval: Duration);

    /// 取消定时器
    ///
    /// 对已触发或不存在的定时器调用时必须静默忽略。
    fn cancel(&mut self, timer: TimerId);

    /// 开幕开始
    fn on_open_start(&mut self) {}

    /// 开幕完成
    fn on_open_complete(&mut self) {}

    /// 播放开幕音效
    ///
    /// 返回的错误只会被记录和上报，不会中断开幕。
    fn play_sound(&mut self) -> Result<(), SideEffectFailure> {
        Ok(())
    }

    /// 生成一个装饰粒子
    fn on_particle_tick(&mut self, _particle: Particle) {}

    /// 诊断上报
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
