//! # Controller 模块
//!
//! 幕布生命周期控制器。
//!
//! ## 执行模型
//!
//! 控制器运行在渲染表面的事件循环上，所有操作立即返回：
//!
//! 1. 宿主调用 `attach` / `open` / `reset` / `detach`
//! 2. 控制器修改状态，并通过 [`CurtainHost`] 调度定时器、触发副作用
//! 3. 定时器到期后宿主调用 `on_timer`，控制器推进到下一阶段
//!
//! `open()` 内部顺序固定：阶段切换 → `on_open_start` → 音效 → 粒子定时器 → 完成定时器。
//!
//! `reset()` / `detach()` 是仅有的取消点，二者都在修改阶段之前取消全部定时器。

use tracing::{debug, info, trace, warn};

use crate::config::CurtainConfig;
use crate::diagnostic::Diagnostic;
use crate::error::{ConfigError, CurtainError, CurtainResult};
use crate::host::CurtainHost;
use crate::particle::{PARTICLE_TICK_INTERVAL, ParticleSpawner};
use crate::state::{CurtainPhase, CurtainState, PendingTimers};
use crate::timer::{TimerId, TimerKind};

/// 已挂载的宿主与状态
struct Mounted<H> {
    host: H,
    state: CurtainState,
}

/// 分配一个新的定时器标识
fn alloc_timer(next_seq: &mut u64, kind: TimerKind) -> TimerId {
    let timer = TimerId::new(*next_seq, kind);
    *next_seq += 1;
    timer
}

impl<H: CurtainHost> Mounted<H> {
    fn cancel_all(&mut self) {
        for timer in self.state.timers.take_all() {
            self.host.cancel(timer);
        }
    }

    /// 取消旧的自动开幕定时器，按当前配置重新调度
    fn schedule_auto_open(&mut self, next_seq: &mut u64, label: &str) {
        if let Some(timer) = self.state.timers.auto_open.take() {
            self.host.cancel(timer);
        }
        if self.state.phase != CurtainPhase::Closed || !self.state.config.auto_open_enabled {
            return;
        }
        let timer = alloc_timer(next_seq, TimerKind::AutoOpen);
        self.host
            .schedule_once(timer, self.state.config.auto_open_delay());
        self.state.timers.auto_open = Some(timer);
        debug!(
            curtain = %label,
            delay_ms = self.state.config.auto_open_delay_ms,
            "已调度自动开幕"
        );
    }

    fn begin_open(&mut self, next_seq: &mut u64, label: &str) -> bool {
        if self.state.phase != CurtainPhase::Closed {
            trace!(curtain = %label, phase = %self.state.phase, "忽略开幕请求");
            return false;
        }

        // 手动开幕后自动开幕定时器作废
        if let Some(timer) = self.state.timers.auto_open.take() {
            self.host.cancel(timer);
        }

        self.state.phase = CurtainPhase::Animating;
        debug!(curtain = %label, "开幕开始");
        self.host.on_open_start();

        if self.state.config.sound_enabled
            && let Err(failure) = self.host.play_sound()
        {
            warn!(curtain = %label, error = %failure, "开幕音效播放失败");
            self.host.report(Diagnostic::side_effect(label, &failure));
        }

        if self.state.config.particle_effect_enabled {
            let timer = alloc_timer(next_seq, TimerKind::ParticleTick);
            self.host.schedule_repeating(timer, PARTICLE_TICK_INTERVAL);
            self.state.timers.particle_tick = Some(timer);
        }

        let timer = alloc_timer(next_seq, TimerKind::AnimationComplete);
        self.host
            .schedule_once(timer, self.state.config.animation_duration());
        self.state.timers.animation_complete = Some(timer);
        true
    }

    fn complete(&mut self, label: &str) {
        if let Some(timer) = self.state.timers.particle_tick.take() {
            self.host.cancel(timer);
        }
        self.state.phase = CurtainPhase::Open;
        info!(curtain = %label, "开幕完成");
        self.host.on_open_complete();
    }
}

/// 幕布生命周期控制器
///
/// 一个控制器绑定一个渲染表面实例，独占其 [`CurtainState`]。
///
/// # 使用示例
///
/// ```ignore
/// let mut curtain = CurtainController::new("hero");
/// curtain.attach(CurtainConfig::default().with_auto_open(100), host)?;
///
/// // 宿主事件循环：定时器到期后回送
/// curtain.on_timer(timer);
///
/// curtain.reset();
/// let host = curtain.detach();
/// ```
pub struct CurtainController<H: CurtainHost> {
    /// 幕布标识（日志与诊断使用）
    label: String,
    /// 挂载后的宿主与状态
    mounted: Option<Mounted<H>>,
    /// 粒子生成器
    spawner: ParticleSpawner,
    /// 下一个定时器序号（跨挂载周期单调递增）
    next_timer_seq: u64,
}

impl<H: CurtainHost> CurtainController<H> {
    /// 创建未挂载的控制器
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mounted: None,
            spawner: ParticleSpawner::default(),
            next_timer_seq: 1,
        }
    }

    /// 使用固定种子生成粒子（可复现）
    pub fn with_particle_seed(mut self, seed: u64) -> Self {
        self.spawner = ParticleSpawner::new(Some(seed));
        self
    }

    /// 幕布标识
    pub fn label(&self) -> &str {
        &self.label
    }

    // ========== 生命周期 ==========

    /// 挂载到宿主
    ///
    /// 创建 Closed 状态；若启用自动开幕则调度自动开幕定时器。
    /// 已挂载时先卸载旧宿主（取消其全部定时器）再挂载。
    ///
    /// 配置非法时返回错误，控制器保持原状，传入的宿主被丢弃。
    pub fn attach(&mut self, config: CurtainConfig, host: H) -> Result<(), ConfigError> {
        config.validate()?;

        if self.mounted.is_some() {
            debug!(curtain = %self.label, "重新挂载，先卸载旧宿主");
            self.detach();
        }

        let mut mounted = Mounted {
            host,
            state: CurtainState::new(config),
        };
        mounted.schedule_auto_open(&mut self.next_timer_seq, &self.label);
        self.mounted = Some(mounted);
        info!(curtain = %self.label, "幕布已挂载");
        Ok(())
    }

    /// 卸载
    ///
    /// 取消全部定时器并释放状态，返回宿主。
    /// 可重复调用；从未挂载时返回 None。
    pub fn detach(&mut self) -> Option<H> {
        let mut mounted = self.mounted.take()?;
        mounted.cancel_all();
        info!(curtain = %self.label, "幕布已卸载");
        Some(mounted.host)
    }

    /// 更新配置（对应宿主的属性变化回调）
    ///
    /// - Closed：立即生效；自动开幕参数变化时取消并重新调度自动开幕定时器
    /// - Animating / Open：推迟到下次 `reset()` 回到 Closed 时生效
    pub fn reconfigure(&mut self, config: CurtainConfig) -> CurtainResult<()> {
        config.validate()?;
        let Some(mounted) = self.mounted.as_mut() else {
            return Err(CurtainError::NotAttached);
        };

        if mounted.state.phase != CurtainPhase::Closed {
            debug!(
                curtain = %self.label,
                phase = %mounted.state.phase,
                "配置推迟到回到 Closed 后生效"
            );
            mounted.state.deferred_config = Some(config);
            return Ok(());
        }

        let reschedule = !mounted.state.config.same_auto_open(&config);
        mounted.state.config = config;
        mounted.state.deferred_config = None;
        if reschedule {
            mounted.schedule_auto_open(&mut self.next_timer_seq, &self.label);
        }
        Ok(())
    }

    // ========== 操作 ==========

    /// 开幕
    ///
    /// 仅在 Closed 阶段生效，其余阶段（以及未挂载时）为无副作用的空操作。
    pub fn open(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            debug!(curtain = %self.label, "未挂载，忽略 open()");
            return;
        };
        mounted.begin_open(&mut self.next_timer_seq, &self.label);
    }

    /// 重置为 Closed
    ///
    /// 无条件取消全部定时器，不触发任何回调。
    /// 有推迟的配置时在此生效（不会因此调度自动开幕，需要时调用 [`Self::rearm`]）。
    pub fn reset(&mut self) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        mounted.cancel_all();
        mounted.state.phase = CurtainPhase::Closed;
        if let Some(config) = mounted.state.deferred_config.take() {
            debug!(curtain = %self.label, "应用推迟的配置");
            mounted.state.config = config;
        }
        debug!(curtain = %self.label, "幕布已重置");
    }

    /// 重新调度自动开幕
    ///
    /// 仅当 Closed、启用自动开幕且没有待触发的自动开幕定时器时生效。
    /// 返回是否调度了新的定时器。
    pub fn rearm(&mut self) -> bool {
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        if mounted.state.phase != CurtainPhase::Closed
            || !mounted.state.config.auto_open_enabled
            || mounted.state.timers.auto_open.is_some()
        {
            return false;
        }
        mounted.schedule_auto_open(&mut self.next_timer_seq, &self.label);
        true
    }

    /// 定时器到期
    ///
    /// 返回该定时器是否产生了效果。已取消、属于旧周期或卸载后到达的定时器被忽略。
    pub fn on_timer(&mut self, timer: TimerId) -> bool {
        let Self {
            label,
            mounted,
            spawner,
            next_timer_seq,
        } = self;
        let label = label.as_str();
        let Some(mounted) = mounted.as_mut() else {
            trace!(curtain = %label, %timer, "未挂载，忽略定时器");
            return false;
        };

        match mounted.state.timers.slot_of(timer) {
            None => {
                trace!(curtain = %label, %timer, "忽略过期定时器");
                false
            }
            Some(TimerKind::AutoOpen) => {
                mounted.state.timers.auto_open = None;
                debug!(curtain = %label, "自动开幕定时器触发");
                mounted.begin_open(next_timer_seq, label)
            }
            Some(TimerKind::AnimationComplete) => {
                mounted.state.timers.animation_complete = None;
                mounted.complete(label);
                true
            }
            Some(TimerKind::ParticleTick) => {
                let particle = spawner.spawn();
                mounted.host.on_particle_tick(particle);
                true
            }
        }
    }

    // ========== 查询 ==========

    /// 是否已挂载
    pub fn is_attached(&self) -> bool {
        self.mounted.is_some()
    }

    /// 当前阶段（未挂载时视为 Closed）
    pub fn phase(&self) -> CurtainPhase {
        self.mounted
            .as_ref()
            .map_or(CurtainPhase::Closed, |m| m.state.phase)
    }

    /// 是否已完全拉开
    pub fn is_open(&self) -> bool {
        self.phase() == CurtainPhase::Open
    }

    /// 是否正在播放开幕动画
    pub fn is_animating(&self) -> bool {
        self.phase() == CurtainPhase::Animating
    }

    /// 当前能否开幕（已挂载且处于 Closed）
    pub fn can_open(&self) -> bool {
        self.is_attached() && self.phase() == CurtainPhase::Closed
    }

    /// 当前状态
    pub fn state(&self) -> Option<&CurtainState> {
        self.mounted.as_ref().map(|m| &m.state)
    }

    /// 当前配置
    pub fn config(&self) -> Option<&CurtainConfig> {
        self.state().map(|s| &s.config)
    }

    /// 持有的定时器
    pub fn timers(&self) -> Option<&PendingTimers> {
        self.state().map(|s| &s.timers)
    }

    /// 宿主
    pub fn host(&self) -> Option<&H> {
        self.mounted.as_ref().map(|m| &m.host)
    }

    /// 宿主（可变）
    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.mounted.as_mut().map(|m| &mut m.host)
    }
}

impl<H: CurtainHost> std::fmt::Debug for CurtainController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurtainController")
            .field("label", &self.label)
            .field("attached", &self.is_attached())
            .field("phase", &self.phase())
            .field("timers", &self.timers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SideEffectFailure;
    use crate::particle::Particle;
    use std::time::Duration;

    /// 只记录调用顺序的宿主
    #[derive(Default)]
    struct LogHost {
        calls: Vec<String>,
        fail_sound: bool,
    }

    impl CurtainHost for LogHost {
        fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
            self.calls
                .push(format!("schedule {} {}ms", timer.kind(), delay.as_millis()));
        }

        fn schedule_repeating(&mut self, timer: TimerId, interval: Duration) {
            self.calls
                .push(format!("repeat {} {}ms", timer.kind(), interval.as_millis()));
        }

        fn cancel(&mut self, timer: TimerId) {
            self.calls.push(format!("cancel {}", timer.kind()));
        }

        fn on_open_start(&mut self) {
            self.calls.push("open_start".to_string());
        }

        fn on_open_complete(&mut self) {
            self.calls.push("open_complete".to_string());
        }

        fn play_sound(&mut self) -> Result<(), SideEffectFailure> {
            self.calls.push("sound".to_string());
            if self.fail_sound {
                Err(SideEffectFailure::sound("rejected"))
            } else {
                Ok(())
            }
        }

        fn on_particle_tick(&mut self, _particle: Particle) {
            self.calls.push("particle".to_string());
        }

        fn report(&mut self, diagnostic: Diagnostic) {
            self.calls.push(format!("report {}", diagnostic.level));
        }
    }

    fn calls(curtain: &CurtainController<LogHost>) -> Vec<String> {
        curtain.host().map(|h| h.calls.clone()).unwrap_or_default()
    }

    #[test]
    fn test_open_call_order() {
        let mut curtain = CurtainController::new("t").with_particle_seed(1);
        let config = CurtainConfig::default()
            .with_animation_duration_ms(500)
            .with_sound(true);
        curtain.attach(config, LogHost::default()).unwrap();

        curtain.open();

        assert_eq!(
            calls(&curtain),
            vec![
                "open_start",
                "sound",
                "repeat particle-tick 200ms",
                "schedule animation-complete 500ms",
            ]
        );
        assert!(curtain.is_animating());
    }

    #[test]
    fn test_sound_failure_is_reported_not_propagated() {
        let mut curtain = CurtainController::new("t");
        let host = LogHost {
            fail_sound: true,
            ..LogHost::default()
        };
        let config = CurtainConfig::default().with_sound(true).with_particles(false);
        curtain.attach(config, host).unwrap();

        curtain.open();

        assert!(curtain.is_animating());
        assert_eq!(
            calls(&curtain),
            vec![
                "open_start",
                "sound",
                "report WARN",
                "schedule animation-complete 2000ms",
            ]
        );
    }

    #[test]
    fn test_open_before_attach_is_noop() {
        let mut curtain: CurtainController<LogHost> = CurtainController::new("t");
        curtain.open();
        curtain.reset();
        assert!(!curtain.is_attached());
        assert_eq!(curtain.phase(), CurtainPhase::Closed);
        assert!(!curtain.can_open());
        assert!(curtain.detach().is_none());
    }

    #[test]
    fn test_attach_rejects_zero_duration() {
        let mut curtain = CurtainController::new("t");
        let config = CurtainConfig::default().with_animation_duration_ms(0);
        let err = curtain.attach(config, LogHost::default()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidAnimationDuration { value: 0 });
        assert!(!curtain.is_attached());
    }

    #[test]
    fn test_manual_open_cancels_auto_open() {
        let mut curtain = CurtainController::new("t");
        let config = CurtainConfig::default().with_auto_open(100).with_particles(false);
        curtain.attach(config, LogHost::default()).unwrap();
        assert!(curtain.timers().unwrap().auto_open.is_some());

        curtain.open();

        let timers = curtain.timers().unwrap();
        assert!(timers.auto_open.is_none());
        assert!(timers.animation_complete.is_some());
        assert_eq!(
            calls(&curtain),
            vec![
                "schedule auto-open 100ms",
                "cancel auto-open",
                "open_start",
                "schedule animation-complete 2000ms",
            ]
        );
    }

    #[test]
    fn test_timer_ids_never_reused_across_attach() {
        let mut curtain = CurtainController::new("t");
        let config = CurtainConfig::default().with_auto_open(100);
        curtain.attach(config.clone(), LogHost::default()).unwrap();
        let first = curtain.timers().unwrap().auto_open.unwrap();

        curtain.detach();
        curtain.attach(config, LogHost::default()).unwrap();
        let second = curtain.timers().unwrap().auto_open.unwrap();

        assert_ne!(first, second);
        assert!(second.seq() > first.seq());
        // 旧挂载周期的定时器到达新宿主时被忽略
        assert!(!curtain.on_timer(first));
        assert!(!curtain.is_animating());
    }

    #[test]
    fn test_reconfigure_requires_attach() {
        let mut curtain: CurtainController<LogHost> = CurtainController::new("t");
        assert_eq!(
            curtain.reconfigure(CurtainConfig::default()),
            Err(CurtainError::NotAttached)
        );
    }
}
