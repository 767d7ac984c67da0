//! # Timer 模块
//!
//! 定时器标识与虚拟时钟。
//!
//! ## 设计说明
//!
//! 控制器不持有回调闭包。调度定时器时它生成一个 [`TimerId`] 交给宿主，
//! 宿主在到期时把同一个 `TimerId` 送回 `CurtainController::on_timer`。
//! `TimerId` 同时充当取消句柄。
//!
//! `TimerId` 的序号在控制器生命周期内单调递增、永不复用，
//! 因此 reset/detach 之前排队的旧定时器不可能被误认成新周期的定时器。
//!
//! [`VirtualTimers`] 是一个确定性的定时器队列，供 headless 宿主与测试使用：
//! 时间只在调用方推进时流逝。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 定时器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimerKind {
    /// 自动开幕（一次性）
    AutoOpen,
    /// 动画完成（一次性）
    AnimationComplete,
    /// 粒子生成（周期性）
    ParticleTick,
}

impl TimerKind {
    /// 是否为周期性定时器
    pub fn is_repeating(self) -> bool {
        matches!(self, Self::ParticleTick)
    }
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoOpen => write!(f, "auto-open"),
            Self::AnimationComplete => write!(f, "animation-complete"),
            Self::ParticleTick => write!(f, "particle-tick"),
        }
    }
}

/// 定时器标识（同时也是取消句柄）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId {
    seq: u64,
    kind: TimerKind,
}

impl TimerId {
    /// 创建定时器标识
    ///
    /// 正常情况下只由控制器创建；公开是为了让宿主测试可以构造任意标识。
    pub fn new(seq: u64, kind: TimerKind) -> Self {
        Self { seq, kind }
    }

    /// 序号
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// 种类
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.seq)
    }
}

/// 队列中的定时器
#[derive(Debug, Clone)]
struct Scheduled {
    timer: TimerId,
    /// 周期（毫秒），None 表示一次性
    interval_ms: Option<u64>,
}

/// 虚拟时钟定时器队列
///
/// 按 (到期时间, 入队顺序) 排序，同一时刻到期的定时器按入队顺序触发。
#[derive(Debug, Clone, Default)]
pub struct VirtualTimers {
    /// 当前虚拟时间（毫秒）
    now_ms: u64,
    /// 待触发队列
    queue: BTreeMap<(u64, u64), Scheduled>,
    /// 下一个入队序号
    next_order: u64,
}

/// 毫秒数，超出 `u64` 时取 `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl VirtualTimers {
    /// 创建新的虚拟时钟（时间从 0 开始）
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前虚拟时间（毫秒）
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn push(&mut self, due_ms: u64, scheduled: Scheduled) {
        let order = self.next_order;
        self.next_order += 1;
        self.queue.insert((due_ms, order), scheduled);
    }

    /// 调度一次性定时器
    ///
    /// 到期时间在 `u64::MAX` 处饱和，极长的时长只会让定时器永不到期。
    pub fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        let due = self.now_ms.saturating_add(millis(delay));
        self.push(
            due,
            Scheduled {
                timer,
                interval_ms: None,
            },
        );
    }

    /// 调度周期性定时器（首次在一个周期后触发）
    pub fn schedule_repeating(&mut self, timer: TimerId, interval: Duration) {
        // 周期为 0 会让 pop_due 永远停在同一时刻
        let interval_ms = millis(interval).max(1);
        let due = self.now_ms.saturating_add(interval_ms);
        self.push(
            due,
            Scheduled {
                timer,
                interval_ms: Some(interval_ms),
            },
        );
    }

    /// 取消定时器（不存在时静默忽略）
    pub fn cancel(&mut self, timer: TimerId) {
        self.queue.retain(|_, scheduled| scheduled.timer != timer);
    }

    /// 最早的到期时间
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// 弹出一个不晚于 `until_ms` 到期的定时器
    ///
    /// 虚拟时间前进到该定时器的到期时刻；周期性定时器会自动重新入队。
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerId> {
        let (&(due, order), _) = self.queue.iter().next()?;
        if due > until_ms {
            return None;
        }
        let scheduled = self.queue.remove(&(due, order))?;
        self.now_ms = self.now_ms.max(due);
        if let Some(interval_ms) = scheduled.interval_ms {
            self.push(due.saturating_add(interval_ms), scheduled.clone());
        }
        Some(scheduled.timer)
    }

    /// 把虚拟时间推进到 `ms`（不会倒退，不触发任何定时器）
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    /// 待触发定时器数量
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// 指定种类的待触发定时器数量
    pub fn pending_of(&self, kind: TimerKind) -> usize {
        self.queue
            .values()
            .filter(|scheduled| scheduled.timer.kind() == kind)
            .count()
    }

    /// 定时器是否仍在队列中
    pub fn is_scheduled(&self, timer: TimerId) -> bool {
        self.queue.values().any(|scheduled| scheduled.timer == timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(seq: u64, kind: TimerKind) -> TimerId {
        TimerId::new(seq, kind)
    }

    #[test]
    fn test_once_fires_at_due_time() {
        let mut timers = VirtualTimers::new();
        let t = id(1, TimerKind::AnimationComplete);
        timers.schedule_once(t, Duration::from_millis(500));

        assert_eq!(timers.pop_due(499), None);
        assert_eq!(timers.pop_due(500), Some(t));
        assert_eq!(timers.now_ms(), 500);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_repeating_rearms() {
        let mut timers = VirtualTimers::new();
        let t = id(1, TimerKind::ParticleTick);
        timers.schedule_repeating(t, Duration::from_millis(200));

        let mut fired_at = Vec::new();
        while timers.pop_due(1000).is_some() {
            fired_at.push(timers.now_ms());
        }
        assert_eq!(fired_at, vec![200, 400, 600, 800, 1000]);
        assert!(timers.is_scheduled(t));
        assert_eq!(timers.next_due_ms(), Some(1200));
    }

    #[test]
    fn test_same_due_fires_in_schedule_order() {
        let mut timers = VirtualTimers::new();
        let a = id(1, TimerKind::AutoOpen);
        let b = id(2, TimerKind::AnimationComplete);
        timers.schedule_once(a, Duration::from_millis(100));
        timers.schedule_once(b, Duration::from_millis(100));

        assert_eq!(timers.pop_due(100), Some(a));
        assert_eq!(timers.pop_due(100), Some(b));
    }

    #[test]
    fn test_cancel_and_counts() {
        let mut timers = VirtualTimers::new();
        let tick = id(1, TimerKind::ParticleTick);
        let done = id(2, TimerKind::AnimationComplete);
        timers.schedule_repeating(tick, Duration::from_millis(200));
        timers.schedule_once(done, Duration::from_millis(500));
        assert_eq!(timers.pending(), 2);
        assert_eq!(timers.pending_of(TimerKind::ParticleTick), 1);

        timers.cancel(tick);
        timers.cancel(tick);
        assert_eq!(timers.pending(), 1);
        assert!(!timers.is_scheduled(tick));
        assert_eq!(timers.pop_due(10_000), Some(done));
    }

    #[test]
    fn test_advance_never_goes_back() {
        let mut timers = VirtualTimers::new();
        timers.advance_to(300);
        timers.advance_to(100);
        assert_eq!(timers.now_ms(), 300);

        // 延迟从当前虚拟时间起算
        let t = id(1, TimerKind::AutoOpen);
        timers.schedule_once(t, Duration::from_millis(50));
        assert_eq!(timers.next_due_ms(), Some(350));
    }

    #[test]
    fn test_huge_delay_saturates() {
        let mut timers = VirtualTimers::new();
        timers.advance_to(1_000);

        let once = id(1, TimerKind::AnimationComplete);
        timers.schedule_once(once, Duration::from_millis(u64::MAX));
        assert_eq!(timers.next_due_ms(), Some(u64::MAX));

        let ticks = id(2, TimerKind::ParticleTick);
        timers.schedule_repeating(ticks, Duration::MAX);
        timers.cancel(once);
        assert_eq!(timers.pop_due(u64::MAX), Some(ticks));
        // 重新入队同样饱和
        assert_eq!(timers.next_due_ms(), Some(u64::MAX));
        assert_eq!(timers.now_ms(), u64::MAX);
    }
}
