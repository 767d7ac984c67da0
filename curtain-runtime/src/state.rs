//! # State 模块
//!
//! 幕布生命周期状态。
//!
//! ## 设计原则
//!
//! - 阶段显式建模，任一时刻只有一个阶段
//! - 控制器持有的定时器集中记录在 [`PendingTimers`]，取消时一次取走
//! - 状态只由控制器修改，渲染表面只读

use serde::{Deserialize, Serialize};

use crate::config::CurtainConfig;
use crate::timer::{TimerId, TimerKind};

/// 幕布阶段
///
/// # 状态转换
///
/// ```text
/// Closed    -> open() / 自动开幕       -> Animating
/// Animating -> 动画完成定时器触发      -> Open
/// Open      -> reset()                 -> Closed
/// Animating -> reset()（强制中断）     -> Closed
/// Closed    -> reset()（幂等）         -> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurtainPhase {
    /// 幕布合拢
    #[default]
    Closed,
    /// 开幕动画进行中
    Animating,
    /// 幕布已完全拉开
    Open,
}

impl std::fmt::Display for CurtainPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Animating => write!(f, "animating"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// 控制器持有的定时器
///
/// 每种定时器至多一个。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTimers {
    /// 自动开幕定时器（仅 Closed 且自动开幕未触发时存在）
    pub auto_open: Option<TimerId>,
    /// 动画完成定时器（当且仅当 Animating 时存在）
    pub animation_complete: Option<TimerId>,
    /// 粒子定时器（仅 Animating 且启用粒子时存在）
    pub particle_tick: Option<TimerId>,
}

impl PendingTimers {
    /// 当前持有的定时器数量
    pub fn len(&self) -> usize {
        [self.auto_open, self.animation_complete, self.particle_tick]
            .iter()
            .flatten()
            .count()
    }

    /// 是否没有任何定时器
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 查找定时器所在的槽位
    ///
    /// 返回 None 表示该定时器已被取消或属于更早的周期。
    pub fn slot_of(&self, timer: TimerId) -> Option<TimerKind> {
        if self.auto_open == Some(timer) {
            Some(TimerKind::AutoOpen)
        } else if self.animation_complete == Some(timer) {
            Some(TimerKind::AnimationComplete)
        } else if self.particle_tick == Some(timer) {
            Some(TimerKind::ParticleTick)
        } else {
            None
        }
    }

    /// 取走全部定时器
    pub fn take_all(&mut self) -> Vec<TimerId> {
        [
            self.auto_open.take(),
            self.animation_complete.take(),
            self.particle_tick.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// 幕布状态
///
/// 挂载时创建（阶段为 Closed），卸载时连同全部定时器一起销毁。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurtainState {
    /// 当前阶段
    pub phase: CurtainPhase,
    /// 配置快照
    pub config: CurtainConfig,
    /// 非 Closed 阶段收到的新配置，回到 Closed 时生效
    pub deferred_config: Option<CurtainConfig>,
    /// 持有的定时器
    pub timers: PendingTimers,
}

impl CurtainState {
    /// 创建新的幕布状态
    pub fn new(config: CurtainConfig) -> Self {
        Self {
            phase: CurtainPhase::Closed,
            config,
            deferred_config: None,
            timers: PendingTimers::default(),
        }
    }

    /// 是否已完全拉开
    pub fn is_open(&self) -> bool {
        self.phase == CurtainPhase::Open
    }

    /// 是否正在播放开幕动画
    pub fn is_animating(&self) -> bool {
        self.phase == CurtainPhase::Animating
    }
}
