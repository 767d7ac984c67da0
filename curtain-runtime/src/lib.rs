//! # Curtain Runtime
//!
//! 幕布开场效果的生命周期核心库。
//!
//! ## 架构概述
//!
//! `curtain-runtime` 是纯逻辑核心，不依赖任何 IO、渲染或异步运行时。
//! 它通过 **回调 + 定时器标识** 与宿主（渲染表面）通信：
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │──── attach / open / reset ──────────►│
//!   │◄─── schedule_once(TimerId, delay) ────│
//!   │◄─── on_open_start / play_sound ───────│
//!   │                                       │
//!   │──── on_timer(TimerId) ──────────────►│
//!   │◄─── on_particle_tick / on_complete ───│
//! ```
//!
//! ## 核心类型
//!
//! - [`CurtainController`]：Closed / Animating / Open 状态机
//! - [`CurtainHost`]：宿主需要提供的定时器与副作用
//! - [`CurtainConfig`]：行为参数
//! - [`VirtualTimers`]：确定性虚拟时钟（headless 宿主与测试）
//! - [`CurtainRegistry`]：应用持有的幕布注册表
//!
//! ## 使用示例
//!
//! ```ignore
//! use curtain_runtime::{CurtainConfig, CurtainController};
//!
//! let mut curtain = CurtainController::new("hero");
//! curtain.attach(CurtainConfig::default().with_auto_open(100), host)?;
//!
//! // 宿主事件循环
//! while let Some(timer) = next_fired_timer() {
//!     curtain.on_timer(timer);
//!     if curtain.is_open() {
//!         break;
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`config`]：配置
//! - [`controller`]：生命周期控制器
//! - [`diagnostic`]：诊断与配置检查
//! - [`error`]：错误类型定义
//! - [`host`]：宿主 trait
//! - [`particle`]：装饰粒子
//! - [`registry`]：幕布注册表
//! - [`state`]：阶段与状态
//! - [`timer`]：定时器标识与虚拟时钟

pub mod config;
pub mod controller;
pub mod diagnostic;
pub mod error;
pub mod host;
pub mod particle;
pub mod registry;
pub mod state;
pub mod timer;

// 重导出核心类型
pub use config::{CurtainConfig, DEFAULT_ANIMATION_DURATION_MS, DEFAULT_AUTO_OPEN_DELAY_MS};
pub use controller::CurtainController;
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_config};
pub use error::{ConfigError, CurtainError, CurtainResult, SideEffectFailure};
pub use host::CurtainHost;
pub use particle::{PARTICLE_TICK_INTERVAL, Particle, ParticleSpawner};
pub use registry::CurtainRegistry;
pub use state::{CurtainPhase, CurtainState, PendingTimers};
pub use timer::{TimerId, TimerKind, VirtualTimers};
