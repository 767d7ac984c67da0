//! # Curtain Host
//!
//! 幕布开场效果的终端宿主层。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 终端渲染（标题、按钮、粒子、揭幕）
//! - 定时器（tokio 实时定时器或虚拟时钟）
//! - 元素属性与配置文件的解析
//! - 命令输入
//!
//! Host 层不包含生命周期逻辑，只负责执行 Runtime 请求的副作用，
//! 并把到期的定时器交还给控制器。

pub mod adapter;
pub mod config;
pub mod element;
pub mod error;
pub mod headless;
pub mod stage;
pub mod surface;

pub use adapter::{SurfaceHost, TimerBackend, mount};
pub use config::{AppConfig, Overrides, Settings};
pub use element::{AttributeChange, AttributeError, ElementAttributes, OBSERVED_ATTRIBUTES};
pub use error::{HostError, HostResult};
pub use headless::{HeadlessHost, HeadlessReport};
pub use stage::{Stage, StageCommand, StageHost, TimerFired, TokioTimers};
pub use surface::{CurtainPresentation, CurtainTheme, TerminalSurface};
