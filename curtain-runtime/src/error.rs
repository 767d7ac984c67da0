//! # Error 模块
//!
//! 定义 curtain-runtime 中使用的错误类型。
//!
//! 幕布控制器本身的操作都是全函数，只有两类失败：
//! - 配置不合法（在 `attach` / `reconfigure` 时拒绝）
//! - 宿主副作用失败（音效播放），仅作诊断上报，不向外传播

use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 动画时长必须大于 0
    #[error("动画时长必须大于 0 毫秒，实际为 {value}")]
    InvalidAnimationDuration { value: u64 },
}

/// 副作用失败
///
/// 宿主执行副作用（目前只有音效播放）时返回的非致命错误。
/// 控制器捕获后记录日志并上报诊断，动画照常进行。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SideEffectFailure {
    /// 音效播放被拒绝或失败
    #[error("音效播放失败: {message}")]
    SoundPlayback { message: String },
}

impl SideEffectFailure {
    /// 创建音效播放失败
    pub fn sound(message: impl Into<String>) -> Self {
        Self::SoundPlayback {
            message: message.into(),
        }
    }
}

/// curtain-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurtainError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 控制器尚未挂载到渲染表面
    #[error("控制器尚未挂载")]
    NotAttached,
}

/// Result 类型别名
pub type CurtainResult<T> = Result<T, CurtainError>;
