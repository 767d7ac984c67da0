//! # Error 模块
//!
//! curtain-host 的错误类型。

use thiserror::Error;

use crate::element::AttributeError;

/// 宿主错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// 幕布配置不合法
    #[error("幕布 {curtain} 配置不合法: {source}")]
    Config {
        curtain: String,
        #[source]
        source: curtain_runtime::ConfigError,
    },

    /// 元素属性不合法
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// 幕布标识重复
    #[error("幕布标识重复: {0}")]
    DuplicateCurtain(String),
}

/// Result 类型别名
pub type HostResult<T> = Result<T, HostError>;
