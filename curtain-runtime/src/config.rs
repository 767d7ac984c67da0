//! # Config 模块
//!
//! 幕布行为参数。
//!
//! `CurtainConfig` 在 `attach` 时作为快照交给控制器，之后只能通过
//! `reconfigure` 整体替换，控制器内部从不修改它。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// 幕布配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurtainConfig {
    /// 开幕动画时长（毫秒，必须大于 0）
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,

    /// 是否自动开幕
    #[serde(default)]
    pub auto_open_enabled: bool,

    /// 自动开幕延迟（毫秒）
    #[serde(default = "default_auto_open_delay_ms")]
    pub auto_open_delay_ms: u64,

    /// 是否启用粒子效果
    #[serde(default = "default_particle_effect_enabled")]
    pub particle_effect_enabled: bool,

    /// 是否播放开幕音效
    #[serde(default)]
    pub sound_enabled: bool,
}

/// 默认动画时长（毫秒）
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 2000;

/// 默认自动开幕延迟（毫秒）
pub const DEFAULT_AUTO_OPEN_DELAY_MS: u64 = 5000;

fn default_animation_duration_ms() -> u64 {
    DEFAULT_ANIMATION_DURATION_MS
}

fn default_auto_open_delay_ms() -> u64 {
    DEFAULT_AUTO_OPEN_DELAY_MS
}

fn default_particle_effect_enabled() -> bool {
    true
}

impl Default for CurtainConfig {
    fn default() -> Self {
        Self {
            animation_duration_ms: default_animation_duration_ms(),
            auto_open_enabled: false,
            auto_open_delay_ms: default_auto_open_delay_ms(),
            particle_effect_enabled: default_particle_effect_enabled(),
            sound_enabled: false,
        }
    }
}

impl CurtainConfig {
    /// 设置动画时长
    pub fn with_animation_duration_ms(mut self, ms: u64) -> Self {
        self.animation_duration_ms = ms;
        self
    }

    /// 启用自动开幕
    pub fn with_auto_open(mut self, delay_ms: u64) -> Self {
        self.auto_open_enabled = true;
        self.auto_open_delay_ms = delay_ms;
        self
    }

    /// 设置粒子效果开关
    pub fn with_particles(mut self, enabled: bool) -> Self {
        self.particle_effect_enabled = enabled;
        self
    }

    /// 设置音效开关
    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    /// 动画时长
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// 自动开幕延迟
    pub fn auto_open_delay(&self) -> Duration {
        Duration::from_millis(self.auto_open_delay_ms)
    }

    /// 两份配置的自动开幕参数是否一致
    ///
    /// 仅当自动开幕参数变化时才需要重新调度自动开幕定时器。
    pub fn same_auto_open(&self, other: &CurtainConfig) -> bool {
        self.auto_open_enabled == other.auto_open_enabled
            && self.auto_open_delay_ms == other.auto_open_delay_ms
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.animation_duration_ms == 0 {
            return Err(ConfigError::InvalidAnimationDuration {
                value: self.animation_duration_ms,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CurtainConfig::default();
        assert_eq!(config.animation_duration_ms, 2000);
        assert!(!config.auto_open_enabled);
        assert_eq!(config.auto_open_delay_ms, 5000);
        assert!(config.particle_effect_enabled);
        assert!(!config.sound_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CurtainConfig =
            serde_json::from_str(r#"{ "auto_open_enabled": true }"#).unwrap();
        assert!(config.auto_open_enabled);
        assert_eq!(config.auto_open_delay_ms, 5000);
        assert_eq!(config.animation_duration_ms, 2000);
        assert!(config.particle_effect_enabled);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = CurtainConfig::default().with_animation_duration_ms(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidAnimationDuration { value: 0 })
        );
    }

    #[test]
    fn test_same_auto_open() {
        let a = CurtainConfig::default().with_auto_open(100);
        let b = a.clone().with_animation_duration_ms(500);
        assert!(a.same_auto_open(&b));

        let c = a.clone().with_auto_open(200);
        assert!(!a.same_auto_open(&c));
        assert!(!a.same_auto_open(&CurtainConfig::default()));
    }
}
