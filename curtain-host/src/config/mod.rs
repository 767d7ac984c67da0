//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 元素属性（`attributes`）
//! 3. 配置文件 (curtain.json)
//! 4. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use curtain_runtime::CurtainConfig;

use crate::element::{AttributeError, ElementAttributes};
use crate::surface::{CurtainPresentation, CurtainTheme};

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 幕布行为参数
    #[serde(default)]
    pub curtain: CurtainConfig,

    /// 幕布外观
    #[serde(default)]
    pub presentation: CurtainPresentation,

    /// 幕布标识列表（每个标识一块幕布）
    #[serde(default = "default_curtain_ids")]
    pub curtains: Vec<String>,

    /// 元素属性（与自定义元素的属性同名同义）
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// 粒子随机种子（不设置则每次不同）
    #[serde(default)]
    pub particle_seed: Option<u64>,

    /// 全部幕布拉开后退出
    #[serde(default = "default_exit_when_open")]
    pub exit_when_open: bool,
}

fn default_curtain_ids() -> Vec<String> {
    vec!["curtain".to_string()]
}

fn default_exit_when_open() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            curtain: CurtainConfig::default(),
            presentation: CurtainPresentation::default(),
            curtains: default_curtain_ids(),
            attributes: BTreeMap::new(),
            particle_seed: None,
            exit_when_open: default_exit_when_open(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.curtain
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        if self.curtains.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "至少需要一块幕布".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for id in &self.curtains {
            if id.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "幕布标识不能为空".to_string(),
                ));
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "幕布标识重复: {id}"
                )));
            }
        }

        Ok(())
    }
}

/// 命令行覆盖项（`None` 表示不覆盖）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub animation_duration_ms: Option<u64>,
    pub auto_open: Option<bool>,
    pub auto_open_delay_ms: Option<u64>,
    pub particles: Option<bool>,
    pub sound: Option<bool>,
    pub theme: Option<CurtainTheme>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub button_text: Option<String>,
}

impl Overrides {
    fn apply_config(&self, config: &mut CurtainConfig) {
        if let Some(ms) = self.animation_duration_ms {
            config.animation_duration_ms = ms;
        }
        if let Some(enabled) = self.auto_open {
            config.auto_open_enabled = enabled;
        }
        if let Some(ms) = self.auto_open_delay_ms {
            config.auto_open_delay_ms = ms;
        }
        if let Some(enabled) = self.particles {
            config.particle_effect_enabled = enabled;
        }
        if let Some(enabled) = self.sound {
            config.sound_enabled = enabled;
        }
    }

    fn apply_presentation(&self, presentation: &mut CurtainPresentation) {
        if let Some(theme) = self.theme {
            presentation.theme = theme;
        }
        if let Some(title) = &self.title {
            presentation.title = title.clone();
        }
        if let Some(subtitle) = &self.subtitle {
            presentation.subtitle = subtitle.clone();
        }
        if let Some(text) = &self.button_text {
            presentation.button_text = text.clone();
        }
    }
}

/// 分层设置：配置文件 < 元素属性 < 命令行
///
/// 元素属性在运行期间可以改变，每次改变后重新求值。
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// 配置文件中的行为参数
    pub file_config: CurtainConfig,
    /// 配置文件中的外观
    pub file_presentation: CurtainPresentation,
    /// 元素属性
    pub attributes: ElementAttributes,
    /// 命令行覆盖项
    pub overrides: Overrides,
}

impl Settings {
    /// 由应用配置和命令行覆盖项构建
    pub fn new(app: &AppConfig, overrides: Overrides) -> Result<Self, AttributeError> {
        Ok(Self {
            file_config: app.curtain.clone(),
            file_presentation: app.presentation.clone(),
            attributes: ElementAttributes::from_pairs(app.attributes.clone())?,
            overrides,
        })
    }

    /// 求值行为参数
    pub fn resolve_config(&self) -> Result<CurtainConfig, AttributeError> {
        let mut config = self.attributes.apply_config(&self.file_config)?;
        self.overrides.apply_config(&mut config);
        Ok(config)
    }

    /// 求值外观
    pub fn resolve_presentation(&self) -> CurtainPresentation {
        let mut presentation = self.attributes.apply_presentation(&self.file_presentation);
        self.overrides.apply_presentation(&mut presentation);
        presentation
    }
}

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.curtains, vec!["curtain".to_string()]);
        assert_eq!(config.curtain.animation_duration_ms, 2000);
        assert!(config.exit_when_open);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "curtain": { "auto_open_enabled": true, "auto_open_delay_ms": 100 },
            "presentation": { "theme": "royal" },
            "curtains": ["hero", "footer"]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert!(config.curtain.auto_open_enabled);
        assert_eq!(config.curtain.auto_open_delay_ms, 100);
        assert_eq!(config.curtain.animation_duration_ms, 2000);
        assert!(config.curtain.particle_effect_enabled);
        assert_eq!(config.presentation.theme, CurtainTheme::Royal);
        assert_eq!(config.presentation.title, "Welcome");
        assert_eq!(config.curtains.len(), 2);
        assert_eq!(config.particle_seed, None);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("nope.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curtain.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curtain.json");

        let mut config = AppConfig::default();
        config.curtain = config.curtain.with_auto_open(250).with_sound(true);
        config.particle_seed = Some(7);
        config
            .attributes
            .insert("theme".to_string(), "gold".to_string());
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), config);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = AppConfig::default();
        config.curtain.animation_duration_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));

        let mut config = AppConfig::default();
        config.curtains.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.curtains = vec!["a".to_string(), "a".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("幕布标识重复"));

        let mut config = AppConfig::default();
        config.curtains = vec![" ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_priority() {
        let mut app = AppConfig::default();
        app.curtain = app.curtain.with_animation_duration_ms(3000).with_auto_open(900);
        app.presentation.title = "From File".to_string();
        app.attributes.insert("speed".to_string(), "1500".to_string());
        app.attributes.insert("title".to_string(), "From Attribute".to_string());
        app.attributes.insert("theme".to_string(), "royal".to_string());

        let overrides = Overrides {
            animation_duration_ms: Some(700),
            theme: Some(CurtainTheme::Gold),
            ..Overrides::default()
        };
        let settings = Settings::new(&app, overrides).unwrap();

        let config = settings.resolve_config().unwrap();
        // 命令行 > 属性 > 文件
        assert_eq!(config.animation_duration_ms, 700);
        assert_eq!(config.auto_open_delay_ms, 900);
        assert!(config.auto_open_enabled);

        let presentation = settings.resolve_presentation();
        assert_eq!(presentation.title, "From Attribute");
        assert_eq!(presentation.theme, CurtainTheme::Gold);
    }

    #[test]
    fn test_settings_rejects_unknown_attribute() {
        let mut app = AppConfig::default();
        app.attributes.insert("colour".to_string(), "red".to_string());
        assert_eq!(
            Settings::new(&app, Overrides::default()).unwrap_err(),
            AttributeError::Unknown("colour".to_string())
        );
    }
}
