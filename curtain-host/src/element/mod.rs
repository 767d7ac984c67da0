//! # Element 模块
//!
//! 自定义元素的属性适配层。
//!
//! 属性是字符串键值对，这里负责把它们解析成 [`CurtainConfig`] 与
//! [`CurtainPresentation`]，并判断一次属性变更是否需要重新安排自动开幕。
//!
//! ## 解析规则
//!
//! | 属性 | 规则 |
//! |------|------|
//! | `speed` | 整数前缀，缺失、非数字或 0 时回退 |
//! | `auto-open-delay` | 同上 |
//! | `auto-open` / `sound` | 存在即为真 |
//! | `sparkles` | 除非值为 `"false"`，否则为真 |
//! | `title` / `subtitle` / `button-text` | 原样使用 |
//! | `theme` | 主题名，未知名称回退 `default` |

use std::collections::BTreeMap;
use thiserror::Error;

use curtain_runtime::CurtainConfig;

use crate::surface::{CurtainPresentation, CurtainTheme};

/// 受观察的属性
pub const OBSERVED_ATTRIBUTES: [&str; 11] = [
    "title",
    "subtitle",
    "button-text",
    "theme",
    "speed",
    "auto-open",
    "auto-open-delay",
    "sparkles",
    "sound",
    "left-curtain-image",
    "right-curtain-image",
];

/// 影响自动开幕安排的属性
const AUTO_OPEN_ATTRIBUTES: [&str; 2] = ["auto-open", "auto-open-delay"];

/// 属性错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// 未受观察的属性
    #[error("未知属性: {0}")]
    Unknown(String),

    /// 时长为负数
    #[error("属性 {name} 的时长不能为负数: {value}")]
    NegativeDuration { name: &'static str, value: i64 },
}

/// 一次属性变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// 属性名
    pub name: String,
    /// 旧值（`None` 表示原先不存在）
    pub old: Option<String>,
    /// 新值（`None` 表示被移除）
    pub new: Option<String>,
}

impl AttributeChange {
    /// 是否需要重新安排自动开幕
    pub fn affects_auto_open(&self) -> bool {
        AUTO_OPEN_ATTRIBUTES.contains(&self.name.as_str())
    }
}

/// 元素属性集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    attrs: BTreeMap<String, String>,
}

impl ElementAttributes {
    /// 创建空属性集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 从键值对构建（未知属性报错）
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attributes = Self::new();
        for (name, value) in pairs {
            attributes.set(name, value)?;
        }
        Ok(attributes)
    }

    /// 解析 `name=value` 或单独的 `name`（布尔属性）
    pub fn parse_assignment(token: &str) -> (String, String) {
        match token.split_once('=') {
            Some((name, value)) => (
                name.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            ),
            None => (token.trim().to_string(), String::new()),
        }
    }

    /// 设置属性
    ///
    /// 返回实际发生的变更；设置为当前值不算变更。
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<AttributeChange>, AttributeError> {
        let name = name.into();
        let value = value.into();
        if !OBSERVED_ATTRIBUTES.contains(&name.as_str()) {
            return Err(AttributeError::Unknown(name));
        }

        let old = self.attrs.insert(name.clone(), value.clone());
        if old.as_deref() == Some(value.as_str()) {
            return Ok(None);
        }
        Ok(Some(AttributeChange {
            name,
            old,
            new: Some(value),
        }))
    }

    /// 移除属性
    pub fn remove(&mut self, name: &str) -> Result<Option<AttributeChange>, AttributeError> {
        if !OBSERVED_ATTRIBUTES.contains(&name) {
            return Err(AttributeError::Unknown(name.to_string()));
        }
        Ok(self.attrs.remove(name).map(|old| AttributeChange {
            name: name.to_string(),
            old: Some(old),
            new: None,
        }))
    }

    /// 读取属性
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// 属性是否存在
    pub fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// 全部属性
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// 读取时长属性
    ///
    /// 缺失、非数字或 0 返回 `None`（由调用方回退）。
    fn duration(&self, name: &'static str) -> Result<Option<u64>, AttributeError> {
        match self.get(name).and_then(parse_leading_int) {
            None | Some(0) => Ok(None),
            Some(value) if value < 0 => Err(AttributeError::NegativeDuration { name, value }),
            Some(value) => Ok(Some(value.unsigned_abs())),
        }
    }

    /// 在已有配置之上应用属性
    ///
    /// 只有存在且有效的属性才会覆盖 `base` 中对应的字段。
    pub fn apply_config(&self, base: &CurtainConfig) -> Result<CurtainConfig, AttributeError> {
        let mut config = base.clone();
        if let Some(ms) = self.duration("speed")? {
            config.animation_duration_ms = ms;
        }
        if let Some(ms) = self.duration("auto-open-delay")? {
            config.auto_open_delay_ms = ms;
        }
        if self.has("auto-open") {
            config.auto_open_enabled = true;
        }
        if self.has("sound") {
            config.sound_enabled = true;
        }
        if let Some(value) = self.get("sparkles") {
            config.particle_effect_enabled = value != "false";
        }
        Ok(config)
    }

    /// 在已有外观之上应用属性
    pub fn apply_presentation(&self, base: &CurtainPresentation) -> CurtainPresentation {
        let mut presentation = base.clone();
        if let Some(title) = self.get("title") {
            presentation.title = title.to_string();
        }
        if let Some(subtitle) = self.get("subtitle") {
            presentation.subtitle = subtitle.to_string();
        }
        if let Some(text) = self.get("button-text") {
            presentation.button_text = text.to_string();
        }
        if let Some(theme) = self.get("theme") {
            presentation.theme = CurtainTheme::from_name(theme);
        }
        if let Some(image) = self.get("left-curtain-image") {
            presentation.left_curtain_image = Some(image.to_string());
        }
        if let Some(image) = self.get("right-curtain-image") {
            presentation.right_curtain_image = Some(image.to_string());
        }
        presentation
    }

    /// 只由属性决定的配置
    pub fn to_config(&self) -> Result<CurtainConfig, AttributeError> {
        self.apply_config(&CurtainConfig::default())
    }

    /// 只由属性决定的外观
    pub fn to_presentation(&self) -> CurtainPresentation {
        self.apply_presentation(&CurtainPresentation::default())
    }
}

/// 解析字符串开头的整数
///
/// 跳过前导空白，接受一个可选符号，读到第一个非数字字符为止。
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("1500"), Some(1500));
        assert_eq!(parse_leading_int("  1500ms"), Some(1500));
        assert_eq!(parse_leading_int("+42"), Some(42));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_defaults_without_attributes() {
        let attributes = ElementAttributes::new();
        assert_eq!(attributes.to_config().unwrap(), CurtainConfig::default());
        assert_eq!(attributes.to_presentation(), CurtainPresentation::default());
    }

    #[test]
    fn test_parse_config_attributes() {
        let attributes = ElementAttributes::from_pairs([
            ("speed", "1500"),
            ("auto-open", ""),
            ("auto-open-delay", "300"),
            ("sparkles", "false"),
            ("sound", ""),
        ])
        .unwrap();
        let config = attributes.to_config().unwrap();

        assert_eq!(config.animation_duration_ms, 1500);
        assert!(config.auto_open_enabled);
        assert_eq!(config.auto_open_delay_ms, 300);
        assert!(!config.particle_effect_enabled);
        assert!(config.sound_enabled);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let attributes =
            ElementAttributes::from_pairs([("speed", "fast"), ("auto-open-delay", "0")]).unwrap();
        let config = attributes.to_config().unwrap();
        assert_eq!(config.animation_duration_ms, 2000);
        assert_eq!(config.auto_open_delay_ms, 5000);

        // 分层：回退到下层配置而不是默认值
        let base = CurtainConfig::default().with_animation_duration_ms(800);
        assert_eq!(attributes.apply_config(&base).unwrap().animation_duration_ms, 800);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let attributes = ElementAttributes::from_pairs([("speed", "-5")]).unwrap();
        assert_eq!(
            attributes.to_config(),
            Err(AttributeError::NegativeDuration {
                name: "speed",
                value: -5
            })
        );
    }

    #[test]
    fn test_sparkles_values() {
        for (value, expected) in [("", true), ("true", true), ("no", true), ("false", false)] {
            let attributes = ElementAttributes::from_pairs([("sparkles", value)]).unwrap();
            assert_eq!(
                attributes.to_config().unwrap().particle_effect_enabled,
                expected,
                "sparkles={value:?}"
            );
        }
    }

    #[test]
    fn test_presentation_attributes() {
        let attributes = ElementAttributes::from_pairs([
            ("title", "Grand Opening"),
            ("button-text", "Enter"),
            ("theme", "saffron"),
            ("left-curtain-image", "left.png"),
        ])
        .unwrap();
        let presentation = attributes.to_presentation();

        assert_eq!(presentation.title, "Grand Opening");
        assert_eq!(presentation.subtitle, "Click to Enter");
        assert_eq!(presentation.button_text, "Enter");
        assert_eq!(presentation.theme, CurtainTheme::Saffron);
        assert_eq!(presentation.left_curtain_image.as_deref(), Some("left.png"));
        assert_eq!(presentation.right_curtain_image, None);
    }

    #[test]
    fn test_changes() {
        let mut attributes = ElementAttributes::new();

        let change = attributes.set("auto-open", "").unwrap().unwrap();
        assert!(change.affects_auto_open());
        assert_eq!(change.old, None);

        // 相同值不算变更
        assert_eq!(attributes.set("auto-open", "").unwrap(), None);

        let change = attributes.set("title", "Hi").unwrap().unwrap();
        assert!(!change.affects_auto_open());

        let change = attributes.remove("auto-open").unwrap().unwrap();
        assert!(change.affects_auto_open());
        assert_eq!(change.new, None);
        assert_eq!(attributes.remove("auto-open").unwrap(), None);

        assert_eq!(
            attributes.set("colour", "red"),
            Err(AttributeError::Unknown("colour".to_string()))
        );
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            ElementAttributes::parse_assignment("speed=1500"),
            ("speed".to_string(), "1500".to_string())
        );
        assert_eq!(
            ElementAttributes::parse_assignment("title=\"Hello World\""),
            ("title".to_string(), "Hello World".to_string())
        );
        assert_eq!(
            ElementAttributes::parse_assignment("auto-open"),
            ("auto-open".to_string(), String::new())
        );
    }
}
