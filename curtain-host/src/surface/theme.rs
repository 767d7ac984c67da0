//! # Theme 模块
//!
//! 幕布配色主题。

use serde::{Deserialize, Serialize};

/// 幕布主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurtainTheme {
    /// 深红
    #[default]
    Default,
    /// 皇家紫
    Royal,
    /// 石板灰
    Elegant,
    /// 金色
    Gold,
    /// 藏红花橙
    Saffron,
}

impl CurtainTheme {
    /// 全部主题
    pub const ALL: [CurtainTheme; 5] = [
        Self::Default,
        Self::Royal,
        Self::Elegant,
        Self::Gold,
        Self::Saffron,
    ];

    /// 按名称解析主题，未知名称回退到 Default
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    /// 主题名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Royal => "royal",
            Self::Elegant => "elegant",
            Self::Gold => "gold",
            Self::Saffron => "saffron",
        }
    }

    /// 幕布渐变（起点色，终点色）
    pub fn gradient(&self) -> (&'static str, &'static str) {
        match self {
            Self::Default => ("#8B0000", "#DC143C"),
            Self::Royal => ("#4B0082", "#8A2BE2"),
            Self::Elegant => ("#2F4F4F", "#708090"),
            Self::Gold => ("#DAA520", "#FFD700"),
            Self::Saffron => ("#FF8C00", "#FFA500"),
        }
    }

    /// 渐变的 CSS 表示
    pub fn css_gradient(&self) -> String {
        let (from, to) = self.gradient();
        format!("linear-gradient(135deg, {from}, {to})")
    }
}

impl std::fmt::Display for CurtainTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(CurtainTheme::from_name("royal"), CurtainTheme::Royal);
        assert_eq!(CurtainTheme::from_name(" Gold "), CurtainTheme::Gold);
        assert_eq!(CurtainTheme::from_name("neon"), CurtainTheme::Default);
        assert_eq!(CurtainTheme::from_name(""), CurtainTheme::Default);
    }

    #[test]
    fn test_gradients() {
        assert_eq!(
            CurtainTheme::Default.css_gradient(),
            "linear-gradient(135deg, #8B0000, #DC143C)"
        );
        assert_eq!(CurtainTheme::Saffron.gradient(), ("#FF8C00", "#FFA500"));
        for theme in CurtainTheme::ALL {
            assert_eq!(CurtainTheme::from_name(theme.name()), theme);
        }
    }
}
