//! # 诊断模块
//!
//! 非致命问题的上报通道与配置静态检查。
//!
//! ## 设计原则
//!
//! - 纯数据，不依赖 IO；控制器通过 `CurtainHost::report` 把诊断交给宿主
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 配置检查复用 `CurtainConfig::validate`，不重复校验逻辑

use crate::config::CurtainConfig;
use crate::error::SideEffectFailure;
use crate::particle::PARTICLE_TICK_INTERVAL;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 诊断对象（幕布标识 / 配置文件路径）
    pub subject: String,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            subject: subject.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 创建警告诊断
    pub fn warn(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            subject: subject.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 创建信息诊断
    pub fn info(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            subject: subject.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 由副作用失败生成警告诊断
    pub fn side_effect(subject: impl Into<String>, failure: &SideEffectFailure) -> Self {
        let message = match failure {
            SideEffectFailure::SoundPlayback { .. } => "开幕音效播放失败，动画继续",
        };
        Self::warn(subject, message).with_detail(failure.to_string())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.subject, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count_level(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count_level(DiagnosticLevel::Warn)
    }

    fn count_level(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

//=============================================================================
// 配置分析 API
//=============================================================================

/// 分析配置，返回诊断结果
///
/// 执行以下检查：
/// - 配置是否合法（动画时长必须大于 0）
/// - 启用粒子但动画时长短于一个粒子周期（不会生成任何粒子）
/// - 自动开幕延迟为 0（挂载后立即开幕）
pub fn analyze_config(subject: &str, config: &CurtainConfig) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    if let Err(e) = config.validate() {
        result.push(Diagnostic::error(subject, e.to_string()));
    }

    let tick_ms = PARTICLE_TICK_INTERVAL.as_millis() as u64;
    if config.particle_effect_enabled
        && config.animation_duration_ms > 0
        && config.animation_duration_ms < tick_ms
    {
        result.push(
            Diagnostic::warn(subject, "粒子效果已启用，但动画时长短于一个粒子周期").with_detail(
                format!(
                    "animation_duration_ms = {}，粒子周期为 {} ms，开幕期间不会生成粒子",
                    config.animation_duration_ms, tick_ms
                ),
            ),
        );
    }

    if config.auto_open_enabled && config.auto_open_delay_ms == 0 {
        result.push(Diagnostic::info(subject, "自动开幕延迟为 0，挂载后立即开幕"));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_clean() {
        let result = analyze_config("curtain.json", &CurtainConfig::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_zero_duration_is_error() {
        let config = CurtainConfig::default().with_animation_duration_ms(0);
        let result = analyze_config("curtain.json", &config);
        assert!(result.has_errors());
        assert_eq!(result.error_count(), 1);
        // 时长为 0 时不再重复报告粒子警告
        assert_eq!(result.warn_count(), 0);
    }

    #[test]
    fn test_short_duration_with_particles_warns() {
        let config = CurtainConfig::default().with_animation_duration_ms(150);
        let result = analyze_config("curtain.json", &config);
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 1);

        let silent = config.with_particles(false);
        assert!(analyze_config("curtain.json", &silent).is_empty());
    }

    #[test]
    fn test_zero_auto_open_delay_is_info() {
        let config = CurtainConfig::default().with_auto_open(0);
        let result = analyze_config("curtain.json", &config);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].level, DiagnosticLevel::Info);
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 0);
    }

    #[test]
    fn test_side_effect_diagnostic_display() {
        let diag = Diagnostic::side_effect("hero", &SideEffectFailure::sound("device busy"));
        assert_eq!(diag.level, DiagnosticLevel::Warn);
        assert_eq!(
            diag.to_string(),
            "[WARN] hero: 开幕音效播放失败，动画继续\n  | 音效播放失败: device busy"
        );
    }
}
