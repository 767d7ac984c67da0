//! # Surface 模块
//!
//! 终端渲染表面：把控制器的副作用画成文本。
//!
//! ## 功能特性
//!
//! - 合拢状态：标题、副标题、按钮与主题渐变
//! - 开幕：按钮按下提示、音效（终端响铃）
//! - 粒子：在固定宽度的轨道上按水平位置画出一颗星
//! - 完成：揭幕提示
//!
//! 写入失败只记录日志，不影响控制器状态；唯一例外是音效，
//! 它的失败以 [`SideEffectFailure`] 交还给控制器上报。

pub mod theme;

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::warn;

use curtain_runtime::{CurtainPhase, Diagnostic, Particle, SideEffectFailure};

pub use theme::CurtainTheme;

/// 粒子轨道宽度（字符）
const PARTICLE_TRACK_WIDTH: usize = 40;

/// 终端响铃
const BELL: &[u8] = b"\x07";

/// 幕布外观
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurtainPresentation {
    /// 标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 副标题
    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    /// 按钮文字
    #[serde(default = "default_button_text")]
    pub button_text: String,

    /// 主题
    #[serde(default)]
    pub theme: CurtainTheme,

    /// 左侧幕布图片（可选）
    #[serde(default)]
    pub left_curtain_image: Option<String>,

    /// 右侧幕布图片（可选）
    #[serde(default)]
    pub right_curtain_image: Option<String>,
}

pub(crate) fn default_title() -> String {
    "Welcome".to_string()
}

pub(crate) fn default_subtitle() -> String {
    "Click to Enter".to_string()
}

pub(crate) fn default_button_text() -> String {
    "Open Curtains".to_string()
}

impl Default for CurtainPresentation {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            button_text: default_button_text(),
            theme: CurtainTheme::default(),
            left_curtain_image: None,
            right_curtain_image: None,
        }
    }
}

/// 终端渲染表面
pub struct TerminalSurface<W: Write> {
    /// 幕布标识（每行前缀）
    id: String,
    /// 外观
    presentation: CurtainPresentation,
    /// 输出
    out: W,
    /// 已画出的粒子数量
    particles_drawn: usize,
}

impl<W: Write> TerminalSurface<W> {
    /// 创建渲染表面
    pub fn new(id: impl Into<String>, presentation: CurtainPresentation, out: W) -> Self {
        Self {
            id: id.into(),
            presentation,
            out,
            particles_drawn: 0,
        }
    }

    /// 幕布标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 当前外观
    pub fn presentation(&self) -> &CurtainPresentation {
        &self.presentation
    }

    /// 替换外观
    pub fn set_presentation(&mut self, presentation: CurtainPresentation) {
        self.presentation = presentation;
    }

    /// 已画出的粒子数量
    pub fn particles_drawn(&self) -> usize {
        self.particles_drawn
    }

    /// 输出
    pub fn output(&self) -> &W {
        &self.out
    }

    /// 写一行（失败只记录日志）
    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "[{}] {}", self.id, text) {
            warn!(curtain = %self.id, error = %e, "渲染输出失败");
        }
    }

    /// 画出合拢的幕布
    pub fn render_closed(&mut self) {
        let p = self.presentation.clone();
        let (from, to) = p.theme.gradient();
        self.line(&format!("═══ {} ═══", p.title));
        self.line(&p.subtitle);
        self.line(&format!("[▶ {}]  theme={} {from}→{to}", p.button_text, p.theme));
        if let Some(image) = &p.left_curtain_image {
            self.line(&format!("left curtain: {image}"));
        }
        if let Some(image) = &p.right_curtain_image {
            self.line(&format!("right curtain: {image}"));
        }
    }

    /// 画出当前阶段
    pub fn render_status(&mut self, phase: CurtainPhase) {
        self.line(&format!("phase={phase}"));
    }

    /// 开幕开始
    pub fn draw_open_start(&mut self) {
        let text = format!("▶ {} …", self.presentation.button_text);
        self.line(&text);
    }

    /// 开幕完成
    pub fn draw_open_complete(&mut self) {
        self.line("幕布已拉开 ✦");
    }

    /// 画出一个粒子
    pub fn draw_particle(&mut self, particle: Particle) {
        let column = ((particle.left_percent / 100.0) * PARTICLE_TRACK_WIDTH as f32) as usize;
        let column = column.min(PARTICLE_TRACK_WIDTH - 1);
        let mut track = vec!['·'; PARTICLE_TRACK_WIDTH];
        track[column] = '✦';
        let track: String = track.into_iter().collect();
        self.particles_drawn += 1;
        self.line(&format!(
            "{track} {:.1}s",
            particle.lifetime_ms as f64 / 1000.0
        ));
    }

    /// 画出诊断
    pub fn draw_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.line(&format!("⚠ {}", diagnostic.message));
    }

    /// 播放开幕音效（终端响铃）
    pub fn ring_bell(&mut self) -> Result<(), SideEffectFailure> {
        self.out
            .write_all(BELL)
            .and_then(|()| self.out.flush())
            .map_err(|e: io::Error| SideEffectFailure::sound(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(surface: &TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8_lossy(surface.output()).into_owned()
    }

    /// 总是失败的输出
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_render_closed() {
        let presentation = CurtainPresentation {
            theme: CurtainTheme::Gold,
            ..CurtainPresentation::default()
        };
        let mut surface = TerminalSurface::new("hero", presentation, Vec::new());
        surface.render_closed();

        let text = rendered(&surface);
        assert!(text.contains("[hero] ═══ Welcome ═══"));
        assert!(text.contains("[hero] Click to Enter"));
        assert!(text.contains("[▶ Open Curtains]  theme=gold #DAA520→#FFD700"));
    }

    #[test]
    fn test_particle_column() {
        let mut surface = TerminalSurface::new("p", CurtainPresentation::default(), Vec::new());
        surface.draw_particle(Particle {
            left_percent: 0.0,
            lifetime_ms: 2500,
        });
        surface.draw_particle(Particle {
            left_percent: 99.99,
            lifetime_ms: 5000,
        });
        assert_eq!(surface.particles_drawn(), 2);

        let text = rendered(&surface);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("[p] ✦·"));
        assert!(lines[0].ends_with(" 2.5s"));
        assert!(lines[1].contains("·✦ 5.0s"));
    }

    #[test]
    fn test_bell_failure_maps_to_side_effect() {
        let mut surface = TerminalSurface::new("x", CurtainPresentation::default(), BrokenPipe);
        let err = surface.ring_bell().unwrap_err();
        assert!(matches!(err, SideEffectFailure::SoundPlayback { .. }));

        // 普通渲染失败不会 panic
        surface.render_closed();
    }

    #[test]
    fn test_bell_writes_bel() {
        let mut surface = TerminalSurface::new("x", CurtainPresentation::default(), Vec::new());
        surface.ring_bell().unwrap();
        assert_eq!(surface.output().as_slice(), BELL);
    }
}
