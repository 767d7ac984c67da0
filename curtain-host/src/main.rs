//! `curtain`：终端幕布开场效果。
//!
//! 用法示例：
//!
//! ```text
//! curtain --auto-open --auto-open-delay 1500 --theme gold
//! curtain -a speed=800 -a sparkles=false --curtain hero --curtain footer
//! curtain --headless --seed 7
//! ```

use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{Level, info, warn};

use curtain_host::config::{AppConfig, Overrides, Settings};
use curtain_host::element::ElementAttributes;
use curtain_host::headless;
use curtain_host::stage::{CommandError, Stage, StageCommand};
use curtain_host::surface::CurtainTheme;
use curtain_runtime::{DiagnosticLevel, analyze_config};

/// headless 模式的虚拟时间上限（毫秒）
const HEADLESS_LIMIT_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Parser)]
#[command(name = "curtain", version, about = "终端幕布开场效果")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "curtain.json")]
    config: PathBuf,

    /// 开幕动画时长（毫秒）
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    speed: Option<u64>,

    /// 启用自动开幕
    #[arg(long)]
    auto_open: bool,

    /// 自动开幕延迟（毫秒）
    #[arg(long, value_name = "MS")]
    auto_open_delay: Option<u64>,

    /// 关闭粒子效果
    #[arg(long)]
    no_sparkles: bool,

    /// 开幕时响铃
    #[arg(long)]
    sound: bool,

    /// 主题（default / royal / elegant / gold / saffron）
    #[arg(long)]
    theme: Option<String>,

    /// 标题
    #[arg(long)]
    title: Option<String>,

    /// 副标题
    #[arg(long)]
    subtitle: Option<String>,

    /// 按钮文字
    #[arg(long)]
    button_text: Option<String>,

    /// 元素属性（`name=value` 或单独的 `name`），可重复
    #[arg(short = 'a', long = "attr", value_name = "NAME[=VALUE]")]
    attrs: Vec<String>,

    /// 幕布标识，可重复（覆盖配置文件）
    #[arg(long = "curtain", value_name = "ID")]
    curtains: Vec<String>,

    /// 粒子随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 在虚拟时间上运行，不等待
    #[arg(long)]
    headless: bool,

    /// 全部拉开后不退出
    #[arg(long)]
    stay: bool,

    /// 日志详细程度（-v、-vv）
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            animation_duration_ms: self.speed,
            auto_open: self.auto_open.then_some(true),
            auto_open_delay_ms: self.auto_open_delay,
            particles: self.no_sparkles.then_some(false),
            sound: self.sound.then_some(true),
            theme: self.theme.as_deref().map(CurtainTheme::from_name),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            button_text: self.button_text.clone(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut app = AppConfig::load(&cli.config);
    for token in &cli.attrs {
        let (name, value) = ElementAttributes::parse_assignment(token);
        app.attributes.insert(name, value);
    }
    if !cli.curtains.is_empty() {
        app.curtains = cli.curtains.clone();
    }
    if let Some(seed) = cli.seed {
        app.particle_seed = Some(seed);
    }
    if cli.stay {
        app.exit_when_open = false;
    }

    let settings = Settings::new(&app, cli.overrides()).context("元素属性不合法")?;
    app.curtain = settings.resolve_config().context("元素属性不合法")?;
    app.validate().context("配置不合法")?;

    for diagnostic in analyze_config("curtain", &app.curtain).diagnostics {
        match diagnostic.level {
            DiagnosticLevel::Info => info!("{diagnostic}"),
            _ => warn!("{diagnostic}"),
        }
    }

    if cli.headless {
        let mut registry = headless::build(&app.curtains, &settings, app.particle_seed, |_| {
            io::stdout()
        })?;
        let report = headless::run(&mut registry, HEADLESS_LIMIT_MS);
        info!(?report, "headless 完成");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()
        .context("无法创建 tokio 运行时")?;
    let result = runtime.block_on(run_stage(app, settings));
    // 标准输入的读取占着阻塞线程，不等它结束
    runtime.shutdown_background();
    result
}

async fn run_stage(app: AppConfig, settings: Settings) -> Result<()> {
    let mut stage: Stage<Stdout> = Stage::new(settings, app.exit_when_open);
    for (index, id) in app.curtains.iter().enumerate() {
        let seed = app.particle_seed.map(|s| s.wrapping_add(index as u64));
        stage.add_curtain(id, io::stdout(), seed)?;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match StageCommand::parse(&line) {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => warn!(error = %e, "无法解析命令"),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "读取标准输入失败");
                    break;
                }
            }
        }
    });

    stage.run(&mut rx).await;
    Ok(())
}
