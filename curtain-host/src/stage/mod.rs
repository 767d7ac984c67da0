//! # Stage 模块
//!
//! 实时舞台：tokio 单线程事件循环。
//!
//! 舞台持有幕布注册表、定时器事件通道与当前设置，
//! 在一个 `select!` 循环里交替处理到期的定时器和用户命令。
//!
//! ```text
//! stdin ──► StageCommand ──┐
//!                          ├──► Stage::run ──► CurtainRegistry
//! TokioTimers ──► TimerFired┘
//! ```

pub mod command;
pub mod timers;

use std::io::Write;
use std::ops::ControlFlow;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use curtain_runtime::CurtainRegistry;

use crate::adapter::{SurfaceHost, mount};
use crate::config::Settings;
use crate::element::AttributeChange;
use crate::error::{HostError, HostResult};

pub use command::{CommandError, StageCommand};
pub use timers::{TimerFired, TokioTimers};

/// 实时舞台使用的宿主
pub type StageHost<W> = SurfaceHost<TokioTimers, W>;

/// 实时舞台
pub struct Stage<W: Write> {
    registry: CurtainRegistry<StageHost<W>>,
    settings: Settings,
    exit_when_open: bool,
    timer_tx: UnboundedSender<TimerFired>,
    timer_rx: UnboundedReceiver<TimerFired>,
}

impl<W: Write> Stage<W> {
    /// 创建空舞台
    pub fn new(settings: Settings, exit_when_open: bool) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            registry: CurtainRegistry::new(),
            settings,
            exit_when_open,
            timer_tx,
            timer_rx,
        }
    }

    /// 添加一块幕布
    ///
    /// 必须在 tokio 运行时内调用（自动开幕会立即安排定时器）。
    pub fn add_curtain(&mut self, id: &str, out: W, particle_seed: Option<u64>) -> HostResult<()> {
        if self.registry.get(id).is_some() {
            return Err(HostError::DuplicateCurtain(id.to_string()));
        }
        let timers = TokioTimers::new(id, self.timer_tx.clone());
        let curtain = mount(id, &self.settings, particle_seed, timers, out)?;
        self.registry.register(id, curtain);
        Ok(())
    }

    /// 幕布注册表
    pub fn registry(&self) -> &CurtainRegistry<StageHost<W>> {
        &self.registry
    }

    /// 当前设置
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 是否满足退出条件
    pub fn is_finished(&self) -> bool {
        self.exit_when_open && self.registry.all_open()
    }

    /// 是否没有任何待触发的定时器
    pub fn is_idle(&self) -> bool {
        self.registry
            .iter()
            .all(|(_, curtain)| curtain.timers().is_none_or(|t| t.is_empty()))
    }

    /// 处理一个到期事件
    pub fn dispatch(&mut self, fired: TimerFired) -> bool {
        let applied = self.registry.dispatch(&fired.curtain, fired.timer);
        if !applied {
            debug!(curtain = %fired.curtain, timer = %fired.timer, "忽略过期定时器");
        }
        applied
    }

    /// 处理一条命令
    pub fn handle(&mut self, command: StageCommand) -> ControlFlow<()> {
        debug!(?command, "处理命令");
        match command {
            StageCommand::Open(None) => self.registry.open_all(),
            StageCommand::Open(Some(id)) => {
                if !self.registry.open(&id) {
                    warn!(curtain = %id, "未知幕布");
                }
            }
            StageCommand::Reset(target) => {
                // 与元素的 reset 一致：复位后重新安排自动开幕
                for id in self.targets(target) {
                    let armed = self.registry.get_mut(&id).is_some_and(|curtain| {
                        curtain.reset();
                        curtain.rearm()
                    });
                    debug!(curtain = %id, armed, "复位");
                    self.redraw_closed(&id);
                }
            }
            StageCommand::Rearm(target) => {
                for id in self.targets(target) {
                    let armed = self
                        .registry
                        .get_mut(&id)
                        .is_some_and(|curtain| curtain.rearm());
                    debug!(curtain = %id, armed, "重新安排自动开幕");
                }
            }
            StageCommand::Set { name, value } => match self.settings.attributes.set(name, value) {
                Ok(Some(change)) => self.apply_change(change),
                Ok(None) => debug!("属性未变化"),
                Err(e) => warn!(error = %e, "属性设置失败"),
            },
            StageCommand::Unset { name } => match self.settings.attributes.remove(&name) {
                Ok(Some(change)) => self.apply_change(change),
                Ok(None) => debug!(attr = %name, "属性不存在"),
                Err(e) => warn!(error = %e, "属性移除失败"),
            },
            StageCommand::Status => {
                for (_, curtain) in self.registry.iter_mut() {
                    let phase = curtain.phase();
                    if let Some(host) = curtain.host_mut() {
                        host.surface.render_status(phase);
                    }
                }
            }
            StageCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// 命令目标：指定标识或全部幕布
    fn targets(&self, target: Option<String>) -> Vec<String> {
        match target {
            Some(id) if self.registry.get(&id).is_some() => vec![id],
            Some(id) => {
                warn!(curtain = %id, "未知幕布");
                Vec::new()
            }
            None => self.registry.ids(),
        }
    }

    fn redraw_closed(&mut self, id: &str) {
        if let Some(curtain) = self.registry.get_mut(id)
            && curtain.can_open()
            && let Some(host) = curtain.host_mut()
        {
            host.surface.render_closed();
        }
    }

    /// 属性变更后重新求值设置并交给每块幕布
    fn apply_change(&mut self, change: AttributeChange) {
        let config = match self.settings.resolve_config() {
            Ok(config) => config,
            Err(e) => {
                warn!(attr = %change.name, error = %e, "属性值不合法，已撤销");
                self.revert(&change);
                return;
            }
        };
        let presentation = self.settings.resolve_presentation();
        info!(
            attr = %change.name,
            reschedule = change.affects_auto_open(),
            "元素属性已变更"
        );

        for id in self.registry.ids() {
            let Some(curtain) = self.registry.get_mut(&id) else {
                continue;
            };
            if let Err(e) = curtain.reconfigure(config.clone()) {
                warn!(curtain = %id, error = %e, "重新配置失败");
            }
            if let Some(host) = curtain.host_mut() {
                host.surface.set_presentation(presentation.clone());
            }
            self.redraw_closed(&id);
        }
    }

    fn revert(&mut self, change: &AttributeChange) {
        let reverted = match &change.old {
            Some(old) => self.settings.attributes.set(change.name.clone(), old.clone()),
            None => self.settings.attributes.remove(&change.name),
        };
        if let Err(e) = reverted {
            warn!(attr = %change.name, error = %e, "属性撤销失败");
        }
    }

    /// 运行事件循环
    ///
    /// 以下任一情况结束：
    /// - 收到 `quit`
    /// - 全部幕布已拉开且未要求停留
    /// - 命令通道已关闭且没有待触发的定时器
    pub async fn run(&mut self, commands: &mut UnboundedReceiver<StageCommand>) {
        let mut commands_open = true;
        loop {
            if self.is_finished() {
                info!("全部幕布已拉开");
                break;
            }
            if !commands_open && self.is_idle() {
                info!("没有待触发的定时器，舞台结束");
                break;
            }

            tokio::select! {
                Some(fired) = self.timer_rx.recv() => {
                    self.dispatch(fired);
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if self.handle(command).is_break() {
                            info!("收到退出命令");
                            break;
                        }
                    }
                    None => commands_open = false,
                },
            }
        }
    }
}
