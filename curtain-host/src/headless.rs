//! # Headless 模块
//!
//! 虚拟时间运行：不睡眠，按到期顺序依次触发所有幕布的定时器。
//!
//! 用于 `--headless` 与集成测试。每块幕布有自己的 [`VirtualTimers`]，
//! 它们从同一时刻 0 开始，每次只推进全局最早到期的那一个。

use std::io::Write;

use tracing::{debug, info};

use curtain_runtime::{CurtainRegistry, VirtualTimers};

use crate::adapter::{SurfaceHost, mount};
use crate::config::Settings;
use crate::error::{HostError, HostResult};

/// headless 运行使用的宿主
pub type HeadlessHost<W> = SurfaceHost<VirtualTimers, W>;

/// 运行结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadlessReport {
    /// 最后一个定时器触发时的虚拟时间（毫秒）
    pub elapsed_ms: u64,
    /// 触发的定时器数量
    pub timers_fired: usize,
    /// 已拉开的幕布
    pub opened: Vec<String>,
    /// 收到的诊断数量
    pub diagnostics: usize,
}

/// 构建 headless 注册表
///
/// `out` 为每块幕布创建输出；指定 `particle_seed` 时第 i 块幕布使用 `seed + i`。
pub fn build<W, F>(
    ids: &[String],
    settings: &Settings,
    particle_seed: Option<u64>,
    mut out: F,
) -> HostResult<CurtainRegistry<HeadlessHost<W>>>
where
    W: Write,
    F: FnMut(&str) -> W,
{
    let mut registry = CurtainRegistry::new();
    for (index, id) in ids.iter().enumerate() {
        if registry.get(id).is_some() {
            return Err(HostError::DuplicateCurtain(id.clone()));
        }
        let seed = particle_seed.map(|s| s.wrapping_add(index as u64));
        let curtain = mount(id, settings, seed, VirtualTimers::new(), out(id.as_str()))?;
        registry.register(id.as_str(), curtain);
    }
    Ok(registry)
}

/// 在虚拟时间上运行直到全部拉开、没有定时器或超过 `limit_ms`
///
/// 没有安排自动开幕的幕布在时刻 0 被打开（模拟一次点击）。
pub fn run<W: Write>(
    registry: &mut CurtainRegistry<HeadlessHost<W>>,
    limit_ms: u64,
) -> HeadlessReport {
    let mut report = HeadlessReport::default();

    for (id, curtain) in registry.iter_mut() {
        let armed = curtain
            .timers()
            .is_some_and(|timers| timers.auto_open.is_some());
        if !armed {
            debug!(curtain = %id, "没有自动开幕，模拟点击");
            curtain.open();
        }
    }

    while !registry.all_open() {
        let next = registry
            .iter()
            .filter_map(|(id, curtain)| {
                let due = curtain.host()?.timers.next_due_ms()?;
                Some((due, id.to_string()))
            })
            .min();
        let Some((due, id)) = next else {
            break;
        };
        if due > limit_ms {
            info!(due_ms = due, limit_ms, "超过虚拟时间上限");
            break;
        }

        // 所有时钟对齐到同一时刻
        for (_, curtain) in registry.iter_mut() {
            if let Some(host) = curtain.host_mut() {
                host.timers.advance_to(due);
            }
        }

        let timer = registry
            .get_mut(&id)
            .and_then(|curtain| curtain.host_mut())
            .and_then(|host| host.timers.pop_due(due));
        if let Some(timer) = timer {
            registry.dispatch(&id, timer);
            report.timers_fired += 1;
            report.elapsed_ms = due;
        }
    }

    for (id, curtain) in registry.iter() {
        if curtain.is_open() {
            report.opened.push(id.to_string());
        }
        report.diagnostics += curtain.host().map_or(0, |host| host.diagnostics.len());
    }
    info!(
        elapsed_ms = report.elapsed_ms,
        timers_fired = report.timers_fired,
        opened = report.opened.len(),
        "headless 运行结束"
    );
    report
}
