//! # Registry 模块
//!
//! 标识到控制器的映射，由应用持有。
//!
//! 批量操作只是逐个调用控制器的标准 `open` / `reset`，
//! 注册表不参与控制器的生命周期，只在移除时负责卸载。

use std::collections::BTreeMap;

use tracing::debug;

use crate::controller::CurtainController;
use crate::host::CurtainHost;
use crate::timer::TimerId;

/// 幕布注册表
///
/// 按标识排序遍历，批量操作的执行顺序是确定的。
pub struct CurtainRegistry<H: CurtainHost> {
    curtains: BTreeMap<String, CurtainController<H>>,
}

impl<H: CurtainHost> Default for CurtainRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: CurtainHost> CurtainRegistry<H> {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            curtains: BTreeMap::new(),
        }
    }

    /// 注册幕布
    ///
    /// 同一标识已存在时，旧控制器被卸载并返回其宿主。
    pub fn register(&mut self, id: impl Into<String>, curtain: CurtainController<H>) -> Option<H> {
        let id = id.into();
        debug!(curtain = %id, "注册幕布");
        self.curtains
            .insert(id, curtain)
            .and_then(|mut old| old.detach())
    }

    /// 注销幕布（卸载后返回控制器）
    pub fn unregister(&mut self, id: &str) -> Option<CurtainController<H>> {
        let mut curtain = self.curtains.remove(id)?;
        curtain.detach();
        debug!(curtain = %id, "注销幕布");
        Some(curtain)
    }

    /// 打开指定幕布，返回幕布是否存在
    pub fn open(&mut self, id: &str) -> bool {
        match self.curtains.get_mut(id) {
            Some(curtain) => {
                curtain.open();
                true
            }
            None => false,
        }
    }

    /// 重置指定幕布，返回幕布是否存在
    pub fn reset(&mut self, id: &str) -> bool {
        match self.curtains.get_mut(id) {
            Some(curtain) => {
                curtain.reset();
                true
            }
            None => false,
        }
    }

    /// 打开全部幕布
    pub fn open_all(&mut self) {
        for curtain in self.curtains.values_mut() {
            curtain.open();
        }
    }

    /// 重置全部幕布
    pub fn reset_all(&mut self) {
        for curtain in self.curtains.values_mut() {
            curtain.reset();
        }
    }

    /// 把到期的定时器转交给对应幕布，返回是否产生了效果
    pub fn dispatch(&mut self, id: &str, timer: TimerId) -> bool {
        self.curtains
            .get_mut(id)
            .is_some_and(|curtain| curtain.on_timer(timer))
    }

    /// 获取幕布
    pub fn get(&self, id: &str) -> Option<&CurtainController<H>> {
        self.curtains.get(id)
    }

    /// 获取幕布（可变）
    pub fn get_mut(&mut self, id: &str) -> Option<&mut CurtainController<H>> {
        self.curtains.get_mut(id)
    }

    /// 遍历全部幕布
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurtainController<H>)> {
        self.curtains.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// 遍历全部幕布（可变）
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut CurtainController<H>)> {
        self.curtains.iter_mut().map(|(id, c)| (id.as_str(), c))
    }

    /// 全部标识
    pub fn ids(&self) -> Vec<String> {
        self.curtains.keys().cloned().collect()
    }

    /// 幕布数量
    pub fn len(&self) -> usize {
        self.curtains.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.curtains.is_empty()
    }

    /// 是否全部已拉开（空注册表返回 false）
    pub fn all_open(&self) -> bool {
        !self.curtains.is_empty() && self.curtains.values().all(|c| c.is_open())
    }
}
