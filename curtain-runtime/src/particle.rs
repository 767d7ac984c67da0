//! # Particle 模块
//!
//! 开幕期间的装饰粒子。
//!
//! 控制器只负责周期性地生成粒子描述并交给宿主；
//! 粒子的绘制与到期移除完全由渲染表面负责，控制器不跟踪单个粒子。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 粒子生成周期
pub const PARTICLE_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// 粒子最短寿命（毫秒）
pub const PARTICLE_MIN_LIFETIME_MS: u64 = 2000;

/// 粒子最长寿命（毫秒）
pub const PARTICLE_MAX_LIFETIME_MS: u64 = 5000;

/// 单个粒子
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// 水平位置（容器宽度百分比，0.0 - 100.0）
    pub left_percent: f32,
    /// 寿命（到期后由渲染表面移除）
    pub lifetime_ms: u64,
}

impl Particle {
    /// 寿命
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

/// 粒子生成器
#[derive(Debug, Clone)]
pub struct ParticleSpawner {
    rng: ChaCha8Rng,
}

impl ParticleSpawner {
    /// 创建生成器
    ///
    /// 指定 `seed` 时输出序列可复现。
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self { rng }
    }

    /// 生成一个粒子
    pub fn spawn(&mut self) -> Particle {
        Particle {
            left_percent: self.rng.random_range(0.0..100.0),
            lifetime_ms: self
                .rng
                .random_range(PARTICLE_MIN_LIFETIME_MS..=PARTICLE_MAX_LIFETIME_MS),
        }
    }
}

impl Default for ParticleSpawner {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particles_within_bounds() {
        let mut spawner = ParticleSpawner::new(Some(7));
        for _ in 0..500 {
            let p = spawner.spawn();
            assert!((0.0..100.0).contains(&p.left_percent));
            assert!((2000..=5000).contains(&p.lifetime_ms));
        }
    }

    #[test]
    fn test_seeded_spawner_is_reproducible() {
        let mut a = ParticleSpawner::new(Some(42));
        let mut b = ParticleSpawner::new(Some(42));
        for _ in 0..10 {
            assert_eq!(a.spawn(), b.spawn());
        }
    }
}
