//! Explosion pattern generators.
//!
//! Every generator turns a [`Burst`] into a fresh set of particles centred on
//! the burst origin. Particle colors are the burst color with independent
//! per-channel jitter.

use serde::Deserialize;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use crate::color::Rgb;
use crate::config::ConfigError;
use crate::particle::{Particle, Physics};

pub const CROSSETTE_CHILDREN: usize = 5;

/// Pattern requested for a firework; `Random` is resolved when it explodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Circle,
    Chrysanthemum,
    Willow,
    Crossette,
    Ring,
    #[default]
    Random,
}

/// A concrete explosion shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Circle,
    Chrysanthemum,
    Willow,
    Crossette,
    Ring,
}

/// What a generator needs to know about the shell that burst.
#[derive(Clone, Copy, Debug)]
pub struct Burst {
    pub count: usize,
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    pub size: f32,
}

pub struct Explosion {
    pub pattern: Pattern,
    pub particles: Vec<Particle>,
    /// Delay before crossette parents split, if this pattern has any.
    pub split_after_ms: Option<u64>,
}

impl PatternType {
    pub const ALL: [PatternType; 6] = [
        PatternType::Circle,
        PatternType::Chrysanthemum,
        PatternType::Willow,
        PatternType::Crossette,
        PatternType::Ring,
        PatternType::Random,
    ];

    pub fn resolve(self, rng: &mut fastrand::Rng) -> Pattern {
        match self {
            PatternType::Circle => Pattern::Circle,
            PatternType::Chrysanthemum => Pattern::Chrysanthemum,
            PatternType::Willow => Pattern::Willow,
            PatternType::Crossette => Pattern::Crossette,
            PatternType::Ring => Pattern::Ring,
            PatternType::Random => Pattern::ALL[rng.usize(0..Pattern::ALL.len())],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternType::Circle => "circle",
            PatternType::Chrysanthemum => "chrysanthemum",
            PatternType::Willow => "willow",
            PatternType::Crossette => "crossette",
            PatternType::Ring => "ring",
            PatternType::Random => "random",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPattern(s.to_string()))
    }
}

impl Pattern {
    pub const ALL: [Pattern; 5] = [
        Pattern::Circle,
        Pattern::Chrysanthemum,
        Pattern::Willow,
        Pattern::Crossette,
        Pattern::Ring,
    ];

    pub fn explode(self, burst: &Burst, rng: &mut fastrand::Rng) -> Explosion {
        let mut split_after_ms = None;
        let particles = match self {
            Pattern::Circle => circle(burst, rng),
            Pattern::Chrysanthemum => chrysanthemum(burst, rng),
            Pattern::Willow => willow(burst, rng),
            Pattern::Crossette => {
                split_after_ms = Some(300 + rng.u64(0..200));
                crossette(burst, rng)
            }
            Pattern::Ring => ring(burst, rng),
        };

        Explosion {
            pattern: self,
            particles,
            split_after_ms,
        }
    }
}

fn radial(angle: f32, speed: f32) -> (f32, f32) {
    (angle.cos() * speed, angle.sin() * speed)
}

// Angle of spoke i out of n, evenly covering a full turn
fn spoke(i: usize, n: f32) -> f32 {
    i as f32 / n * TAU
}

fn spark_size(burst: &Burst, rng: &mut fastrand::Rng) -> f32 {
    (1.0 + rng.f32() * 1.5) * burst.size
}

pub fn circle(burst: &Burst, rng: &mut fastrand::Rng) -> Vec<Particle> {
    (0..burst.count)
        .map(|i| {
            let speed = (2.0 + rng.f32() * 3.0) * burst.size;
            let (vx, vy) = radial(spoke(i, burst.count as f32), speed);
            let physics = Physics {
                gravity: 0.05,
                friction: 0.98,
                fade_rate: 0.005 + rng.f32() * 0.005,
            };
            let color = burst.color.jitter(rng);
            Particle::new(burst.x, burst.y, vx, vy, color, physics, spark_size(burst, rng))
        })
        .collect()
}

/// Two concentric shells; the inner one is slower, giving a denser core.
pub fn chrysanthemum(burst: &Burst, rng: &mut fastrand::Rng) -> Vec<Particle> {
    const LAYERS: usize = 2;
    let per_layer = burst.count / LAYERS;
    let mut particles = Vec::with_capacity(per_layer * LAYERS);

    for layer in 0..LAYERS {
        let layer_speed = (1.5 + layer as f32 * 1.5) * burst.size;
        for i in 0..per_layer {
            let speed = layer_speed + rng.f32();
            let (vx, vy) = radial(spoke(i, per_layer as f32), speed);
            let physics = Physics {
                gravity: 0.03,
                friction: 0.99,
                fade_rate: 0.004 + rng.f32() * 0.003,
            };
            let color = burst.color.jitter(rng);
            particles.push(Particle::new(burst.x, burst.y, vx, vy, color, physics, spark_size(burst, rng)));
        }
    }
    particles
}

pub fn willow(burst: &Burst, rng: &mut fastrand::Rng) -> Vec<Particle> {
    (0..burst.count)
        .map(|i| {
            let speed = (3.0 + rng.f32() * 2.0) * burst.size;
            let (vx, vy) = radial(spoke(i, burst.count as f32), speed);
            // Heavy gravity and slow fade draw long drooping streaks
            let physics = Physics {
                gravity: 0.1,
                friction: 0.98,
                fade_rate: 0.003 + rng.f32() * 0.002,
            };
            let color = burst.color.jitter(rng);
            Particle::new(burst.x, burst.y, vx, vy, color, physics, spark_size(burst, rng)).with_trail()
        })
        .collect()
}

/// A small circle burst plus long-lived parents that later split in five.
pub fn crossette(burst: &Burst, rng: &mut fastrand::Rng) -> Vec<Particle> {
    let initial = Burst {
        count: burst.count * 3 / 10,
        ..*burst
    };
    let mut particles = circle(&initial, rng);

    let parent_count = burst.count * 7 / 10;
    let spokes = parent_count as f32 / CROSSETTE_CHILDREN as f32;
    for i in 0..parent_count.div_ceil(CROSSETTE_CHILDREN) {
        let speed = (2.0 + rng.f32() * 2.0) * burst.size;
        let (vx, vy) = radial(spoke(i, spokes), speed);
        let physics = Physics {
            gravity: 0.05,
            friction: 0.98,
            fade_rate: 0.001,
        };
        let color = burst.color.jitter(rng);
        let size = (2.0 + rng.f32()) * burst.size;
        particles.push(
            Particle::new(burst.x, burst.y, vx, vy, color, physics, size)
                .with_trail()
                .as_crossette_parent(),
        );
    }
    particles
}

/// Children of a splitting crossette parent, spawned at its current position.
pub fn crossette_children(parent: &Particle, size: f32, rng: &mut fastrand::Rng) -> Vec<Particle> {
    (0..CROSSETTE_CHILDREN)
        .map(|j| {
            let (dx, dy) = radial(spoke(j, CROSSETTE_CHILDREN as f32), 2.0 * size);
            let physics = Physics {
                gravity: 0.05,
                friction: 0.98,
                fade_rate: 0.01 + rng.f32() * 0.01,
            };
            Particle::new(
                parent.x,
                parent.y,
                parent.vx * 0.3 + dx,
                parent.vy * 0.3 + dy,
                parent.color,
                physics,
                parent.size() * 0.6,
            )
            .with_trail()
        })
        .collect()
}

/// A flattened horizontal ring crossed by a narrower vertical one.
pub fn ring(burst: &Burst, rng: &mut fastrand::Rng) -> Vec<Particle> {
    let horizontal = burst.count * 6 / 10;
    let vertical = burst.count * 4 / 10;
    let mut particles = Vec::with_capacity(horizontal + vertical);

    for (n, squash_x, squash_y) in [(horizontal, 1.0, 0.3), (vertical, 0.3, 1.0)] {
        for i in 0..n {
            let speed = (3.0 + rng.f32()) * burst.size;
            let (vx, vy) = radial(spoke(i, n as f32), speed);
            let physics = Physics {
                gravity: 0.04,
                friction: 0.99,
                fade_rate: 0.004 + rng.f32() * 0.002,
            };
            let color = burst.color.jitter(rng);
            particles.push(Particle::new(
                burst.x,
                burst.y,
                vx * squash_x,
                vy * squash_y,
                color,
                physics,
                spark_size(burst, rng),
            ));
        }
    }
    particles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(count: usize, size: f32) -> Burst {
        Burst {
            count,
            x: 100.0,
            y: 200.0,
            color: Rgb::new(200, 100, 50),
            size,
        }
    }

    fn speed(p: &Particle) -> f32 {
        (p.vx * p.vx + p.vy * p.vy).sqrt()
    }

    fn assert_color_near(c: Rgb, base: Rgb) {
        for (a, b) in [(c.r, base.r), (c.g, base.g), (c.b, base.b)] {
            assert!((a as i32 - b as i32).abs() <= 15);
        }
    }

    #[test]
    fn test_circle_evenly_spaced_from_origin() {
        let mut rng = fastrand::Rng::with_seed(42);
        let n = 12;
        let particles = circle(&burst(n, 1.0), &mut rng);
        assert_eq!(particles.len(), n);

        for (i, p) in particles.iter().enumerate() {
            assert_eq!((p.x, p.y), (100.0, 200.0));
            let expected = TAU * i as f32 / n as f32;
            let angle = p.vy.atan2(p.vx).rem_euclid(TAU);
            let diff = (angle - expected).abs();
            assert!(diff < 1e-3 || (TAU - diff) < 1e-3, "spoke {} at {}", i, angle);
            assert!((2.0..=5.0).contains(&speed(p)));
            assert!((0.005..=0.01).contains(&p.fade_rate()));
            assert!((1.0..=2.5).contains(&p.size()));
            assert_eq!((p.gravity(), p.friction()), (0.05, 0.98));
            assert!(!p.has_trail());
            assert_color_near(p.color, Rgb::new(200, 100, 50));
        }
    }

    #[test]
    fn test_circle_scales_with_size_multiplier() {
        let mut rng = fastrand::Rng::with_seed(7);
        for p in circle(&burst(50, 2.0), &mut rng) {
            assert!((4.0..=10.0).contains(&speed(&p)));
            assert!((2.0..=5.0).contains(&p.size()));
        }
    }

    #[test]
    fn test_chrysanthemum_two_speed_bands() {
        let mut rng = fastrand::Rng::with_seed(42);
        let particles = chrysanthemum(&burst(51, 1.0), &mut rng);
        assert_eq!(particles.len(), 50);

        let (inner, outer) = particles.split_at(25);
        assert!(inner.iter().all(|p| (1.5..=2.5).contains(&speed(p))));
        assert!(outer.iter().all(|p| (3.0..=4.0).contains(&speed(p))));
        for p in &particles {
            assert_eq!((p.gravity(), p.friction()), (0.03, 0.99));
            assert!(p.fade_rate() >= 0.004 && p.fade_rate() < 0.007);
            assert!(!p.has_trail());
        }
    }

    #[test]
    fn test_willow_droops_with_trails() {
        let mut rng = fastrand::Rng::with_seed(42);
        let particles = willow(&burst(30, 1.0), &mut rng);
        assert_eq!(particles.len(), 30);
        for p in &particles {
            assert!(p.has_trail());
            assert_eq!(p.gravity(), 0.1);
            assert!((3.0..=5.0).contains(&speed(p)));
            assert!(p.fade_rate() >= 0.003 && p.fade_rate() < 0.005);
        }
    }

    #[test]
    fn test_crossette_splits_count() {
        let mut rng = fastrand::Rng::with_seed(42);
        let particles = crossette(&burst(100, 1.0), &mut rng);
        let parents: Vec<&Particle> = particles.iter().filter(|p| p.is_crossette_parent()).collect();

        assert_eq!(particles.len() - parents.len(), 30);
        assert_eq!(parents.len(), 14);
        for p in parents {
            assert!(p.has_trail());
            assert_eq!(p.fade_rate(), 0.001);
            assert!((2.0..=3.0).contains(&p.size()));
        }
    }

    #[test]
    fn test_crossette_children_inherit_parent() {
        let mut rng = fastrand::Rng::with_seed(42);
        let parent = crossette(&burst(100, 1.0), &mut rng)
            .into_iter()
            .find(Particle::is_crossette_parent)
            .unwrap();

        let children = crossette_children(&parent, 1.0, &mut rng);
        assert_eq!(children.len(), CROSSETTE_CHILDREN);
        for (j, c) in children.iter().enumerate() {
            assert_eq!((c.x, c.y), (parent.x, parent.y));
            assert_eq!(c.color, parent.color);
            assert!((c.size() - parent.size() * 0.6).abs() < 1e-6);
            assert!(c.fade_rate() >= 0.01 && c.fade_rate() < 0.02);
            assert!(c.has_trail());

            let angle = TAU * j as f32 / CROSSETTE_CHILDREN as f32;
            assert!((c.vx - (parent.vx * 0.3 + angle.cos() * 2.0)).abs() < 1e-5);
            assert!((c.vy - (parent.vy * 0.3 + angle.sin() * 2.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ring_flattened_bands() {
        let mut rng = fastrand::Rng::with_seed(42);
        let particles = ring(&burst(100, 1.0), &mut rng);
        assert_eq!(particles.len(), 100);

        let (horizontal, vertical) = particles.split_at(60);
        assert!(horizontal.iter().all(|p| p.vy.abs() <= 4.0 * 0.3 + 1e-5));
        assert!(vertical.iter().all(|p| p.vx.abs() <= 4.0 * 0.3 + 1e-5));
        for p in &particles {
            assert_eq!((p.gravity(), p.friction()), (0.04, 0.99));
        }
    }

    #[test]
    fn test_only_crossette_schedules_split() {
        let mut rng = fastrand::Rng::with_seed(42);
        for pattern in Pattern::ALL {
            let explosion = pattern.explode(&burst(40, 1.0), &mut rng);
            match pattern {
                Pattern::Crossette => {
                    let delay = explosion.split_after_ms.unwrap();
                    assert!((300..500).contains(&delay));
                }
                _ => assert!(explosion.split_after_ms.is_none()),
            }
            assert_eq!(explosion.pattern, pattern);
        }
    }

    #[test]
    fn test_random_resolves_to_every_pattern() {
        let mut rng = fastrand::Rng::with_seed(42);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let p = PatternType::Random.resolve(&mut rng);
            if !seen.contains(&p) {
                seen.push(p);
            }
        }
        assert_eq!(seen.len(), Pattern::ALL.len());
        assert_eq!(PatternType::Ring.resolve(&mut rng), Pattern::Ring);
    }

    #[test]
    fn test_pattern_type_from_str() {
        assert_eq!("Willow".parse::<PatternType>().unwrap(), PatternType::Willow);
        assert!("peony".parse::<PatternType>().is_err());
    }
}
