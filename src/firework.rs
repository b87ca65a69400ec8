use crate::canvas::Canvas;
use crate::color::Rgb;
use crate::patterns::{self, Burst, Pattern, PatternType};
use crate::particle::{Particle, Physics};

// Rocket bursts once it is this close to its target altitude
const ARRIVAL_DISTANCE: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FireworkId(pub u64);

pub enum Stage {
    Ascending { rocket: Particle },
    Exploded { particles: Vec<Particle> },
}

/// Returned from the tick in which the rocket bursts.
pub struct Detonation {
    pub pattern: Pattern,
    pub particle_count: usize,
    pub split_after_ms: Option<u64>,
    /// Rocket altitude and vertical velocity on the bursting tick.
    pub rocket_y: f32,
    pub rocket_vy: f32,
}

pub struct Firework {
    id: FireworkId,
    launch_x: f32,
    launch_y: f32,
    target_x: f32,
    target_y: f32,
    color: Rgb,
    pattern: PatternType,
    size: f32,
    stage: Stage,
}

impl Firework {
    pub fn new(
        id: FireworkId,
        (launch_x, launch_y): (f32, f32),
        (target_x, target_y): (f32, f32),
        color: Rgb,
        pattern: PatternType,
        size: f32,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let dx = target_x - launch_x;
        let dy = target_y - launch_y;
        let angle = dy.atan2(dx);
        let distance = (dx * dx + dy * dy).sqrt();

        let speed = 8.0 + rng.f32() * 4.0;
        let vx = angle.cos() * speed;
        // Climb rate depends on distance alone so every arc looks alike
        let vy = -distance.sqrt() * 0.4 - 2.0;

        let physics = Physics {
            gravity: 0.1,
            friction: 0.98,
            fade_rate: 0.01,
        };
        let rocket = Particle::new(launch_x, launch_y, vx, vy, color, physics, 2.0 * size).with_trail();

        Self {
            id,
            launch_x,
            launch_y,
            target_x,
            target_y,
            color,
            pattern,
            size,
            stage: Stage::Ascending { rocket },
        }
    }

    pub fn id(&self) -> FireworkId {
        self.id
    }

    pub fn launch(&self) -> (f32, f32) {
        (self.launch_x, self.launch_y)
    }

    pub fn target(&self) -> (f32, f32) {
        (self.target_x, self.target_y)
    }

    pub fn pattern(&self) -> PatternType {
        self.pattern
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn exploded(&self) -> bool {
        matches!(self.stage, Stage::Exploded { .. })
    }

    pub fn rocket(&self) -> Option<&Particle> {
        match &self.stage {
            Stage::Ascending { rocket } => Some(rocket),
            Stage::Exploded { .. } => None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        match &self.stage {
            Stage::Ascending { .. } => &[],
            Stage::Exploded { particles } => particles,
        }
    }

    pub fn update(&mut self, rng: &mut fastrand::Rng) -> Option<Detonation> {
        match &mut self.stage {
            Stage::Ascending { rocket } => {
                rocket.update(rng);
                let at_apex = rocket.vy >= 0.0;
                let arrived = (rocket.y - self.target_y).abs() < ARRIVAL_DISTANCE;
                if at_apex || arrived {
                    let (rocket_y, rocket_vy) = (rocket.y, rocket.vy);
                    return Some(self.explode(rocket_y, rocket_vy, rng));
                }
                None
            }
            Stage::Exploded { particles } => {
                particles.retain_mut(|p| {
                    p.update(rng);
                    p.is_alive()
                });
                None
            }
        }
    }

    // Bursts at the target rather than wherever the rocket actually is
    fn explode(&mut self, rocket_y: f32, rocket_vy: f32, rng: &mut fastrand::Rng) -> Detonation {
        let count = ((50.0 + rng.f32() * 50.0) * self.size) as usize;
        let burst = Burst {
            count,
            x: self.target_x,
            y: self.target_y,
            color: self.color,
            size: self.size,
        };
        let explosion = self.pattern.resolve(rng).explode(&burst, rng);
        let particle_count = explosion.particles.len();

        self.stage = Stage::Exploded {
            particles: explosion.particles,
        };

        Detonation {
            pattern: explosion.pattern,
            particle_count,
            split_after_ms: explosion.split_after_ms,
            rocket_y,
            rocket_vy,
        }
    }

    /// Splits every crossette parent still brighter than half opacity into
    /// five children. Returns how many children were spawned.
    pub fn split_crossette_parents(&mut self, rng: &mut fastrand::Rng) -> usize {
        let Stage::Exploded { particles } = &mut self.stage else {
            return 0;
        };

        let mut children = Vec::new();
        for parent in particles.iter_mut().filter(|p| p.is_crossette_parent()) {
            if parent.alpha > 0.5 {
                children.extend(patterns::crossette_children(parent, self.size, rng));
                parent.burn_out();
            } else {
                parent.release_split();
            }
        }

        let spawned = children.len();
        particles.append(&mut children);
        spawned
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        match &self.stage {
            Stage::Ascending { rocket } => rocket.draw(canvas),
            Stage::Exploded { particles } => {
                for particle in particles {
                    particle.draw(canvas);
                }
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        match &self.stage {
            Stage::Ascending { .. } => true,
            Stage::Exploded { particles } => !particles.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::tests::RecordingCanvas;

    fn launch(pattern: PatternType, seed: u64) -> (Firework, fastrand::Rng) {
        let mut rng = fastrand::Rng::with_seed(seed);
        let fw = Firework::new(
            FireworkId(1),
            (500.0, 800.0),
            (500.0, 500.0),
            Rgb::new(255, 50, 50),
            pattern,
            1.0,
            &mut rng,
        );
        (fw, rng)
    }

    fn ascend(fw: &mut Firework, rng: &mut fastrand::Rng) -> Detonation {
        for _ in 0..1000 {
            if let Some(detonation) = fw.update(rng) {
                return detonation;
            }
            assert!(!fw.exploded());
        }
        panic!("rocket never burst");
    }

    #[test]
    fn test_rocket_setup() {
        let (fw, _) = launch(PatternType::Circle, 1);
        let rocket = fw.rocket().unwrap();
        assert!((rocket.vy - (-(300.0f32).sqrt() * 0.4 - 2.0)).abs() < 1e-5);
        assert!(rocket.vx.abs() < 1e-3);
        assert_eq!(rocket.size(), 2.0);
        assert!(rocket.has_trail());
        assert_eq!((rocket.gravity(), rocket.friction(), rocket.fade_rate()), (0.1, 0.98, 0.01));
        assert!(fw.is_alive());
        assert!(fw.particles().is_empty());
    }

    #[test]
    fn test_rocket_size_follows_multiplier() {
        let mut rng = fastrand::Rng::with_seed(1);
        let fw = Firework::new(
            FireworkId(2),
            (0.0, 800.0),
            (100.0, 300.0),
            Rgb::new(0, 0, 0),
            PatternType::Ring,
            1.5,
            &mut rng,
        );
        assert_eq!(fw.rocket().unwrap().size(), 3.0);
    }

    #[test]
    fn test_bursts_at_apex_or_target_altitude() {
        let (mut fw, mut rng) = launch(PatternType::Circle, 7);
        let detonation = ascend(&mut fw, &mut rng);

        assert!(detonation.rocket_vy >= 0.0 || (detonation.rocket_y - 500.0).abs() < 20.0);
        assert_eq!(detonation.pattern, Pattern::Circle);
        assert!((50..100).contains(&detonation.particle_count));
        assert!(detonation.split_after_ms.is_none());

        assert!(fw.exploded());
        assert!(fw.rocket().is_none());
        assert_eq!(fw.particles().len(), detonation.particle_count);
        assert!(fw.particles().iter().all(|p| (p.x, p.y) == (500.0, 500.0)));
    }

    #[test]
    fn test_exploded_only_touches_particles() {
        let (mut fw, mut rng) = launch(PatternType::Circle, 3);
        ascend(&mut fw, &mut rng);

        fw.update(&mut rng);
        let mut canvas = RecordingCanvas::default();
        fw.draw(&mut canvas);

        // Circle particles carry no trail, so one circle each and nothing else
        assert_eq!(canvas.circles.len(), fw.particles().len());
        for ((x, y, _, _, _), p) in canvas.circles.iter().zip(fw.particles()) {
            assert_eq!((*x, *y), (p.x, p.y));
        }
    }

    #[test]
    fn test_dies_once_particles_fade() {
        let (mut fw, mut rng) = launch(PatternType::Willow, 5);
        ascend(&mut fw, &mut rng);
        assert!(fw.is_alive());

        // Slowest willow fade is 0.003 per tick
        for _ in 0..400 {
            fw.update(&mut rng);
        }
        assert!(fw.particles().is_empty());
        assert!(!fw.is_alive());
    }

    #[test]
    fn test_random_pattern_resolves_on_burst() {
        let (mut fw, mut rng) = launch(PatternType::Random, 11);
        let detonation = ascend(&mut fw, &mut rng);
        assert!(Pattern::ALL.contains(&detonation.pattern));
        assert_eq!(fw.pattern(), PatternType::Random);
    }

    #[test]
    fn test_split_spawns_five_per_bright_parent() {
        let (mut fw, mut rng) = launch(PatternType::Crossette, 13);
        let detonation = ascend(&mut fw, &mut rng);
        assert!(detonation.split_after_ms.is_some());

        for _ in 0..20 {
            fw.update(&mut rng);
        }
        let parents: Vec<(f32, f32, Rgb)> = fw
            .particles()
            .iter()
            .filter(|p| p.is_crossette_parent())
            .map(|p| (p.x, p.y, p.color))
            .collect();
        assert!(!parents.is_empty());
        let before = fw.particles().len();

        let spawned = fw.split_crossette_parents(&mut rng);
        assert_eq!(spawned, parents.len() * 5);
        assert_eq!(fw.particles().len(), before + spawned);

        let children = &fw.particles()[before..];
        for (chunk, (x, y, color)) in children.chunks(5).zip(&parents) {
            assert!(chunk.iter().all(|c| (c.x, c.y) == (*x, *y) && c.color == *color));
        }
        assert!(fw.particles().iter().all(|p| !p.is_crossette_parent()));

        // A second split finds no parents left
        assert_eq!(fw.split_crossette_parents(&mut rng), 0);
    }

    #[test]
    fn test_dim_parents_do_not_split() {
        let (mut fw, mut rng) = launch(PatternType::Crossette, 17);
        ascend(&mut fw, &mut rng);
        if let Stage::Exploded { particles } = &mut fw.stage {
            for p in particles.iter_mut().filter(|p| p.is_crossette_parent()) {
                p.alpha = 0.4;
            }
        }
        assert_eq!(fw.split_crossette_parents(&mut rng), 0);
    }

    #[test]
    fn test_split_before_burst_is_noop() {
        let (mut fw, mut rng) = launch(PatternType::Crossette, 19);
        assert_eq!(fw.split_crossette_parents(&mut rng), 0);
        assert!(!fw.exploded());
    }
}
