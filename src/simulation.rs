//! The simulation context: every live firework plus the scheduler, timers and
//! collaborators that act on them. One `tick` per frame advances everything.

use thiserror::Error;

use crate::canvas::Canvas;
use crate::color::Rgb;
use crate::firework::{Firework, FireworkId};
use crate::patterns::PatternType;
use crate::show::{Launch, Selection, ShowMode, ShowScheduler};
use crate::sound::{self, Cue, SoundCue};
use crate::timers::TimerQueue;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// A launch asked for from outside the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaunchRequest {
    pub target_x: f32,
    pub target_y: f32,
    pub pattern: PatternType,
    pub color: Rgb,
    pub size: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum LaunchError {
    #[error("launch target ({0}, {1}) is not a finite point")]
    NonFiniteTarget(f32, f32),
    #[error("size multiplier {0} must be a positive number")]
    InvalidSize(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    CrossetteSplit(FireworkId),
}

pub struct Simulation {
    viewport: Viewport,
    fireworks: Vec<Firework>,
    scheduler: ShowScheduler,
    timers: TimerQueue<Deferred>,
    selection: Selection,
    sound: Box<dyn SoundCue>,
    rng: fastrand::Rng,
    fade: f32,
    next_id: u64,
}

impl Simulation {
    pub fn new(viewport: Viewport, mode: ShowMode, sound: Box<dyn SoundCue>, rng: fastrand::Rng) -> Self {
        Self {
            viewport,
            fireworks: Vec::new(),
            scheduler: ShowScheduler::new(mode),
            timers: TimerQueue::new(),
            selection: Selection::default(),
            sound,
            rng,
            fade: 0.05,
            next_id: 0,
        }
    }

    pub fn with_fade(mut self, fade: f32) -> Self {
        self.fade = fade;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn mode(&self) -> ShowMode {
        self.scheduler.mode()
    }

    pub fn set_mode(&mut self, mode: ShowMode) {
        if mode != self.scheduler.mode() {
            log::info!("show mode: {}", mode);
        }
        self.scheduler.set_mode(mode);
    }

    pub fn scheduler(&self) -> &ShowScheduler {
        &self.scheduler
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advances the whole display by one frame at wall-clock `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        let launches = self.scheduler.tick(
            now_ms,
            self.fireworks.len(),
            self.viewport,
            self.selection,
            &mut self.rng,
        );
        for launch in launches {
            self.spawn(launch);
        }

        while let Some(event) = self.timers.pop_due(now_ms) {
            self.fire(event);
        }

        for firework in &mut self.fireworks {
            if let Some(detonation) = firework.update(&mut self.rng) {
                log::debug!(
                    "firework {:?} burst as {:?} with {} particles (rocket at y={:.1})",
                    firework.id(),
                    detonation.pattern,
                    detonation.particle_count,
                    detonation.rocket_y
                );
                if let Some(delay) = detonation.split_after_ms {
                    self.timers
                        .schedule_once(now_ms, delay, Deferred::CrossetteSplit(firework.id()));
                }
                sound::play_cue(self.sound.as_mut(), Cue::Explosion);
            }
        }

        self.fireworks.retain(Firework::is_alive);
    }

    fn fire(&mut self, event: Deferred) {
        match event {
            Deferred::CrossetteSplit(id) => {
                let Some(firework) = self.fireworks.iter_mut().find(|f| f.id() == id) else {
                    log::debug!("crossette split for {:?} skipped, firework gone", id);
                    return;
                };
                let spawned = firework.split_crossette_parents(&mut self.rng);
                log::debug!("firework {:?} crossette split spawned {} particles", id, spawned);
            }
        }
    }

    /// Draws one frame: the fading veil, then every live firework.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.clear_with_fade(self.fade);
        for firework in &self.fireworks {
            firework.draw(canvas);
        }
    }

    /// Validates and launches an externally requested firework. Targets
    /// outside the viewport are pulled back onto its edge.
    pub fn request_launch(&mut self, request: LaunchRequest) -> Result<FireworkId, LaunchError> {
        if !(request.target_x.is_finite() && request.target_y.is_finite()) {
            return Err(LaunchError::NonFiniteTarget(request.target_x, request.target_y));
        }
        if !(request.size.is_finite() && request.size > 0.0) {
            return Err(LaunchError::InvalidSize(request.size));
        }

        let target_x = request.target_x.clamp(0.0, self.viewport.width);
        let target_y = request.target_y.clamp(0.0, self.viewport.height);
        let origin_x = target_x + self.rng.f32() * 100.0 - 50.0;

        Ok(self.spawn(Launch {
            origin_x,
            target_x,
            target_y,
            pattern: request.pattern,
            color: request.color,
            size: request.size,
        }))
    }

    /// The launch button: a random spot in the upper sky with the current selection.
    pub fn launch_random(&mut self) -> FireworkId {
        let target_x = self.rng.f32() * self.viewport.width;
        let target_y = (0.2 + self.rng.f32() * 0.3) * self.viewport.height;
        let color = self.selection.color.resolve(&mut self.rng);
        let size = 0.8 + self.rng.f32() * 0.4;
        let origin_x = target_x + self.rng.f32() * 100.0 - 50.0;

        self.spawn(Launch {
            origin_x,
            target_x,
            target_y,
            pattern: self.selection.pattern,
            color,
            size,
        })
    }

    /// Launches at a point with the current selection, as a click does.
    pub fn launch_at(&mut self, x: f32, y: f32) -> Result<FireworkId, LaunchError> {
        let color = self.selection.color.resolve(&mut self.rng);
        self.request_launch(LaunchRequest {
            target_x: x,
            target_y: y,
            pattern: self.selection.pattern,
            color,
            size: 1.0,
        })
    }

    fn spawn(&mut self, launch: Launch) -> FireworkId {
        let id = FireworkId(self.next_id);
        self.next_id += 1;

        log::debug!(
            "launch {:?}: {} toward ({:.0}, {:.0}) size {:.2}",
            id,
            launch.pattern,
            launch.target_x,
            launch.target_y,
            launch.size
        );

        self.fireworks.push(Firework::new(
            id,
            (launch.origin_x, self.viewport.height),
            (launch.target_x, launch.target_y),
            launch.color,
            launch.pattern,
            launch.size,
            &mut self.rng,
        ));
        sound::play_cue(self.sound.as_mut(), Cue::Launch);
        id
    }
}
