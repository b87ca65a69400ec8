use std::collections::VecDeque;

use crate::canvas::Canvas;
use crate::color::Rgb;

pub const MAX_TRAIL_LENGTH: usize = 15;

// Amplitude of the per-tick horizontal wind wobble
const WIND: f32 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
}

/// Per-particle motion constants, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Physics {
    pub gravity: f32,
    pub friction: f32,
    pub fade_rate: f32,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub alpha: f32,
    pub color: Rgb,
    gravity: f32,
    friction: f32,
    fade_rate: f32,
    size: f32,
    // None when the particle leaves no trail; newest point first
    trail: Option<VecDeque<TrailPoint>>,
    crossette_parent: bool,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, color: Rgb, physics: Physics, size: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            alpha: 1.0,
            color,
            gravity: physics.gravity,
            friction: physics.friction,
            fade_rate: physics.fade_rate,
            size,
            trail: None,
            crossette_parent: false,
        }
    }

    pub fn with_trail(mut self) -> Self {
        self.trail = Some(VecDeque::with_capacity(MAX_TRAIL_LENGTH + 1));
        self
    }

    pub(crate) fn as_crossette_parent(mut self) -> Self {
        self.crossette_parent = true;
        self
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn fade_rate(&self) -> f32 {
        self.fade_rate
    }

    pub fn has_trail(&self) -> bool {
        self.trail.is_some()
    }

    pub fn trail(&self) -> impl Iterator<Item = &TrailPoint> {
        self.trail.iter().flatten()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.as_ref().map_or(0, VecDeque::len)
    }

    pub fn is_crossette_parent(&self) -> bool {
        self.crossette_parent
    }

    /// Marks a crossette parent as split so it burns out within a few ticks.
    pub(crate) fn burn_out(&mut self) {
        self.crossette_parent = false;
        self.fade_rate = 0.1;
    }

    pub(crate) fn release_split(&mut self) {
        self.crossette_parent = false;
    }

    pub fn update(&mut self, rng: &mut fastrand::Rng) {
        if let Some(trail) = &mut self.trail {
            trail.push_front(TrailPoint {
                x: self.x,
                y: self.y,
                alpha: self.alpha,
            });
            trail.truncate(MAX_TRAIL_LENGTH);
        }

        self.vx *= self.friction;
        self.vy *= self.friction;
        self.vy += self.gravity;
        self.vx += (rng.f32() - 0.5) * WIND;

        self.x += self.vx;
        self.y += self.vy;
        self.alpha -= self.fade_rate;
    }

    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.draw_circle(self.x, self.y, self.size, self.color, self.alpha);

        if let Some(trail) = &self.trail {
            let len = trail.len() as f32;
            for (i, point) in trail.iter().enumerate() {
                let alpha = point.alpha * 0.5 * (1.0 - i as f32 / len);
                canvas.draw_circle(point.x, point.y, self.size * 0.8, self.color, alpha);
            }
        }
    }
}
