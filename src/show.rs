//! Autonomous launch scheduling.
//!
//! In festival mode the scheduler plays pre-generated shows: five area
//! launches spread across the sky followed by a three-shell finale. In random
//! mode it falls back to occasional single launches.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::color::{self, ColorChoice, PALETTE, Rgb};
use crate::config::ConfigError;
use crate::patterns::PatternType;
use crate::simulation::Viewport;

/// Screen regions for the area launches, in normalized coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Area {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

pub const AREAS: [Area; 5] = [
    Area { x_min: 0.1, x_max: 0.3, y_min: 0.1, y_max: 0.3 },
    Area { x_min: 0.7, x_max: 0.9, y_min: 0.1, y_max: 0.3 },
    Area { x_min: 0.4, x_max: 0.6, y_min: 0.1, y_max: 0.2 },
    Area { x_min: 0.2, x_max: 0.4, y_min: 0.2, y_max: 0.4 },
    Area { x_min: 0.6, x_max: 0.8, y_min: 0.2, y_max: 0.4 },
];

const FINALE_SHELLS: usize = 3;
const FINALE_GAP_MS: f64 = 3000.0;
const FINALE_PATTERNS: [PatternType; 3] = [
    PatternType::Circle,
    PatternType::Chrysanthemum,
    PatternType::Willow,
];

const SHOW_PATTERNS: [PatternType; 5] = [
    PatternType::Circle,
    PatternType::Chrysanthemum,
    PatternType::Willow,
    PatternType::Crossette,
    PatternType::Ring,
];

const RANDOM_INTERVAL_MS: u64 = 3000;
const RANDOM_MAX_LIVE: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowMode {
    /// Timed shows generated batch after batch.
    #[default]
    Festival,
    /// A single random launch now and then.
    Random,
    /// Nothing launches unless requested.
    Manual,
}

impl ShowMode {
    pub const ALL: [ShowMode; 3] = [ShowMode::Festival, ShowMode::Random, ShowMode::Manual];

    pub fn next(self) -> Self {
        match self {
            ShowMode::Festival => ShowMode::Random,
            ShowMode::Random => ShowMode::Manual,
            ShowMode::Manual => ShowMode::Festival,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShowMode::Festival => "festival",
            ShowMode::Random => "random",
            ShowMode::Manual => "manual",
        }
    }
}

impl fmt::Display for ShowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShowMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

/// The pattern and color currently picked by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub pattern: PatternType,
    pub color: ColorChoice,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaunchPatternEntry {
    pub x: f32,
    pub y: f32,
    pub pattern: PatternType,
    pub color_index: usize,
    /// Milliseconds after the show started.
    pub timing_ms: f64,
    pub size: f32,
}

/// A firework the scheduler wants in the sky now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Launch {
    pub origin_x: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub pattern: PatternType,
    pub color: Rgb,
    pub size: f32,
}

pub struct ShowScheduler {
    mode: ShowMode,
    batch: Vec<LaunchPatternEntry>,
    cursor: usize,
    batch_started_ms: u64,
    /// `None` until the first random launch, which fires straight away.
    last_random_ms: Option<u64>,
}

fn uniform(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

/// Generates one show, sorted by timing.
pub fn generate_show(viewport: Viewport, rng: &mut fastrand::Rng) -> Vec<LaunchPatternEntry> {
    let mut batch = Vec::with_capacity(AREAS.len() + FINALE_SHELLS);

    let mut timing_ms = 0.0f64;
    for (i, area) in AREAS.iter().enumerate() {
        if i > 0 {
            timing_ms += 500.0 + rng.f64() * 1000.0;
        }
        batch.push(LaunchPatternEntry {
            x: uniform(rng, area.x_min, area.x_max) * viewport.width,
            y: uniform(rng, area.y_min, area.y_max) * viewport.height,
            pattern: SHOW_PATTERNS[rng.usize(0..SHOW_PATTERNS.len())],
            color_index: color::random_palette_index(rng),
            timing_ms,
            size: uniform(rng, 0.8, 1.2),
        });
    }

    let finale_ms = timing_ms + FINALE_GAP_MS;
    for _ in 0..FINALE_SHELLS {
        batch.push(LaunchPatternEntry {
            x: uniform(rng, 0.1, 0.9) * viewport.width,
            y: uniform(rng, 0.1, 0.4) * viewport.height,
            pattern: FINALE_PATTERNS[rng.usize(0..FINALE_PATTERNS.len())],
            color_index: color::random_palette_index(rng),
            timing_ms: finale_ms + (rng.f64() * 2.0 - 1.0) * 1000.0,
            size: uniform(rng, 0.9, 1.2),
        });
    }

    // Finale jitter leaves those entries unordered among themselves
    batch.sort_by(|a, b| a.timing_ms.total_cmp(&b.timing_ms));
    batch
}

impl ShowScheduler {
    pub fn new(mode: ShowMode) -> Self {
        Self {
            mode,
            batch: Vec::new(),
            cursor: 0,
            batch_started_ms: 0,
            last_random_ms: None,
        }
    }

    pub fn mode(&self) -> ShowMode {
        self.mode
    }

    /// Switching into festival mode drops any half-played show, so the next
    /// tick starts a fresh one instead of firing its stale entries at once.
    pub fn set_mode(&mut self, mode: ShowMode) {
        if mode == ShowMode::Festival && self.mode != ShowMode::Festival {
            self.cursor = self.batch.len();
        }
        self.mode = mode;
    }

    pub fn batch(&self) -> &[LaunchPatternEntry] {
        &self.batch
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns every launch that has come due by `now_ms`. Overdue show
    /// entries all fire in the same tick rather than being skipped.
    pub fn tick(
        &mut self,
        now_ms: u64,
        live: usize,
        viewport: Viewport,
        selection: Selection,
        rng: &mut fastrand::Rng,
    ) -> Vec<Launch> {
        match self.mode {
            ShowMode::Festival => self.tick_festival(now_ms, viewport, rng),
            ShowMode::Random => self.tick_random(now_ms, live, viewport, selection, rng),
            ShowMode::Manual => Vec::new(),
        }
    }

    fn tick_festival(&mut self, now_ms: u64, viewport: Viewport, rng: &mut fastrand::Rng) -> Vec<Launch> {
        if self.cursor >= self.batch.len() {
            self.batch = generate_show(viewport, rng);
            self.cursor = 0;
            self.batch_started_ms = now_ms;
            log::info!(
                "new show: {} launches over {:.1}s",
                self.batch.len(),
                self.batch.last().map_or(0.0, |e| e.timing_ms) / 1000.0
            );
        }

        let elapsed = now_ms.saturating_sub(self.batch_started_ms) as f64;
        let mut launches = Vec::new();
        while let Some(entry) = self.batch.get(self.cursor) {
            if elapsed < entry.timing_ms {
                break;
            }
            launches.push(Launch {
                origin_x: entry.x + uniform(rng, -50.0, 50.0),
                target_x: entry.x,
                target_y: entry.y,
                pattern: entry.pattern,
                color: PALETTE[entry.color_index],
                size: entry.size,
            });
            self.cursor += 1;
        }
        launches
    }

    fn tick_random(
        &mut self,
        now_ms: u64,
        live: usize,
        viewport: Viewport,
        selection: Selection,
        rng: &mut fastrand::Rng,
    ) -> Vec<Launch> {
        let waited = self
            .last_random_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > RANDOM_INTERVAL_MS);
        if live >= RANDOM_MAX_LIVE || !waited {
            return Vec::new();
        }
        self.last_random_ms = Some(now_ms);

        vec![Launch {
            origin_x: rng.f32() * viewport.width,
            target_x: rng.f32() * viewport.width,
            target_y: uniform(rng, 0.2, 0.7) * viewport.height,
            pattern: selection.pattern,
            color: selection.color.resolve(rng),
            size: 1.0,
        }]
    }
}
