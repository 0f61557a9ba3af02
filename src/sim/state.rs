//! Game state and session phases
//!
//! `GameState` is the single context object for a session. Every timed
//! sequence (flight, recovery hop, delays, loss reveal) lives in `GamePhase`
//! and is cancelled by replacing the phase.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::curve::Curve;
use super::landing::WrapIndex;
use super::scoring::ScoreKeeper;
use super::spawner::TileSpawner;
use super::tile::{Tile, ViewBounds};
use crate::SessionStats;
use crate::consts::*;
use crate::tuning::Tuning;

/// A frog hop between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub start: Vec3,
    pub end: Vec3,
    /// 0..1
    pub progress: f32,
    /// Seconds for the whole hop
    pub duration: f32,
    /// Horizontal length; longer hops arc higher
    pub distance: f32,
}

impl Hop {
    pub fn new(start: Vec3, end: Vec3, duration: f32, distance: f32) -> Self {
        Self {
            start,
            end,
            progress: 0.0,
            duration,
            distance,
        }
    }

    /// Arc height at the current progress
    pub fn height(&self, jump_curve: &Curve) -> f32 {
        jump_curve.evaluate(self.progress) * (FROG_BASE_JUMP_HEIGHT + self.distance * FROG_JUMP_HEIGHT_MULTIPLIER)
    }

    /// Frog position at the current progress
    pub fn position(&self, jump_curve: &Curve) -> Vec3 {
        self.start.lerp(self.end, self.progress) + Vec3::new(0.0, self.height(jump_curve), 0.0)
    }

    /// Move both endpoints (riding a drifting tile)
    pub fn translate(&mut self, delta: Vec3) {
        self.start += delta;
        self.end += delta;
    }
}

/// End-of-run sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossSequence {
    pub drowned: bool,
    pub elapsed: f32,
    /// Where the frog started going under
    pub drown_from: Option<Vec3>,
    /// Stats have been committed and `on_loss` sent
    pub reported: bool,
}

impl LossSequence {
    pub fn new(drowned: bool) -> Self {
        Self {
            drowned,
            elapsed: 0.0,
            drown_from: None,
            reported: false,
        }
    }

    /// Seconds from the loss until the score screen
    pub fn reveal_time(&self) -> f32 {
        if self.drowned {
            NEXT_JUMP_DELAY + SCORE_SCREEN_DELAY
        } else {
            SCORE_SCREEN_DELAY
        }
    }
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GamePhase {
    /// Waiting for a press
    Idle,
    /// Holding to charge a jump
    Charging { held: f32 },
    /// In the air after a jump
    Airborne(Hop),
    /// Near miss: short pause before the recovery hop
    Settling { timer: f32, wrap: WrapIndex },
    /// Recovery hop onto the safe part of the tile
    Stabilizing(Hop),
    /// Brief pause before control returns and the tile starts sinking
    Recovering { timer: f32 },
    /// Run over
    Lost(LossSequence),
    /// Session abandoned to the menu; nothing runs until reset
    Exited,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub spawner: TileSpawner,
    pub frog: Vec3,
    /// Camera focus on the water plane
    pub camera: Vec3,
    pub camera_target: Vec3,
    pub phase: GamePhase,
    /// Pool slot the frog stands on
    pub attached: Option<usize>,
    pub scoring: ScoreKeeper,
    pub stats: SessionStats,
    pub paused: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) idle_timer: f32,
    pub(crate) left_the_beach: bool,
    /// The asleep event fires once per process, not per session
    pub(crate) asleep_awarded: bool,
}

impl GameState {
    /// New session with the shipped balance
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// New session; `tuning` must already be validated
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let spawner = TileSpawner::new(&tuning);
        let start = tuning.frog.start_position;
        let mut state = Self {
            seed,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            spawner,
            frog: start,
            camera: start,
            camera_target: start,
            phase: GamePhase::Idle,
            attached: None,
            scoring: ScoreKeeper::default(),
            stats: SessionStats::default(),
            paused: false,
            time_ticks: 0,
            idle_timer: 0.0,
            left_the_beach: false,
            asleep_awarded: false,
        };
        state.reset();
        state
    }

    /// Start a fresh session; any in-flight sequence is dropped
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.paused = false;
        self.time_ticks = 0;
        self.idle_timer = 0.0;
        self.left_the_beach = false;
        self.scoring.reset();
        self.stats.reset();

        if let Some(tile) = self.attached.take().and_then(|slot| self.spawner.tile_mut(slot)) {
            tile.on_frog_detached(false);
        }

        let start = self.tuning.frog.start_position;
        self.frog = start;
        self.camera = start;
        self.camera_target = start;
        self.spawner.reset(start, &self.tuning, &mut self.rng);
        log::info!("Session started (seed {})", self.seed);
    }

    /// Abandon the session; `tick` does nothing until `reset`
    pub fn exit_to_menu(&mut self) {
        if let Some(tile) = self.attached.take().and_then(|slot| self.spawner.tile_mut(slot)) {
            tile.on_frog_detached(false);
        }
        self.phase = GamePhase::Exited;
        log::info!("Session abandoned");
    }

    /// Player input is accepted
    pub fn can_jump(&self) -> bool {
        matches!(self.phase, GamePhase::Idle | GamePhase::Charging { .. })
    }

    pub fn is_lost(&self) -> bool {
        matches!(self.phase, GamePhase::Lost(_))
    }

    pub fn view_bounds(&self) -> ViewBounds {
        ViewBounds::centered(self.camera.x, self.tuning.world.view_half_width)
    }

    pub fn view_width(&self) -> f32 {
        self.tuning.world.view_half_width * 2.0
    }

    pub fn attached_tile(&self) -> Option<&Tile> {
        self.attached.and_then(|slot| self.spawner.tile(slot))
    }

    /// Current difficulty tier
    pub fn difficulty_tier(&self) -> u32 {
        self.spawner.difficulty().tier()
    }
}
