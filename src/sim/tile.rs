//! Tile entities: the platforms the frog hops between
//!
//! A tile's world position is composed every update from its anchor (drift
//! and wrap translations), a sink shake, and three vertical offsets (idle bob,
//! landing bob, sink). Landing tests use the anchor so cosmetic motion never
//! changes an outcome.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::insect::Insect;
use crate::consts::*;
use crate::lerp_f32;
use crate::tuning::{CurveTuning, InsectTuning, TileSettings};

/// Tile kinds, in distribution-table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Circular, static
    LilyPad,
    /// Rectangular, drifts sideways and wraps off-screen
    DriftingLog,
    /// Rectangular, static, bobs in place
    FloatingBox,
}

impl TileKind {
    pub const COUNT: usize = 3;
    pub const ALL: [TileKind; Self::COUNT] =
        [TileKind::LilyPad, TileKind::DriftingLog, TileKind::FloatingBox];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Circular hitbox (otherwise an axis-aligned rectangle)
    #[inline]
    pub fn is_circular(self) -> bool {
        self == TileKind::LilyPad
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkState {
    Floating,
    Sinking,
    /// Sink animation finished
    Sunk,
}

/// Notable things a tile update reports to the game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEvent {
    /// The frog was still on board past the lose threshold; it has been detached
    SinkLoss,
}

/// Visible horizontal range at water height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub left: f32,
    pub right: f32,
}

impl ViewBounds {
    pub fn centered(x: f32, half_width: f32) -> Self {
        Self {
            left: x - half_width,
            right: x + half_width,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Everything the spawner decides about a new tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSpawn {
    pub kind: TileKind,
    pub position: Vec3,
    /// Spawn radius before the kind's scale factor
    pub scale: f32,
    /// Independent depth scale (logs only, 1 otherwise)
    pub height_ratio: f32,
    pub velocity: f32,
    /// Seconds from sink start to the lose threshold
    pub sink_time: f32,
    pub map_depth: u32,
    pub base_score_reward: u32,
}

/// One platform
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub kind: TileKind,
    /// Half-extents; y is the surface height above the center
    pub hitbox_extent: Vec3,
    pub base_score_reward: u32,
    pub map_depth: u32,
    pub horizontal_velocity: f32,
    pub frog_attached: bool,
    /// Set once the tile has paid out (or been passed)
    pub did_award_score: bool,
    pub insect: Insect,

    position: Vec3,
    anchor: Vec3,
    move_delta: Vec3,
    shake_offset: Vec3,

    sink_state: SinkState,
    sink_timer: f32,
    sink_duration: f32,
    sink_lose_time: f32,
    sink_offset_y: f32,

    velocity_dampen: f32,
    idle_phase: f32,
    idle_bob_y: f32,
    land_bob_timer: Option<f32>,
    land_bob_offset_y: f32,
    age: f32,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            kind: TileKind::LilyPad,
            hitbox_extent: Vec3::ZERO,
            base_score_reward: 0,
            map_depth: 0,
            horizontal_velocity: 0.0,
            frog_attached: false,
            did_award_score: false,
            insect: Insect::default(),
            position: Vec3::ZERO,
            anchor: Vec3::ZERO,
            move_delta: Vec3::ZERO,
            shake_offset: Vec3::ZERO,
            sink_state: SinkState::Floating,
            sink_timer: 0.0,
            sink_duration: 1.0,
            sink_lose_time: 1.0,
            sink_offset_y: 0.0,
            velocity_dampen: 1.0,
            idle_phase: 0.0,
            idle_bob_y: 0.0,
            land_bob_timer: None,
            land_bob_offset_y: 0.0,
            age: 0.0,
        }
    }
}

impl Tile {
    /// Tile at a fixed spot with an explicit hitbox and no insect
    pub fn with_hitbox(kind: TileKind, position: Vec3, hitbox_extent: Vec3) -> Self {
        Self {
            kind,
            hitbox_extent,
            position,
            anchor: position,
            ..Self::default()
        }
    }

    /// Reinitialize a pooled tile for placement
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        spawn: &TileSpawn,
        settings: &TileSettings,
        curves: &CurveTuning,
        insects: &InsectTuning,
        leap_streak: u32,
        rng: &mut R,
    ) {
        let min = settings.min_dimensions;
        let scaled = spawn.scale * settings.scale_factor;
        let hb_x = min.x.max(scaled);
        let mut hb_y = min.y.max(settings.constant_hitbox_height);
        let hb_z = min
            .z
            .max(scaled * spawn.height_ratio * settings.hitbox_depth_ratio);
        if settings.hitbox_height_scaling > 0.0 {
            hb_y += hb_z * settings.hitbox_height_scaling;
        }

        self.kind = spawn.kind;
        self.hitbox_extent = Vec3::new(hb_x, hb_y, hb_z);
        self.map_depth = spawn.map_depth;
        self.base_score_reward = spawn.base_score_reward;
        self.horizontal_velocity = spawn.velocity;

        self.anchor = spawn.position;
        self.position = spawn.position;
        self.move_delta = Vec3::ZERO;
        self.shake_offset = Vec3::ZERO;

        self.sink_state = SinkState::Floating;
        self.sink_timer = 0.0;
        self.sink_lose_time = curves.sink_lose_time();
        // Stretch the whole animation so the lose threshold lands at sink_time
        self.sink_duration = spawn.sink_time / self.sink_lose_time;
        self.sink_offset_y = 0.0;

        self.frog_attached = false;
        self.did_award_score = false;
        self.velocity_dampen = 1.0;
        self.idle_phase = std::f32::consts::TAU * rng.random::<f32>();
        self.idle_bob_y = 0.0;
        self.land_bob_timer = None;
        self.land_bob_offset_y = 0.0;
        self.age = 0.0;

        self.insect
            .respawn(rng, self.kind, self.hitbox_extent, leap_streak, insects);
    }

    /// Composed world position
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Drift/wrap position without cosmetic offsets
    #[inline]
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Movement over the last update, excluding wrap translations
    #[inline]
    pub fn move_delta(&self) -> Vec3 {
        self.move_delta
    }

    /// Landing surface height; always derived from the current position
    #[inline]
    pub fn top_surface_y(&self) -> f32 {
        self.position.y + self.hitbox_extent.y
    }

    /// Horizontal footprint radius (circular hitboxes use this)
    #[inline]
    pub fn radius(&self) -> f32 {
        self.hitbox_extent.x.max(self.hitbox_extent.z)
    }

    pub fn sink_state(&self) -> SinkState {
        self.sink_state
    }

    /// Normalized sink progress, 0..=1
    pub fn sink_timer(&self) -> f32 {
        self.sink_timer
    }

    pub fn sink_lose_time(&self) -> f32 {
        self.sink_lose_time
    }

    /// Seconds left before an attached frog loses
    pub fn time_until_sink(&self) -> f32 {
        (self.sink_lose_time - self.sink_timer) * self.sink_duration
    }

    /// Translation that moves a wrapping tile from one screen edge to the other
    pub fn horizontal_reset_distance(&self, view_width: f32) -> f32 {
        view_width + (self.hitbox_extent.x + HORIZONTAL_SCREEN_BUFFER) * 2.0 - WRAP_EPSILON
    }

    /// Advance one frame
    pub fn update(
        &mut self,
        settings: &TileSettings,
        curves: &CurveTuning,
        view: ViewBounds,
        dt: f32,
    ) -> Option<TileEvent> {
        let mut event = None;
        self.age += dt;

        // Drift; the frog's weight drags the tile down to (1 - factor) speed
        if self.horizontal_velocity != 0.0 && !settings.ensure_static {
            let f = settings.velocity_dampen_factor;
            self.velocity_dampen = if self.frog_attached {
                (self.velocity_dampen - dt * f).max(1.0 - f)
            } else {
                (self.velocity_dampen + dt * f).min(1.0)
            };
            self.anchor.x += self.horizontal_velocity * self.velocity_dampen * dt;
        }

        if self.sink_state == SinkState::Sinking {
            let raw = self.sink_timer + dt / self.sink_duration;
            self.sink_timer = raw.min(1.0);
            if raw >= 1.0 {
                self.sink_state = SinkState::Sunk;
            }
            self.sink_offset_y =
                curves.sink.evaluate(self.sink_timer) * self.hitbox_extent.y * self.sink_lose_time;

            if self.sink_timer > self.sink_lose_time * 0.75 {
                let t = self.age * SINK_SHAKE_SPEED;
                self.shake_offset = Vec3::new(
                    t.sin() * 0.5 * SINK_SHAKE_INTENSITY,
                    0.0,
                    (t * 1.3 + 1.7).cos() * 0.5 * SINK_SHAKE_INTENSITY,
                );
            }

            if self.frog_attached && raw > self.sink_lose_time {
                log::debug!("Tile {} sank with the frog on it", self.map_depth);
                self.frog_attached = false;
                event = Some(TileEvent::SinkLoss);
            }
        }

        if settings.repeat_horizontally_offscreen {
            let margin = self.hitbox_extent.x + HORIZONTAL_SCREEN_BUFFER;
            let reset = self.horizontal_reset_distance(view.width());
            if self.anchor.x < view.left - margin {
                self.shift_x(reset);
            } else if self.anchor.x > view.right + margin {
                self.shift_x(-reset);
            }
        }

        if settings.idle_bob_amount > 0.0 && settings.idle_bob_speed > 0.0 {
            use std::f32::consts::{PI, TAU};
            if self.frog_attached {
                // Ease to rest at the nearest trough
                let rest = if self.idle_phase > PI { TAU } else { 0.0 };
                self.idle_phase = lerp_f32(self.idle_phase, rest, dt * IDLE_BOB_SETTLE_RATE);
            } else {
                self.idle_phase += dt * settings.idle_bob_speed;
                if self.idle_phase >= TAU {
                    self.idle_phase -= TAU;
                }
            }
            self.idle_bob_y = (self.idle_phase.sin() - 1.0) * settings.idle_bob_amount;
        }

        if let Some(timer) = self.land_bob_timer {
            let timer = timer + dt / LAND_BOB_TIME;
            if timer >= 1.0 {
                self.land_bob_timer = None;
                self.land_bob_offset_y = 0.0;
            } else {
                self.land_bob_timer = Some(timer);
                self.land_bob_offset_y = curves.land_bob.evaluate(timer) * settings.land_bob_strength;
            }
        }

        self.insect.update(dt);
        self.compose_position();
        event
    }

    fn compose_position(&mut self) {
        let previous = self.position;
        let lift = self.idle_bob_y + self.land_bob_offset_y + self.sink_offset_y;
        self.position = self.anchor + self.shake_offset + Vec3::new(0.0, lift, 0.0);
        self.move_delta = self.position - previous;
    }

    /// Pure translation; applied to the previous position too so it never
    /// shows up as movement
    pub fn shift_x(&mut self, amount: f32) {
        self.anchor.x += amount;
        self.position.x += amount;
    }

    /// Returns false if the frog was already attached
    pub fn on_frog_attached(&mut self) -> bool {
        if self.frog_attached {
            return false;
        }
        self.frog_attached = true;
        true
    }

    /// Returns true when the frog jumped off moments before the lose threshold
    pub fn on_frog_detached(&mut self, from_jump: bool) -> bool {
        if !self.frog_attached {
            return false;
        }
        self.frog_attached = false;
        from_jump
            && self.sink_state == SinkState::Sinking
            && self.time_until_sink() <= QUICK_FEET_WINDOW
    }

    /// Begin (or resume) the sink countdown; non-sinkable kinds ignore this
    pub fn start_sinking(&mut self, settings: &TileSettings) {
        if settings.sinkable && self.sink_state != SinkState::Sinking {
            self.sink_state = SinkState::Sinking;
        }
    }

    /// Restart the landing bob
    pub fn play_bob(&mut self, settings: &TileSettings) {
        if settings.land_bob_strength > 0.0 {
            self.land_bob_timer = Some(0.0);
        } else {
            self.land_bob_timer = None;
            self.land_bob_offset_y = 0.0;
        }
    }

    pub fn clear_insect(&mut self, eaten: bool) {
        self.insect.clear(eaten);
    }
}
