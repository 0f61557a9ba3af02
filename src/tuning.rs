//! Data-driven game balance
//!
//! Everything a designer can tweak without touching code. Loaded from JSON
//! (missing fields fall back to the shipped defaults) and validated once at
//! load time; the simulation trusts a validated `Tuning` afterwards.

use std::path::Path;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::curve::Curve;
use crate::sim::tile::TileKind;

/// Tolerance for a distribution row summing to 1.0
pub const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Reasons a tuning file is rejected
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tile distribution table has no rows")]
    EmptyDistribution,
    #[error("tile distribution row {row} sums to {sum}, expected 1.0")]
    DistributionRow { row: usize, sum: f32 },
    #[error("tile distribution row {row} has a negative or non-finite weight")]
    DistributionWeight { row: usize },
    #[error("{name} range is invalid ({min}..{max})")]
    Range { name: &'static str, min: f32, max: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{kind:?} {factor} factor {value} would make tiles easier over time")]
    EasingFactor {
        kind: TileKind,
        factor: &'static str,
        value: f32,
    },
    #[error("{kind:?} velocity dampen factor {value} must be within 0..=1")]
    DampenFactor { kind: TileKind, value: f32 },
    #[error("{0} curve needs at least two keys with increasing times")]
    Curve(&'static str),
    #[error("sink curve lose time {0} must be within (0, 1]")]
    SinkLoseTime(f32),
    #[error("tile pool needs at least one tile")]
    EmptyPool,
    #[error("difficulty interval must be at least 1")]
    ZeroInterval,
}

/// Inclusive random range, sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    pub min: f32,
    pub max: f32,
}

impl Variance {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    fn validate(&self, name: &'static str) -> Result<(), TuningError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 || self.min > self.max
        {
            return Err(TuningError::Range {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Per-interval difficulty factors for one tile kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyFactors {
    /// Tile size shrinks by this (<= 1)
    pub size: f32,
    /// Spacing grows by this (>= 1)
    pub distance: f32,
    /// Drift speed grows by this (>= 1)
    pub velocity: f32,
    /// Sink time shrinks by this (<= 1)
    pub sink_time: f32,
}

impl Default for DifficultyFactors {
    fn default() -> Self {
        Self {
            size: 0.95,
            distance: 1.05,
            velocity: 1.06,
            sink_time: 0.95,
        }
    }
}

/// Per-kind tile physics and hitbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSettings {
    /// Hitbox half-extents never go below this
    pub min_dimensions: Vec3,
    /// Scale multiplier on the spawned radius
    pub scale_factor: f32,
    /// Depth (z) to width (x) ratio; != 1 for non-square tiles
    pub hitbox_depth_ratio: f32,
    /// Base vertical half-extent
    pub constant_hitbox_height: f32,
    /// Extra height per unit of depth; 0 disables
    pub hitbox_height_scaling: f32,
    /// Ignores drift velocity entirely
    pub ensure_static: bool,
    /// How strongly the frog's weight slows drifting
    pub velocity_dampen_factor: f32,
    /// Reappears on the opposite side after leaving the screen
    pub repeat_horizontally_offscreen: bool,
    pub land_bob_strength: f32,
    pub idle_bob_speed: f32,
    pub idle_bob_amount: f32,
    /// Starts sinking once the frog has settled on it
    pub sinkable: bool,
    pub difficulty: DifficultyFactors,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            min_dimensions: Vec3::new(0.25, 0.0, 0.25),
            scale_factor: 1.0,
            hitbox_depth_ratio: 1.0,
            constant_hitbox_height: 0.05,
            hitbox_height_scaling: 0.0,
            ensure_static: true,
            velocity_dampen_factor: 0.5,
            repeat_horizontally_offscreen: false,
            land_bob_strength: 0.06,
            idle_bob_speed: 1.0,
            idle_bob_amount: 0.0,
            sinkable: true,
            difficulty: DifficultyFactors::default(),
        }
    }
}

impl TileSettings {
    pub fn lily_pad() -> Self {
        Self::default()
    }

    pub fn drifting_log() -> Self {
        Self {
            min_dimensions: Vec3::new(0.5, 0.0, 0.18),
            scale_factor: 1.4,
            hitbox_depth_ratio: 0.35,
            hitbox_height_scaling: 0.5,
            ensure_static: false,
            repeat_horizontally_offscreen: true,
            land_bob_strength: 0.04,
            sinkable: false,
            ..Self::default()
        }
    }

    pub fn floating_box() -> Self {
        Self {
            min_dimensions: Vec3::new(0.3, 0.0, 0.3),
            scale_factor: 0.8,
            constant_hitbox_height: 0.15,
            land_bob_strength: 0.08,
            idle_bob_speed: 2.0,
            idle_bob_amount: 0.04,
            ..Self::default()
        }
    }

    fn validate(&self, kind: TileKind) -> Result<(), TuningError> {
        positive("tile scale_factor", self.scale_factor)?;
        positive("tile hitbox_depth_ratio", self.hitbox_depth_ratio)?;
        if !(0.0..=1.0).contains(&self.velocity_dampen_factor) {
            return Err(TuningError::DampenFactor {
                kind,
                value: self.velocity_dampen_factor,
            });
        }
        let f = &self.difficulty;
        let easing = [
            ("size", f.size, f.size > 0.0 && f.size <= 1.0),
            ("distance", f.distance, f.distance >= 1.0),
            ("velocity", f.velocity, f.velocity >= 1.0),
            ("sink_time", f.sink_time, f.sink_time > 0.0 && f.sink_time <= 1.0),
        ];
        for (factor, value, ok) in easing {
            if !ok || !value.is_finite() {
                return Err(TuningError::EasingFactor {
                    kind,
                    factor,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Tile settings for every kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSet {
    pub lily_pad: TileSettings,
    pub drifting_log: TileSettings,
    pub floating_box: TileSettings,
}

impl Default for TileSet {
    fn default() -> Self {
        Self {
            lily_pad: TileSettings::lily_pad(),
            drifting_log: TileSettings::drifting_log(),
            floating_box: TileSettings::floating_box(),
        }
    }
}

impl TileSet {
    pub fn get(&self, kind: TileKind) -> &TileSettings {
        match kind {
            TileKind::LilyPad => &self.lily_pad,
            TileKind::DriftingLog => &self.drifting_log,
            TileKind::FloatingBox => &self.floating_box,
        }
    }
}

/// Tile placement ranges and bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub pool_size: usize,
    /// Max degrees off the forward axis
    pub angle_variance: f32,
    pub base_distance: f32,
    pub max_distance: f32,
    pub distance_variance: Variance,
    pub base_size_radius: f32,
    pub min_size_multiplier: f32,
    pub size_variance: Variance,
    pub base_drift_velocity: f32,
    pub max_drift_velocity: f32,
    pub velocity_variance: Variance,
    pub base_sink_time: f32,
    pub min_sink_time: f32,
    /// Tile kind probabilities per difficulty tier, indexed by `TileKind::index`.
    /// Tiers past the last row reuse it.
    pub distribution: Vec<[f32; TileKind::COUNT]>,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            pool_size: 6,
            angle_variance: 15.0,
            base_distance: 3.0,
            max_distance: 6.0,
            distance_variance: Variance::new(0.7, 1.3),
            base_size_radius: 1.0,
            min_size_multiplier: 0.2,
            size_variance: Variance::new(0.9, 1.1),
            base_drift_velocity: 0.5,
            max_drift_velocity: 2.5,
            velocity_variance: Variance::new(0.9, 1.1),
            base_sink_time: 3.5,
            min_sink_time: 1.0,
            distribution: vec![
                [1.0, 0.0, 0.0],
                [0.7, 0.3, 0.0],
                [0.5, 0.3, 0.2],
                [0.4, 0.3, 0.3],
            ],
        }
    }
}

impl SpawnTuning {
    /// Probability row for a difficulty tier
    pub fn distribution_row(&self, tier: u32) -> Option<&[f32; TileKind::COUNT]> {
        let last = self.distribution.len().checked_sub(1)?;
        self.distribution.get((tier as usize).min(last))
    }

    fn validate(&self) -> Result<(), TuningError> {
        if self.pool_size == 0 {
            return Err(TuningError::EmptyPool);
        }
        positive("base_distance", self.base_distance)?;
        positive("max_distance", self.max_distance)?;
        positive("base_size_radius", self.base_size_radius)?;
        positive("min_size_multiplier", self.min_size_multiplier)?;
        positive("max_drift_velocity", self.max_drift_velocity)?;
        positive("min_sink_time", self.min_sink_time)?;
        positive("base_sink_time", self.base_sink_time)?;
        if !(self.angle_variance.is_finite() && self.angle_variance >= 0.0) {
            return Err(TuningError::Range {
                name: "angle_variance",
                min: -self.angle_variance,
                max: self.angle_variance,
            });
        }
        self.distance_variance.validate("distance_variance")?;
        self.size_variance.validate("size_variance")?;
        self.velocity_variance.validate("velocity_variance")?;

        if self.distribution.is_empty() {
            return Err(TuningError::EmptyDistribution);
        }
        for (row, weights) in self.distribution.iter().enumerate() {
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(TuningError::DistributionWeight { row });
            }
            let sum: f32 = weights.iter().sum();
            if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
                return Err(TuningError::DistributionRow { row, sum });
            }
        }
        Ok(())
    }
}

/// Bonus insect settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsectTuning {
    pub radius: f32,
    pub firefly_radius: f32,
    /// Farthest an insect sits from the tile center, as a fraction of the usable extent
    pub max_offset_ratio: f32,
    pub firefly_chance: f32,
}

impl Default for InsectTuning {
    fn default() -> Self {
        Self {
            radius: 0.1,
            firefly_radius: 0.1,
            max_offset_ratio: 0.9,
            firefly_chance: 0.02,
        }
    }
}

/// Frog and input settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrogTuning {
    pub radius: f32,
    /// Holding longer than this cancels the jump
    pub max_jump_charge_time: f32,
    /// Early landings are only checked past this jump progress
    pub jump_peak_time: f32,
    pub start_position: Vec3,
}

impl Default for FrogTuning {
    fn default() -> Self {
        Self {
            radius: 0.3,
            max_jump_charge_time: 2.0,
            jump_peak_time: 0.5,
            start_position: Vec3::new(0.0, 0.2, 0.0),
        }
    }
}

/// Axis-aligned strip of shore; landing inside ends the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoastlineHitbox {
    pub min_x: f32,
    pub max_x: f32,
    /// Everything at or below this z is shore
    pub z: f32,
}

impl CoastlineHitbox {
    pub fn contains(&self, pos: Vec3) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.z <= self.z
    }
}

/// World layout and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Tiles per difficulty tier (and per base reward step)
    pub difficulty_interval: u32,
    pub water_height: f32,
    /// Half the visible width at water height
    pub view_half_width: f32,
    pub coastline: Vec<CoastlineHitbox>,
    pub coastline_height: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            difficulty_interval: 6,
            water_height: 0.0,
            view_half_width: 2.8,
            coastline: vec![CoastlineHitbox {
                min_x: -20.0,
                max_x: 20.0,
                z: 0.6,
            }],
            coastline_height: 0.2,
        }
    }
}

/// Animation curves with gameplay meaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveTuning {
    /// Normalized jump height over jump progress
    pub jump: Curve,
    pub land_bob: Curve,
    /// The second key marks the lose threshold
    pub sink: Curve,
}

impl Default for CurveTuning {
    fn default() -> Self {
        Self {
            jump: Curve::jump_arc(0.5),
            land_bob: Curve::land_bob(),
            sink: Curve::sink(),
        }
    }
}

impl CurveTuning {
    /// Normalized sink progress past which an attached frog loses
    pub fn sink_lose_time(&self) -> f32 {
        self.sink.key_time(1).unwrap_or(1.0)
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub world: WorldTuning,
    pub frog: FrogTuning,
    pub spawn: SpawnTuning,
    pub tiles: TileSet,
    pub insect: InsectTuning,
    pub curves: CurveTuning,
}

impl Tuning {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.world.difficulty_interval == 0 {
            return Err(TuningError::ZeroInterval);
        }
        positive("view_half_width", self.world.view_half_width)?;
        positive("frog radius", self.frog.radius)?;
        positive("max_jump_charge_time", self.frog.max_jump_charge_time)?;
        positive("insect radius", self.insect.radius)?;
        positive("firefly radius", self.insect.firefly_radius)?;
        self.spawn.validate()?;
        for kind in TileKind::ALL {
            self.tiles.get(kind).validate(kind)?;
        }

        let curves = [
            ("jump", &self.curves.jump),
            ("land_bob", &self.curves.land_bob),
            ("sink", &self.curves.sink),
        ];
        for (name, curve) in curves {
            if !curve.is_well_formed() {
                return Err(TuningError::Curve(name));
            }
        }
        let lose = self.curves.sink_lose_time();
        if !(lose > 0.0 && lose <= 1.0) {
            return Err(TuningError::SinkLoseTime(lose));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NonPositive { name, value })
    }
}
