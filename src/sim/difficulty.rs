//! Progressive per-kind difficulty scaling
//!
//! Every `interval` placements of a kind, that kind's tiles get smaller,
//! farther apart, faster and quicker to sink. The global tier is derived from
//! the total number of tiles placed.

use super::tile::TileKind;
use crate::tuning::{DifficultyFactors, TileSet};

/// Difficulty progress for one tile kind
#[derive(Debug, Clone, PartialEq)]
pub struct TileDifficulty {
    /// Placements since the last step
    pub progress: u32,
    pub size_multiplier: f32,
    pub distance_multiplier: f32,
    pub velocity_multiplier: f32,
    pub sink_time_multiplier: f32,
    interval: u32,
    factors: DifficultyFactors,
}

impl TileDifficulty {
    pub fn new(interval: u32, factors: DifficultyFactors) -> Self {
        Self {
            progress: 0,
            size_multiplier: 1.0,
            distance_multiplier: 1.0,
            velocity_multiplier: 1.0,
            sink_time_multiplier: 1.0,
            interval: interval.max(1),
            factors,
        }
    }

    /// Count one placement; returns true when the multipliers stepped
    pub fn advance(&mut self) -> bool {
        self.progress += 1;
        if self.progress < self.interval {
            return false;
        }

        self.size_multiplier *= self.factors.size;
        self.distance_multiplier *= self.factors.distance;
        self.velocity_multiplier *= self.factors.velocity;
        self.sink_time_multiplier *= self.factors.sink_time;
        self.progress = 0;
        true
    }
}

/// Difficulty state for all kinds plus the global placement count
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyModel {
    per_kind: [TileDifficulty; TileKind::COUNT],
    tiles_placed: u32,
    interval: u32,
}

impl DifficultyModel {
    pub fn new(interval: u32, tiles: &TileSet) -> Self {
        let per_kind = TileKind::ALL.map(|k| TileDifficulty::new(interval, tiles.get(k).difficulty));
        Self {
            per_kind,
            tiles_placed: 0,
            interval: interval.max(1),
        }
    }

    /// Back to the easiest settings
    pub fn reset(&mut self) {
        for d in &mut self.per_kind {
            *d = TileDifficulty::new(d.interval, d.factors);
        }
        self.tiles_placed = 0;
    }

    /// Record a placement of `kind`
    pub fn advance(&mut self, kind: TileKind) {
        let stepped = self.per_kind[kind.index()].advance();
        let tier_before = self.tier();
        self.tiles_placed += 1;

        if stepped {
            log::debug!("{kind:?} difficulty stepped: {:?}", self.per_kind[kind.index()]);
        }
        if self.tier() != tier_before {
            log::info!("Difficulty tier {} reached", self.tier());
        }
    }

    /// Current tier: tiles placed / interval
    pub fn tier(&self) -> u32 {
        self.tiles_placed / self.interval
    }

    pub fn tiles_placed(&self) -> u32 {
        self.tiles_placed
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn get(&self, kind: TileKind) -> &TileDifficulty {
        &self.per_kind[kind.index()]
    }
}
