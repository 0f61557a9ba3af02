//! Tile pool and procedural placement
//!
//! A fixed set of tiles is created once. Placement pulls from the pool and
//! puts the tile ahead of the previous one; recycling returns the oldest
//! active tile. Slots are indices into the owned `tiles` vector.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;

use super::difficulty::DifficultyModel;
use super::tile::{Tile, TileKind, TileSpawn, ViewBounds};
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct TileSpawner {
    tiles: Vec<Tile>,
    pooled: VecDeque<usize>,
    /// Placement order
    active: Vec<usize>,
    difficulty: DifficultyModel,
    last_tile_pos: Vec3,
    base_score_reward: u32,
    min_tile_z: f32,
}

impl TileSpawner {
    pub fn new(tuning: &Tuning) -> Self {
        let size = tuning.spawn.pool_size;
        Self {
            tiles: vec![Tile::default(); size],
            pooled: (0..size).collect(),
            active: Vec::with_capacity(size),
            difficulty: DifficultyModel::new(tuning.world.difficulty_interval, &tuning.tiles),
            last_tile_pos: Vec3::ZERO,
            base_score_reward: 1,
            min_tile_z: f32::MAX,
        }
    }

    /// Return every tile, restore the easiest difficulty and fill the pool
    /// ahead of `start`
    pub fn reset<R: Rng + ?Sized>(&mut self, start: Vec3, tuning: &Tuning, rng: &mut R) {
        while let Some(slot) = self.active.pop() {
            self.return_to_pool(slot);
        }
        // Keep slot order stable so a reset session replays identically
        self.pooled.make_contiguous().sort_unstable();

        self.difficulty.reset();
        self.base_score_reward = 1;
        self.last_tile_pos = start;
        self.update_bounds();

        while self.place_next(tuning, 0, rng).is_some() {}
        log::debug!("Spawner reset with {} tiles ahead of {start}", self.active.len());
    }

    /// Place the next tile; `None` if the pool is empty
    pub fn place_next<R: Rng + ?Sized>(
        &mut self,
        tuning: &Tuning,
        leap_streak: u32,
        rng: &mut R,
    ) -> Option<usize> {
        let slot = self.pooled.pop_front()?;
        let spawn = &tuning.spawn;
        self.last_tile_pos.y = tuning.world.water_height;

        let kind = self.pick_kind(tuning, rng);
        let diff = self.difficulty.get(kind);

        let distance = (spawn.base_distance * diff.distance_multiplier * spawn.distance_variance.sample(rng))
            .min(spawn.max_distance);
        let angle = if spawn.angle_variance > 0.0 {
            rng.random_range(-spawn.angle_variance..spawn.angle_variance)
                .to_radians()
        } else {
            0.0
        };
        self.last_tile_pos += Vec3::new(angle.sin() * distance, 0.0, angle.cos() * distance);

        let scale = spawn.base_size_radius
            * spawn
                .min_size_multiplier
                .max(diff.size_multiplier * spawn.size_variance.sample(rng));
        let sink_time = spawn
            .min_sink_time
            .max(spawn.base_sink_time * diff.sink_time_multiplier);

        let (height_ratio, velocity) = if kind == TileKind::DriftingLog {
            let height = spawn
                .min_size_multiplier
                .max(diff.size_multiplier * spawn.size_variance.sample(rng));
            let speed = (spawn.base_drift_velocity * diff.velocity_multiplier).min(spawn.max_drift_velocity)
                * spawn.velocity_variance.sample(rng);
            let velocity = if rng.random_bool(0.5) { -speed } else { speed };
            (height, velocity)
        } else {
            (1.0, 0.0)
        };

        let request = TileSpawn {
            kind,
            position: self.last_tile_pos,
            scale,
            height_ratio,
            velocity,
            sink_time,
            map_depth: self.difficulty.tiles_placed(),
            base_score_reward: self.base_score_reward,
        };
        self.tiles[slot].initialize(
            &request,
            tuning.tiles.get(kind),
            &tuning.curves,
            &tuning.insect,
            leap_streak,
            rng,
        );
        log::debug!(
            "Placed {kind:?} #{} at ({:.2}, {:.2}) scale {scale:.2} velocity {velocity:.2}",
            request.map_depth,
            request.position.x,
            request.position.z,
        );

        self.active.push(slot);
        self.difficulty.advance(kind);
        if self.difficulty.tiles_placed() % self.difficulty.interval() == 0 {
            self.base_score_reward += 1;
        }
        self.update_bounds();
        Some(slot)
    }

    fn pick_kind<R: Rng + ?Sized>(&self, tuning: &Tuning, rng: &mut R) -> TileKind {
        let tier = self.difficulty.tier();
        if tier == 0 {
            return TileKind::LilyPad;
        }
        let Some(row) = tuning.spawn.distribution_row(tier) else {
            return TileKind::LilyPad;
        };

        let draw: f32 = rng.random();
        let mut end = 0.0;
        for (kind, weight) in TileKind::ALL.into_iter().zip(row) {
            let start = end;
            end += weight;
            if draw >= start && draw < end {
                return kind;
            }
        }
        // Row summed a hair under 1.0 and the draw fell in the gap
        TileKind::LilyPad
    }

    /// Return the active tile with the lowest depth to the pool
    pub fn recycle_oldest(&mut self) -> Option<usize> {
        let (index, &slot) = self
            .active
            .iter()
            .enumerate()
            .min_by_key(|(_, slot)| self.tiles[**slot].map_depth)?;
        self.active.remove(index);
        self.return_to_pool(slot);
        self.update_bounds();
        log::debug!("Recycled tile #{}", self.tiles[slot].map_depth);
        Some(slot)
    }

    fn return_to_pool(&mut self, slot: usize) {
        self.tiles[slot].frog_attached = false;
        self.pooled.push_back(slot);
    }

    /// Recompute the trailing edge of the active tiles
    pub fn update_bounds(&mut self) {
        self.min_tile_z = self
            .active
            .iter()
            .map(|&slot| {
                let tile = &self.tiles[slot];
                tile.position().z + tile.radius()
            })
            .fold(f32::MAX, f32::min);
    }

    /// Advance every active tile; returns the slot whose sink cost the frog, if any
    pub fn update_tiles(&mut self, tuning: &Tuning, view: ViewBounds, dt: f32) -> Option<usize> {
        let mut lost_on = None;
        for &slot in &self.active {
            let tile = &mut self.tiles[slot];
            let settings = tuning.tiles.get(tile.kind);
            if tile.update(settings, &tuning.curves, view, dt).is_some() {
                lost_on.get_or_insert(slot);
            }
        }
        lost_on
    }

    pub fn min_tile_z(&self) -> f32 {
        self.min_tile_z
    }

    pub fn tile(&self, slot: usize) -> Option<&Tile> {
        self.tiles.get(slot)
    }

    pub fn tile_mut(&mut self, slot: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(slot)
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active.contains(&slot)
    }

    /// Active tiles in placement order
    pub fn active_tiles(&self) -> impl Iterator<Item = (usize, &Tile)> + '_ {
        self.active.iter().map(|&slot| (slot, &self.tiles[slot]))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pooled.len()
    }

    pub fn difficulty(&self) -> &DifficultyModel {
        &self.difficulty
    }

    pub fn last_tile_pos(&self) -> Vec3 {
        self.last_tile_pos
    }
}
