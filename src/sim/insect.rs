//! Bonus insects sitting on tiles
//!
//! Each tile carries one insect. Landing on it (within the frog radius)
//! promotes the jump to Perfect. Insects on tiles the frog passes without
//! eating them flee and disappear.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tile::TileKind;
use crate::consts::*;
use crate::tuning::InsectTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsectKind {
    /// The tile kind's usual bug
    Regular,
    /// Rare special insect, tracked separately in stats
    Firefly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InsectState {
    /// Sitting on the tile, can be eaten
    Active,
    Eaten,
    /// Scared off; gone once the timer runs out
    Fleeing { timer: f32 },
    Gone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insect {
    pub kind: InsectKind,
    pub state: InsectState,
    pub radius: f32,
    /// Offset from the tile center; y sits on the tile's top surface
    pub local_offset: Vec3,
}

impl Default for Insect {
    fn default() -> Self {
        Self {
            kind: InsectKind::Regular,
            state: InsectState::Gone,
            radius: 0.0,
            local_offset: Vec3::ZERO,
        }
    }
}

impl Insect {
    /// Respawn on a freshly placed tile
    pub fn respawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        tile_kind: TileKind,
        extent: Vec3,
        leap_streak: u32,
        tuning: &InsectTuning,
    ) {
        // Each leap streak raises the firefly chance by 1% of itself, capped
        let bonus = (1.0 + leap_streak as f32 * 0.01).min(MAX_FIREFLY_CHANCE_MULTIPLIER);
        let firefly = rng.random::<f32>() < tuning.firefly_chance * bonus;

        self.kind = if firefly {
            InsectKind::Firefly
        } else {
            InsectKind::Regular
        };
        self.radius = if firefly {
            tuning.firefly_radius
        } else {
            tuning.radius
        };
        self.state = InsectState::Active;

        let ratio = tuning.max_offset_ratio;
        let ex = (extent.x - self.radius).max(0.0);
        let ez = (extent.z - self.radius).max(0.0);
        let offset = match tile_kind {
            // Mostly along the log
            TileKind::DriftingLog => Vec2::new(
                symmetric(rng, ex) * ratio,
                symmetric(rng, ez) * 0.5 * ratio,
            ),
            TileKind::FloatingBox => Vec2::new(symmetric(rng, ex) * ratio, symmetric(rng, ez) * ratio),
            TileKind::LilyPad => inside_unit_circle(rng) * ex * ratio,
        };
        self.local_offset = Vec3::new(offset.x, extent.y, offset.y);
    }

    pub fn is_active(&self) -> bool {
        self.state == InsectState::Active
    }

    /// World position given the owning tile's position
    pub fn world_position(&self, tile_position: Vec3) -> Vec3 {
        tile_position + self.local_offset
    }

    /// Remove from play; uneaten insects flee first
    pub fn clear(&mut self, eaten: bool) {
        if !self.is_active() {
            return;
        }
        self.state = if eaten {
            InsectState::Eaten
        } else {
            InsectState::Fleeing {
                timer: INSECT_DISAPPEAR_TIME,
            }
        };
    }

    pub fn update(&mut self, dt: f32) {
        if let InsectState::Fleeing { timer } = &mut self.state {
            *timer -= dt;
            if *timer <= 0.0 {
                self.state = InsectState::Gone;
            }
        }
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent <= 0.0 {
        0.0
    } else {
        rng.random_range(-extent..extent)
    }
}

fn inside_unit_circle<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    // sqrt for uniform area density
    let r = rng.random::<f32>().sqrt();
    Vec2::new(angle.cos(), angle.sin()) * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_respawn_stays_within_tile() {
        let mut rng = Pcg32::seed_from_u64(7);
        let tuning = InsectTuning::default();
        let extent = Vec3::new(1.0, 0.05, 0.4);
        let mut insect = Insect::default();

        let ratio = tuning.max_offset_ratio;
        let eps = 1e-5;

        for kind in TileKind::ALL {
            for _ in 0..200 {
                insect.respawn(&mut rng, kind, extent, 0, &tuning);
                assert!(insect.is_active());
                assert_eq!(insect.local_offset.y, extent.y);

                let x = insect.local_offset.x.abs();
                let z = insect.local_offset.z.abs();
                let max_x = (extent.x - insect.radius) * ratio;
                let max_z = (extent.z - insect.radius) * ratio;
                match kind {
                    TileKind::FloatingBox => {
                        assert!(x <= max_x + eps);
                        assert!(z <= max_z + eps);
                    }
                    TileKind::DriftingLog => {
                        assert!(x <= max_x + eps);
                        assert!(z <= max_z * 0.5 + eps, "log offset {z} off the log");
                    }
                    TileKind::LilyPad => {
                        let r = Vec2::new(insect.local_offset.x, insect.local_offset.z).length();
                        assert!(r <= max_x + eps, "pad offset {r} off the pad");
                    }
                }
            }
        }
    }

    #[test]
    fn test_guaranteed_firefly() {
        let mut rng = Pcg32::seed_from_u64(1);
        let tuning = InsectTuning {
            firefly_chance: 1.0,
            ..Default::default()
        };
        let mut insect = Insect::default();
        insect.respawn(&mut rng, TileKind::LilyPad, Vec3::ONE, 0, &tuning);
        assert_eq!(insect.kind, InsectKind::Firefly);
    }

    #[test]
    fn test_clear_eaten_and_flee() {
        let mut insect = Insect {
            state: InsectState::Active,
            ..Default::default()
        };
        insect.clear(true);
        assert_eq!(insect.state, InsectState::Eaten);

        let mut insect = Insect {
            state: InsectState::Active,
            ..Default::default()
        };
        insect.clear(false);
        assert!(!insect.is_active());
        insect.update(INSECT_DISAPPEAR_TIME * 0.5);
        assert!(matches!(insect.state, InsectState::Fleeing { .. }));
        insect.update(INSECT_DISAPPEAR_TIME);
        assert_eq!(insect.state, InsectState::Gone);
    }

    #[test]
    fn test_clear_is_noop_when_inactive() {
        let mut insect = Insect {
            state: InsectState::Eaten,
            ..Default::default()
        };
        insect.clear(false);
        assert_eq!(insect.state, InsectState::Eaten);
    }
}
