//! Landing rewards
//!
//! A landing pays the tile's base reward. Eating the insect doubles it and
//! applies the streak multiplier, which grows with every consecutive eaten
//! insect. Skipping tiles (leapfrogging) compounds the reward once per
//! skipped depth.

use super::insect::InsectKind;
use super::landing::JumpOutcome;
use super::tile::Tile;
use crate::SessionStats;
use crate::consts::*;
use crate::persistence::keys;
use crate::services::Services;

/// What a scored landing paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAward {
    pub reward: i64,
    /// Depths skipped by the jump
    pub leapfrog: u32,
    pub ate_insect: bool,
}

/// Streak and depth bookkeeping for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreKeeper {
    leap_streak: u32,
    near_miss_streak: u32,
    multiplier: f32,
    /// -1 while on the coast
    last_tile_depth: i64,
}

impl Default for ScoreKeeper {
    fn default() -> Self {
        Self {
            leap_streak: 0,
            near_miss_streak: 0,
            multiplier: 1.0,
            last_tile_depth: -1,
        }
    }
}

/// Reward after skipping `leapfrog` depths: increment then double, per depth
pub fn apply_leapfrog(reward: i64, leapfrog: u32) -> i64 {
    (0..leapfrog).fold(reward, |r, _| r.saturating_add(1).saturating_mul(2))
}

impl ScoreKeeper {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn leap_streak(&self) -> u32 {
        self.leap_streak
    }

    pub fn near_miss_streak(&self) -> u32 {
        self.near_miss_streak
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn last_tile_depth(&self) -> i64 {
        self.last_tile_depth
    }

    /// Score a landing on `tile`
    ///
    /// Returns `None` when nothing is awarded: a tile that already paid out,
    /// or a `Failed` outcome (which callers must never pass).
    pub fn score_landing(
        &mut self,
        tile: &Tile,
        outcome: JumpOutcome,
        stats: &mut SessionStats,
        services: &mut Services<'_>,
    ) -> Option<ScoreAward> {
        if !outcome.is_landed() {
            log::error!("Scoring requested for a failed jump onto tile {}", tile.map_depth);
            return None;
        }
        if tile.did_award_score {
            return None;
        }

        let mut reward = i64::from(tile.base_score_reward);
        let ate_insect = outcome.ate_insect();

        if ate_insect {
            stats.bugs_eaten += 1;
            if tile.insect.kind == InsectKind::Firefly {
                stats.fireflies_eaten += 1;
            }

            self.leap_streak += 1;
            self.multiplier =
                (self.multiplier * SCORE_STREAK_GROWTH_RATE).min(SCORE_STREAK_MAX_MULTIPLIER);

            if self.leap_streak > stats.highest_leap_streak {
                stats.highest_leap_streak = self.leap_streak;
                if services
                    .store
                    .set_max(keys::RECORD_LEAP_STREAK, i64::from(self.leap_streak))
                {
                    services.achievements.record_progress();
                }
            }

            reward = (reward as f32 * 2.0 * self.multiplier).round() as i64;
            services.presentation.on_streak_changed(self.leap_streak, false);
        } else {
            self.leap_streak = 0;
            self.multiplier = 1.0;
            services.presentation.on_streak_changed(0, true);
        }

        if outcome.is_near_miss() {
            self.near_miss_streak += 1;
            stats.highest_near_miss_streak = stats.highest_near_miss_streak.max(self.near_miss_streak);
        } else {
            self.near_miss_streak = 0;
        }

        let depth = i64::from(tile.map_depth);
        let leapfrog = (depth - self.last_tile_depth - 1).max(0) as u32;
        if leapfrog > 0 {
            reward = apply_leapfrog(reward, leapfrog);
            services
                .store
                .add_int(keys::LEAPFROG_COUNT, i64::from(leapfrog));
            services.achievements.record_progress();
            log::debug!("Leapfrogged {leapfrog} tiles");
        }

        self.last_tile_depth = depth;
        stats.final_score += reward;

        if reward > stats.highest_leap_score {
            stats.highest_leap_score = reward;
            if services.store.set_max(keys::RECORD_LEAP_SCORE, reward) {
                services.achievements.record_progress();
            }
        }

        services
            .presentation
            .on_score_changed(stats.final_score, reward, ate_insect);

        Some(ScoreAward {
            reward,
            leapfrog,
            ate_insect,
        })
    }
}
