//! Frog-go - an endless lily pad hopping arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tiles, landing resolution, game loop)
//! - `tuning`: Data-driven game balance
//! - `services`: Outbound hooks (achievements, leaderboards, presentation)
//! - `persistence`: Key/integer record storage
//! - `records`: Session stats and durable records

pub mod persistence;
pub mod records;
pub mod services;
pub mod sim;
pub mod tuning;

pub use records::SessionStats;
pub use tuning::{Tuning, TuningError};

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Bottom of the screen relative to the camera, at water height.
    /// Tiles whose trailing edge falls behind this get recycled.
    pub const BOT_SCREEN_CAMBOUNDS: f32 = -2.92;
    /// Distance past the screen edges before a repeating tile wraps
    pub const HORIZONTAL_SCREEN_BUFFER: f32 = 0.1;
    /// Shaved off the wrap span so a wrapped tile never lands exactly on the threshold
    pub const WRAP_EPSILON: f32 = 0.01;

    /// Jump distance per second of charge
    pub const JUMP_FORCE_MULTIPLIER: f32 = 4.2;
    /// Flight time of a regular jump (seconds)
    pub const JUMP_TIME: f32 = 0.425;
    pub const FROG_BASE_JUMP_HEIGHT: f32 = 0.51;
    pub const FROG_JUMP_HEIGHT_MULTIPLIER: f32 = 0.65;

    /// Near-miss recovery hop
    pub const STABILIZE_JUMP_DIST_MIN: f32 = 0.15;
    pub const STABILIZE_JUMP_TIME: f32 = 0.2;
    pub const STABILIZE_JUMP_DELAY: f32 = 0.25;
    /// Pause after landing before the player regains control
    pub const NEXT_JUMP_DELAY: f32 = 0.2;
    /// Pause between the loss and the score screen
    pub const SCORE_SCREEN_DELAY: f32 = 0.6;
    /// Drowned frog sinks this far...
    pub const DROWN_DEPTH: f32 = 3.0;
    /// ...over this many seconds
    pub const DROWN_TIME: f32 = 1.0 / 3.0;

    /// Insect streak multiplier growth per consecutive perfect leap
    pub const SCORE_STREAK_GROWTH_RATE: f32 = 1.09;
    pub const SCORE_STREAK_MAX_MULTIPLIER: f32 = 12.0;

    /// Camera lerp rate toward its target (per second)
    pub const CAMERA_FOLLOW_RATE: f32 = 8.0;

    /// Sink shake
    pub const SINK_SHAKE_SPEED: f32 = 18.0;
    pub const SINK_SHAKE_INTENSITY: f32 = 0.03;
    /// Attached idle bob eases to rest at this rate
    pub const IDLE_BOB_SETTLE_RATE: f32 = 3.0;
    /// Land bob plays over one second
    pub const LAND_BOB_TIME: f32 = 1.0;

    /// Jumping off this close to the lose threshold counts as a quick escape
    pub const QUICK_FEET_WINDOW: f32 = 0.175;
    /// Idle seconds before the "asleep" event fires
    pub const ASLEEP_IDLE_TIME: f32 = 15.0;

    /// Uneaten insects linger this long before vanishing
    pub const INSECT_DISAPPEAR_TIME: f32 = 3.0;
    /// Cap on the leap-streak bonus to firefly spawn chance
    pub const MAX_FIREFLY_CHANCE_MULTIPLIER: f32 = 2.0;
}

/// Horizontal (x, z) projection of a world position
#[inline]
pub fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Squared distance on the water plane, ignoring height
#[inline]
pub fn horizontal_sqr_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length_squared()
}

/// Unclamped component-wise lerp
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, -2.0, 4.0);
        assert!((horizontal_sqr_distance(a, b) - 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp_f32(2.0, 4.0, 0.5), 3.0);
        assert_eq!(lerp_f32(2.0, 4.0, 1.5), 5.0);
    }
}
