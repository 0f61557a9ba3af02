//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep
//! - Seeded RNG only
//! - Stable iteration order (placement order of the tile pool)
//! - No rendering or platform dependencies; side effects go out through `Services`

pub mod curve;
pub mod difficulty;
pub mod insect;
pub mod landing;
pub mod scoring;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod tile;

pub use curve::{Curve, Keyframe};
pub use difficulty::DifficultyModel;
pub use insect::{Insect, InsectKind, InsectState};
pub use landing::{JumpOutcome, Landing, WrapIndex, can_land, classify, resolve, stable_position};
pub use scoring::{ScoreAward, ScoreKeeper};
pub use spawner::TileSpawner;
pub use state::{GamePhase, GameState, Hop, LossSequence};
pub use tick::{TickInput, tick, trigger_loss};
pub use tile::{SinkState, Tile, TileEvent, TileKind, TileSpawn, ViewBounds};
