//! Jump landing resolution
//!
//! Tiles that repeat off-screen are visible twice near the edges, so every
//! test runs against three horizontal placements of a tile: where it is, and
//! one wrap span to either side. The placement that matched is carried along
//! as a [`WrapIndex`] so insect checks and the recovery hop use the same copy.

use glam::Vec3;

use super::tile::Tile;
use crate::horizontal_sqr_distance;

/// Result of a landing test; derived per jump, never stored on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Failed,
    Success,
    /// Landed on the insect
    Perfect,
    /// Landed with most of the frog hanging off
    NearMissSuccess,
    NearMissPerfect,
}

impl JumpOutcome {
    pub fn is_landed(self) -> bool {
        self != JumpOutcome::Failed
    }

    pub fn ate_insect(self) -> bool {
        matches!(self, JumpOutcome::Perfect | JumpOutcome::NearMissPerfect)
    }

    pub fn is_near_miss(self) -> bool {
        matches!(
            self,
            JumpOutcome::NearMissSuccess | JumpOutcome::NearMissPerfect
        )
    }

    fn promoted(self) -> Self {
        match self {
            JumpOutcome::Success => JumpOutcome::Perfect,
            JumpOutcome::NearMissSuccess => JumpOutcome::NearMissPerfect,
            other => other,
        }
    }
}

/// Which horizontal placement of a tile matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapIndex {
    /// The tile's true position
    Center,
    /// Shifted one wrap span left
    Left,
    /// Shifted one wrap span right
    Right,
}

impl WrapIndex {
    /// Test order
    pub const ALL: [WrapIndex; 3] = [WrapIndex::Center, WrapIndex::Left, WrapIndex::Right];

    /// 0 = center, 1 = left, 2 = right
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_wrapped(self) -> bool {
        self != WrapIndex::Center
    }

    /// Shift a position to this placement
    pub fn apply(self, pos: Vec3, span: f32) -> Vec3 {
        match self {
            WrapIndex::Center => pos,
            WrapIndex::Left => Vec3::new(pos.x - span, pos.y, pos.z),
            WrapIndex::Right => Vec3::new(pos.x + span, pos.y, pos.z),
        }
    }
}

/// A resolved landing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    /// Pool slot of the tile landed on
    pub slot: usize,
    pub outcome: JumpOutcome,
    pub wrap: WrapIndex,
}

/// Generous test: a quarter of the frog over the tile is enough
pub fn can_land(tile: &Tile, frog: Vec3, frog_radius: f32, view_width: f32) -> Option<WrapIndex> {
    let span = tile.horizontal_reset_distance(view_width);
    let ext = tile.hitbox_extent;
    let slack = frog_radius * 0.5;

    WrapIndex::ALL.into_iter().find(|wrap| {
        let center = wrap.apply(tile.anchor(), span);
        if tile.kind.is_circular() {
            let threshold = ext.x + slack;
            horizontal_sqr_distance(center, frog) < threshold * threshold
        } else {
            (frog.x - center.x).abs() < ext.x + slack && (frog.z - center.z).abs() < ext.z + slack
        }
    })
}

/// Classify a landing against one tile
pub fn classify(
    tile: &Tile,
    frog: Vec3,
    frog_radius: f32,
    view_width: f32,
) -> (JumpOutcome, Option<WrapIndex>) {
    let Some(wrap) = can_land(tile, frog, frog_radius, view_width) else {
        return (JumpOutcome::Failed, None);
    };

    let span = tile.horizontal_reset_distance(view_width);
    let center = wrap.apply(tile.anchor(), span);
    let ext = tile.hitbox_extent;

    // Fully on means at least three quarters of the frog over the tile
    let near_miss = if tile.kind.is_circular() {
        // A pad smaller than the frog can never hold it fully
        let threshold = ext.x - frog_radius;
        threshold <= 0.0 || horizontal_sqr_distance(center, frog) > threshold * threshold
    } else {
        (frog.x - center.x).abs() > ext.x - frog_radius
            || (frog.z - center.z).abs() > ext.z - frog_radius
    };
    let mut outcome = if near_miss {
        JumpOutcome::NearMissSuccess
    } else {
        JumpOutcome::Success
    };

    if tile.insect.is_active() {
        let insect = wrap.apply(tile.insect.world_position(tile.position()), span);
        if horizontal_sqr_distance(frog, insect) < frog_radius * frog_radius {
            outcome = outcome.promoted();
        }
    }

    (outcome, Some(wrap))
}

/// Test tiles in order; the first one landed on wins, even if a later one is closer
pub fn resolve<'a>(
    tiles: impl IntoIterator<Item = (usize, &'a Tile)>,
    frog: Vec3,
    frog_radius: f32,
    view_width: f32,
) -> Option<Landing> {
    tiles.into_iter().find_map(|(slot, tile)| {
        match classify(tile, frog, frog_radius, view_width) {
            (outcome, Some(wrap)) if outcome.is_landed() => Some(Landing {
                slot,
                outcome,
                wrap,
            }),
            _ => None,
        }
    })
}

/// Nearest point with the frog fully on the tile, for the near-miss recovery hop
///
/// Computed from the tile's current position shifted by the placement the
/// landing matched. Hops shorter than `min_move` are stretched toward the tile
/// center so the recovery stays visible.
pub fn stable_position(
    tile: &Tile,
    frog: Vec3,
    frog_radius: f32,
    min_move: f32,
    wrap: WrapIndex,
    view_width: f32,
) -> Vec3 {
    let span = tile.horizontal_reset_distance(view_width);
    let center = wrap.apply(tile.position(), span);
    let mut dir = frog - center;
    dir.y = 0.0;

    let mut target = if tile.kind.is_circular() {
        center + dir.normalize_or_zero() * (tile.radius() - frog_radius).max(0.0)
    } else {
        let sx = (tile.hitbox_extent.x - frog_radius).max(0.0);
        let sz = (tile.hitbox_extent.z - frog_radius).max(0.0);
        center + Vec3::new(dir.x.clamp(-sx, sx), 0.0, dir.z.clamp(-sz, sz))
    };

    let mut hop = target - frog;
    hop.y = 0.0;
    let hop_len = hop.length();
    if hop_len > 0.0 && min_move > 0.0 && hop_len < min_move {
        target = frog - dir.normalize_or_zero() * min_move;
    }

    target.y = tile.top_surface_y();
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::insect::{Insect, InsectKind, InsectState};
    use crate::sim::tile::TileKind;
    use proptest::prelude::*;

    const VIEW: f32 = 5.6;

    fn pad(radius: f32) -> Tile {
        Tile::with_hitbox(TileKind::LilyPad, Vec3::ZERO, Vec3::new(radius, 0.05, radius))
    }

    fn with_insect(mut tile: Tile, offset: Vec3) -> Tile {
        tile.insect = Insect {
            kind: InsectKind::Regular,
            state: InsectState::Active,
            radius: 0.1,
            local_offset: offset,
        };
        tile
    }

    #[test]
    fn test_lily_pad_near_miss_example() {
        let tile = pad(1.0);
        let frog = Vec3::new(0.8, 0.0, 0.0);
        assert_eq!(
            classify(&tile, frog, 0.3, VIEW),
            (JumpOutcome::NearMissSuccess, Some(WrapIndex::Center))
        );
    }

    #[test]
    fn test_lily_pad_thresholds() {
        let tile = pad(1.0);
        let at = |x: f32| classify(&tile, Vec3::new(0.0, 0.0, x), 0.3, VIEW).0;
        assert_eq!(at(0.5), JumpOutcome::Success);
        assert_eq!(at(0.65), JumpOutcome::Success);
        assert_eq!(at(1.1), JumpOutcome::NearMissSuccess);
        assert_eq!(at(1.2), JumpOutcome::Failed);
    }

    #[test]
    fn test_rectangle_near_miss_on_either_axis() {
        let tile = Tile::with_hitbox(TileKind::FloatingBox, Vec3::ZERO, Vec3::new(0.5, 0.15, 0.5));
        let r = 0.3;
        assert_eq!(classify(&tile, Vec3::new(0.1, 0.0, 0.1), r, VIEW).0, JumpOutcome::Success);
        assert_eq!(
            classify(&tile, Vec3::new(0.0, 0.0, 0.3), r, VIEW).0,
            JumpOutcome::NearMissSuccess
        );
        assert_eq!(
            classify(&tile, Vec3::new(0.3, 0.0, 0.0), r, VIEW).0,
            JumpOutcome::NearMissSuccess
        );
        assert_eq!(classify(&tile, Vec3::new(0.0, 0.0, 0.7), r, VIEW).0, JumpOutcome::Failed);
    }

    #[test]
    fn test_tile_smaller_than_frog_is_always_near_miss() {
        let ext = Vec3::new(0.25, 0.05, 0.25);
        let frog = Vec3::new(0.02, 0.0, 0.0);
        let pad = Tile::with_hitbox(TileKind::LilyPad, Vec3::ZERO, ext);
        let crate_box = Tile::with_hitbox(TileKind::FloatingBox, Vec3::ZERO, ext);

        assert_eq!(
            classify(&pad, frog, 0.3, VIEW),
            (JumpOutcome::NearMissSuccess, Some(WrapIndex::Center))
        );
        assert_eq!(
            classify(&crate_box, frog, 0.3, VIEW),
            (JumpOutcome::NearMissSuccess, Some(WrapIndex::Center))
        );
        // Dead center too
        assert_eq!(classify(&pad, Vec3::ZERO, 0.3, VIEW).0, JumpOutcome::NearMissSuccess);
    }

    #[test]
    fn test_wrapped_placements() {
        let tile = Tile::with_hitbox(TileKind::DriftingLog, Vec3::new(3.5, 0.0, 4.0), Vec3::new(1.0, 0.1, 0.3));
        let span = tile.horizontal_reset_distance(VIEW);

        let left = Vec3::new(3.5 - span, 0.0, 4.0);
        assert_eq!(can_land(&tile, left, 0.3, VIEW), Some(WrapIndex::Left));
        let right = Vec3::new(3.5 + span, 0.0, 4.0);
        assert_eq!(can_land(&tile, right, 0.3, VIEW), Some(WrapIndex::Right));
        assert_eq!(can_land(&tile, Vec3::new(0.0, 0.0, 4.0), 0.3, VIEW), None);
    }

    #[test]
    fn test_insect_promotion_uses_matched_placement() {
        let tile = with_insect(
            Tile::with_hitbox(TileKind::DriftingLog, Vec3::new(3.5, 0.0, 4.0), Vec3::new(1.0, 0.1, 0.3)),
            Vec3::new(0.4, 0.1, 0.0),
        );
        let span = tile.horizontal_reset_distance(VIEW);

        let on_insect = Vec3::new(3.9, 0.0, 4.0);
        assert_eq!(
            classify(&tile, on_insect, 0.3, VIEW),
            (JumpOutcome::Perfect, Some(WrapIndex::Center))
        );
        let on_wrapped_insect = Vec3::new(3.9 - span, 0.0, 4.0);
        assert_eq!(
            classify(&tile, on_wrapped_insect, 0.3, VIEW),
            (JumpOutcome::Perfect, Some(WrapIndex::Left))
        );
    }

    #[test]
    fn test_near_miss_perfect() {
        let tile = with_insect(pad(1.0), Vec3::new(0.85, 0.05, 0.0));
        assert_eq!(
            classify(&tile, Vec3::new(0.9, 0.0, 0.0), 0.3, VIEW).0,
            JumpOutcome::NearMissPerfect
        );
    }

    #[test]
    fn test_inactive_insect_does_not_promote() {
        let mut tile = with_insect(pad(1.0), Vec3::new(0.1, 0.05, 0.0));
        tile.clear_insect(true);
        assert_eq!(
            classify(&tile, Vec3::new(0.1, 0.0, 0.0), 0.3, VIEW).0,
            JumpOutcome::Success
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Frog is nearer the second tile but still over the first one
        let first = pad(1.0);
        let second = Tile::with_hitbox(TileKind::LilyPad, Vec3::new(1.5, 0.0, 0.0), Vec3::new(1.0, 0.05, 1.0));
        let frog = Vec3::new(1.0, 0.0, 0.0);

        let tiles = [first, second];
        let landing = resolve(tiles.iter().enumerate(), frog, 0.3, VIEW).unwrap();
        assert_eq!(landing.slot, 0);
        assert_eq!(landing.outcome, JumpOutcome::NearMissSuccess);

        let landing = resolve(tiles.iter().enumerate().rev(), frog, 0.3, VIEW).unwrap();
        assert_eq!(landing.slot, 1);
        assert_eq!(landing.outcome, JumpOutcome::Success);
    }

    #[test]
    fn test_resolve_none_when_missed() {
        let tiles = [pad(1.0)];
        assert_eq!(resolve(tiles.iter().enumerate(), Vec3::new(0.0, 0.0, 3.0), 0.3, VIEW), None);
    }

    #[test]
    fn test_stable_position_circle() {
        let tile = pad(1.0);
        let stable = stable_position(&tile, Vec3::new(0.9, 0.4, 0.0), 0.3, 0.15, WrapIndex::Center, VIEW);
        assert!((stable - Vec3::new(0.7, 0.05, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_stable_position_enforces_min_hop() {
        let tile = pad(1.0);
        let stable = stable_position(&tile, Vec3::new(0.75, 0.0, 0.0), 0.3, 0.15, WrapIndex::Center, VIEW);
        assert!((stable.x - 0.6).abs() < 1e-5);
        assert_eq!(stable.y, tile.top_surface_y());
    }

    #[test]
    fn test_stable_position_rectangle_clamps_per_axis() {
        let tile = Tile::with_hitbox(TileKind::FloatingBox, Vec3::ZERO, Vec3::new(1.0, 0.15, 0.5));
        let stable = stable_position(&tile, Vec3::new(0.2, 0.0, 0.6), 0.3, 0.15, WrapIndex::Center, VIEW);
        assert!((stable - Vec3::new(0.2, 0.15, 0.2)).length() < 1e-5);
    }

    #[test]
    fn test_stable_position_on_wrapped_copy() {
        let tile = Tile::with_hitbox(TileKind::DriftingLog, Vec3::new(3.5, 0.0, 4.0), Vec3::new(1.0, 0.1, 0.3));
        let span = tile.horizontal_reset_distance(VIEW);
        let frog = Vec3::new(3.5 - span + 0.95, 0.0, 4.0);
        let stable = stable_position(&tile, frog, 0.3, 0.15, WrapIndex::Left, VIEW);
        assert!((stable.x - (3.5 - span + 0.7)).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_classify_is_idempotent(
            x in -10.0f32..10.0,
            z in -3.0f32..3.0,
            ex in 0.25f32..2.0,
            ez in 0.18f32..2.0,
            kind in 0usize..TileKind::COUNT,
            frog_radius in 0.05f32..0.6,
        ) {
            let tile = with_insect(
                Tile::with_hitbox(TileKind::ALL[kind], Vec3::new(1.0, 0.0, 0.0), Vec3::new(ex, 0.1, ez)),
                Vec3::new(0.1, 0.1, -0.1),
            );
            let frog = Vec3::new(x, 0.3, z);
            let first = classify(&tile, frog, frog_radius, VIEW);
            let second = classify(&tile, frog, frog_radius, VIEW);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first.0.is_landed(), first.1.is_some());
        }
    }
}
