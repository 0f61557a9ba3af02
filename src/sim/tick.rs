//! Per-frame simulation tick
//!
//! Order within a tick: tiles, the active phase sequence, player input,
//! riding the attached tile, camera, pool maintenance.

use glam::Vec3;

use super::landing::{self, JumpOutcome, Landing};
use super::state::{GamePhase, GameState, Hop, LossSequence};
use crate::consts::*;
use crate::horizontal;
use crate::persistence::keys;
use crate::records::{commit_records, submit_leaderboards};
use crate::services::{AchievementId, Services};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Touch/mouse went down this tick
    pub press: bool,
    /// Touch/mouse went up this tick
    pub release: bool,
    /// Pointer projected onto the water plane
    pub aim: Option<Vec3>,
    /// Pointer is over the cancel area
    pub in_cancel_zone: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - a bot plays the game
    pub idle_mode: bool,
}

/// Advance the session by `dt` seconds
pub fn tick(state: &mut GameState, services: &mut Services<'_>, input: &TickInput, dt: f32) {
    if state.phase == GamePhase::Exited {
        return;
    }

    if input.pause {
        state.paused = !state.paused;
        log::debug!("Paused: {}", state.paused);
    }
    if state.paused {
        return;
    }

    let input = if input.idle_mode {
        auto_input(state, dt)
    } else {
        input.clone()
    };

    state.time_ticks += 1;

    update_tiles(state, dt);
    advance_phase(state, services, dt);
    handle_input(state, services, &input, dt);
    follow_attached_tile(state);

    let t = (dt * CAMERA_FOLLOW_RATE).min(1.0);
    state.camera = state.camera.lerp(state.camera_target, t);

    maintain_pool(state);
}

fn update_tiles(state: &mut GameState, dt: f32) {
    let view = state.view_bounds();
    if let Some(slot) = state.spawner.update_tiles(&state.tuning, view, dt) {
        if state.attached == Some(slot) {
            state.attached = None;
        }
        trigger_loss(state, true);
    }
}

/// End the run; no-op if it already ended
pub fn trigger_loss(state: &mut GameState, drowned: bool) {
    if matches!(state.phase, GamePhase::Lost(_) | GamePhase::Exited) {
        return;
    }
    log::info!(
        "Run lost ({}), score {}",
        if drowned { "drowned" } else { "gave up" },
        state.stats.final_score
    );
    state.phase = GamePhase::Lost(LossSequence::new(drowned));
}

fn advance_phase(state: &mut GameState, services: &mut Services<'_>, dt: f32) {
    match state.phase {
        GamePhase::Airborne(mut hop) => {
            if hop.progress < 1.0 && !step_hop(state, &mut hop) {
                hop.progress += dt / hop.duration;
                state.phase = GamePhase::Airborne(hop);
                return;
            }
            state.frog = hop.end;
            land(state, services, &hop);
        }
        GamePhase::Settling { timer, wrap } => {
            let timer = timer - dt;
            if timer > 0.0 {
                state.phase = GamePhase::Settling { timer, wrap };
                return;
            }
            let Some(tile) = state.attached_tile() else {
                state.phase = GamePhase::Recovering {
                    timer: NEXT_JUMP_DELAY,
                };
                return;
            };

            let start = state.frog;
            let end = landing::stable_position(
                tile,
                start,
                state.tuning.frog.radius,
                STABILIZE_JUMP_DIST_MIN,
                wrap,
                state.view_width(),
            );
            let mut step = end - start;
            step.y = 0.0;
            state.camera_target += step;
            let distance = STABILIZE_JUMP_DIST_MIN.max((end - start).length());
            state.phase = GamePhase::Stabilizing(Hop::new(start, end, STABILIZE_JUMP_TIME, distance));
        }
        GamePhase::Stabilizing(mut hop) => {
            if hop.progress < 1.0 && !step_hop(state, &mut hop) {
                hop.progress += dt / hop.duration;
                state.phase = GamePhase::Stabilizing(hop);
                return;
            }
            state.frog = hop.end;
            if let Some(slot) = state.attached {
                if let Some(tile) = state.spawner.tile_mut(slot) {
                    state.frog.y = tile.top_surface_y();
                    tile.play_bob(state.tuning.tiles.get(tile.kind));
                }
            }
            state.phase = GamePhase::Recovering {
                timer: NEXT_JUMP_DELAY,
            };
        }
        GamePhase::Recovering { timer } => {
            let timer = timer - dt;
            if timer > 0.0 {
                state.phase = GamePhase::Recovering { timer };
                return;
            }
            if let Some(slot) = state.attached {
                if let Some(tile) = state.spawner.tile_mut(slot) {
                    tile.start_sinking(state.tuning.tiles.get(tile.kind));
                }
            }
            state.phase = GamePhase::Idle;
        }
        GamePhase::Lost(mut loss) => {
            advance_loss(state, services, &mut loss, dt);
            state.phase = GamePhase::Lost(loss);
        }
        GamePhase::Idle | GamePhase::Charging { .. } | GamePhase::Exited => {}
    }
}

/// Place the frog along the hop; returns true if it touched down early on a
/// tile surface (the hop end is moved there)
fn step_hop(state: &mut GameState, hop: &mut Hop) -> bool {
    let pos = hop.position(&state.tuning.curves.jump);
    state.frog = pos;
    state.idle_timer = 0.0;

    // Only while coming down
    if hop.progress <= state.tuning.frog.jump_peak_time {
        return false;
    }
    let radius = state.tuning.frog.radius;
    let view_width = state.view_width();
    for (_, tile) in state.spawner.active_tiles() {
        let top = tile.top_surface_y();
        if pos.y < top && landing::can_land(tile, pos, radius, view_width).is_some() {
            hop.end = Vec3::new(pos.x, top, pos.z);
            return true;
        }
    }
    false
}

fn land(state: &mut GameState, services: &mut Services<'_>, hop: &Hop) {
    let coast = &state.tuning.world;
    if coast.coastline.iter().any(|c| c.contains(state.frog)) {
        if state.left_the_beach {
            services.achievements.record_event(AchievementId::IPreferTheBeach);
        }
        state.frog.y = state.frog.y.max(coast.coastline_height);
        trigger_loss(state, false);
        return;
    }

    let moved = horizontal(hop.end - hop.start);
    state.camera_target.x += moved.x;
    state.camera_target.z += moved.y;

    let found = landing::resolve(
        state.spawner.active_tiles(),
        state.frog,
        state.tuning.frog.radius,
        state.view_width(),
    );
    let Some(Landing { slot, outcome, wrap }) = found else {
        trigger_loss(state, true);
        return;
    };

    attach(state, services, slot);
    state.left_the_beach = true;
    if wrap.is_wrapped() {
        services.achievements.record_event(AchievementId::SixthSense);
    }

    if let Some(tile) = state.spawner.tile(slot) {
        state
            .scoring
            .score_landing(tile, outcome, &mut state.stats, services);
    }
    clear_passed_tiles(state, slot, outcome);

    state.phase = if outcome.is_near_miss() {
        GamePhase::Settling {
            timer: STABILIZE_JUMP_DELAY,
            wrap,
        }
    } else {
        GamePhase::Recovering {
            timer: NEXT_JUMP_DELAY,
        }
    };
}

fn attach(state: &mut GameState, services: &mut Services<'_>, slot: usize) {
    let interval = state.tuning.world.difficulty_interval.max(1);
    let Some(tile) = state.spawner.tile_mut(slot) else {
        return;
    };
    state.attached = Some(slot);
    if !tile.on_frog_attached() {
        return;
    }
    state.frog.y = tile.top_surface_y();

    let reached = i64::from(tile.map_depth / interval + 1);
    if services.store.set_max(keys::RECORD_DIFFICULTY_REACHED, reached) {
        services.achievements.record_progress();
    }
    tile.play_bob(state.tuning.tiles.get(tile.kind));
}

/// Everything at or behind the landed depth stops paying out and loses its insect
fn clear_passed_tiles(state: &mut GameState, slot: usize, outcome: JumpOutcome) {
    let Some(depth) = state.spawner.tile(slot).map(|t| t.map_depth) else {
        return;
    };
    let passed: Vec<usize> = state
        .spawner
        .active_tiles()
        .filter(|(_, t)| t.map_depth <= depth)
        .map(|(s, _)| s)
        .collect();
    for s in passed {
        if let Some(tile) = state.spawner.tile_mut(s) {
            tile.did_award_score = true;
            tile.clear_insect(s == slot && outcome.ate_insect());
        }
    }
}

fn advance_loss(state: &mut GameState, services: &mut Services<'_>, loss: &mut LossSequence, dt: f32) {
    loss.elapsed += dt;

    if loss.drowned && loss.elapsed >= NEXT_JUMP_DELAY {
        let from = *loss.drown_from.get_or_insert(state.frog);
        let t = ((loss.elapsed - NEXT_JUMP_DELAY) / DROWN_TIME).min(1.0);
        state.frog = from - Vec3::new(0.0, t * DROWN_DEPTH, 0.0);
    }

    if !loss.reported && loss.elapsed >= loss.reveal_time() {
        loss.reported = true;
        state.stats.highest_difficulty = state.difficulty_tier();
        commit_records(&state.stats, services.store);
        submit_leaderboards(&state.stats, services.scores);
        services.achievements.record_progress();
        services.presentation.on_loss(&state.stats, loss.drowned);
        log::info!("Final stats: {:?}", state.stats);
    }
}

fn handle_input(state: &mut GameState, services: &mut Services<'_>, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Idle => {
            if input.press {
                state.phase = GamePhase::Charging { held: 0.0 };
                state.idle_timer = 0.0;
                return;
            }
            state.idle_timer += dt;
            if !state.asleep_awarded && state.idle_timer >= ASLEEP_IDLE_TIME {
                state.asleep_awarded = true;
                services.achievements.record_event(AchievementId::Asleep);
            }
        }
        GamePhase::Charging { held } => {
            let held = held + dt;
            state.idle_timer = 0.0;

            if input.release && input.in_cancel_zone {
                log::debug!("Jump cancelled");
                state.phase = GamePhase::Idle;
            } else if held >= state.tuning.frog.max_jump_charge_time {
                log::debug!("Jump cancelled after holding {held:.2}s");
                state.phase = GamePhase::Idle;
            } else if input.release {
                jump(state, services, held, input.aim);
            } else {
                state.phase = GamePhase::Charging { held };
            }
        }
        _ => {}
    }
}

fn jump(state: &mut GameState, services: &mut Services<'_>, held: f32, aim: Option<Vec3>) {
    state.phase = GamePhase::Idle;
    if held <= f32::EPSILON {
        return;
    }

    if let Some(tile) = state.attached.take().and_then(|slot| state.spawner.tile_mut(slot)) {
        if tile.on_frog_detached(true) {
            services.achievements.record_event(AchievementId::QuickFeet);
        }
    }

    let target = aim.unwrap_or(state.frog + Vec3::Z);
    let mut dir = target - state.frog;
    dir.y = 0.0;
    let dir = dir.try_normalize().unwrap_or(Vec3::Z);

    let distance = held * JUMP_FORCE_MULTIPLIER;
    let start = state.frog;
    let end = start + dir * distance;
    state.phase = GamePhase::Airborne(Hop::new(start, end, JUMP_TIME, distance));
}

fn follow_attached_tile(state: &mut GameState) {
    let Some(delta) = state.attached_tile().map(|t| t.move_delta()) else {
        return;
    };
    match &mut state.phase {
        // The recovery hop rides the tile through its endpoints
        GamePhase::Stabilizing(hop) => hop.translate(delta),
        GamePhase::Airborne(_) | GamePhase::Lost(_) => return,
        _ => state.frog += delta,
    }
    state.camera_target.x += delta.x;
}

fn maintain_pool(state: &mut GameState) {
    let trailing = state.camera.z + BOT_SCREEN_CAMBOUNDS;
    while trailing > state.spawner.min_tile_z() {
        let Some(slot) = state.spawner.recycle_oldest() else {
            break;
        };
        if state.attached == Some(slot) {
            state.attached = None;
        }
    }
    let streak = state.scoring.leap_streak();
    while state
        .spawner
        .place_next(&state.tuning, streak, &mut state.rng)
        .is_some()
    {}
}

/// Demo bot: charge toward the next tile (its insect if there is one) and let go
/// once the charge covers the distance
fn auto_input(state: &GameState, dt: f32) -> TickInput {
    let mut input = TickInput::default();
    let next_depth = state.scoring.last_tile_depth() + 1;
    let target = state
        .spawner
        .active_tiles()
        .filter(|(_, t)| i64::from(t.map_depth) >= next_depth)
        .min_by_key(|(_, t)| t.map_depth)
        .map(|(_, t)| {
            let spot = if t.insect.is_active() {
                t.insect.world_position(t.anchor())
            } else {
                t.anchor()
            };
            // Lead a drifting tile by the flight time
            spot + Vec3::new(t.horizontal_velocity * JUMP_TIME, 0.0, 0.0)
        });
    let Some(target) = target else {
        return input;
    };

    match state.phase {
        GamePhase::Idle => input.press = true,
        GamePhase::Charging { held } => {
            let needed = horizontal(target - state.frog).length() / JUMP_FORCE_MULTIPLIER;
            input.aim = Some(target);
            input.release = held + dt >= needed;
        }
        _ => {}
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{LocalServices, ServiceEvent};

    fn run(state: &mut GameState, local: &mut LocalServices, input: &TickInput, ticks: usize) {
        for _ in 0..ticks {
            tick(state, &mut local.services(), input, SIM_DT);
        }
    }

    /// Press, hold for `hold_ticks`, release toward `aim`
    fn charge_and_release(state: &mut GameState, local: &mut LocalServices, hold_ticks: usize, aim: Vec3) {
        let press = TickInput {
            press: true,
            ..Default::default()
        };
        run(state, local, &press, 1);
        run(state, local, &TickInput::default(), hold_ticks.saturating_sub(1));
        let release = TickInput {
            release: true,
            aim: Some(aim),
            ..Default::default()
        };
        run(state, local, &release, 1);
    }

    fn demo() -> TickInput {
        TickInput {
            idle_mode: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_press_starts_charging() {
        let mut state = GameState::new(1);
        let mut local = LocalServices::new();
        let press = TickInput {
            press: true,
            ..Default::default()
        };
        run(&mut state, &mut local, &press, 1);
        assert_eq!(state.phase, GamePhase::Charging { held: 0.0 });
        run(&mut state, &mut local, &TickInput::default(), 3);
        assert!(matches!(state.phase, GamePhase::Charging { held } if held > 0.0));
    }

    #[test]
    fn test_release_jumps() {
        let mut state = GameState::new(1);
        let mut local = LocalServices::new();
        let start = state.frog;
        charge_and_release(&mut state, &mut local, 30, Vec3::new(0.0, 0.0, 10.0));
        match state.phase {
            GamePhase::Airborne(hop) => {
                assert_eq!(hop.start, start);
                let expected = 30.0 * SIM_DT * JUMP_FORCE_MULTIPLIER;
                assert!((hop.distance - expected).abs() < 1e-3);
                assert!((hop.end.z - (start.z + expected)).abs() < 1e-3);
            }
            other => panic!("expected airborne, got {other:?}"),
        }
    }

    #[test]
    fn test_cancel_zone_release_cancels() {
        let mut state = GameState::new(2);
        let mut local = LocalServices::new();
        let press = TickInput {
            press: true,
            ..Default::default()
        };
        run(&mut state, &mut local, &press, 1);
        let cancel = TickInput {
            release: true,
            in_cancel_zone: true,
            aim: Some(Vec3::new(0.0, 0.0, 5.0)),
            ..Default::default()
        };
        run(&mut state, &mut local, &cancel, 1);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.frog, state.tuning.frog.start_position);
    }

    #[test]
    fn test_overcharge_cancels() {
        let mut state = GameState::new(3);
        let mut local = LocalServices::new();
        let press = TickInput {
            press: true,
            ..Default::default()
        };
        run(&mut state, &mut local, &press, 1);
        let ticks = (state.tuning.frog.max_jump_charge_time / SIM_DT) as usize + 2;
        run(&mut state, &mut local, &TickInput::default(), ticks);
        assert_eq!(state.phase, GamePhase::Idle);
    }

    #[test]
    fn test_jump_back_to_coast_is_dry_loss() {
        let mut state = GameState::new(4);
        let mut local = LocalServices::new();
        charge_and_release(&mut state, &mut local, 20, Vec3::new(-3.0, 0.0, -3.0));
        run(&mut state, &mut local, &TickInput::default(), 120);

        let losses: Vec<_> = local.presentation.losses().collect();
        assert_eq!(losses.len(), 1);
        assert!(!losses[0].1);
        assert!(state.frog.y >= state.tuning.world.coastline_height);
        assert_eq!(local.achievements.achievements().count(), 0);
    }

    #[test]
    fn test_splash_into_water_drowns() {
        let mut state = GameState::new(5);
        let mut local = LocalServices::new();
        // Right of the first tile, short of the second
        let aim = Vec3::new(2.5, 0.0, 1.0);
        let ticks = (horizontal(aim - state.frog).length() / JUMP_FORCE_MULTIPLIER / SIM_DT) as usize;
        charge_and_release(&mut state, &mut local, ticks, aim);
        run(&mut state, &mut local, &TickInput::default(), 120);

        assert!(state.is_lost());
        let losses: Vec<_> = local.presentation.losses().collect();
        assert_eq!(losses.len(), 1);
        assert!(losses[0].1, "expected a drowning");
        assert!(state.frog.y < state.tuning.frog.start_position.y - DROWN_DEPTH + 0.5);

        let submitted = local
            .scores
            .count(|e| matches!(e, ServiceEvent::Submitted(..)));
        assert_eq!(submitted, 4);
    }

    #[test]
    fn test_demo_bot_scores() {
        let mut state = GameState::new(6);
        let mut local = LocalServices::new();
        run(&mut state, &mut local, &demo(), 60 * 20);
        assert!(state.stats.final_score > 0);
        assert!(local.presentation.count(|e| matches!(e, ServiceEvent::ScoreChanged { .. })) > 0);
    }

    #[test]
    fn test_sinking_tile_loses_exactly_once() {
        let mut state = GameState::new(8);
        let mut local = LocalServices::new();
        let mut settled = false;
        for _ in 0..600 {
            tick(&mut state, &mut local.services(), &demo(), SIM_DT);
            if state.phase == GamePhase::Idle && state.attached.is_some() {
                settled = true;
                break;
            }
        }
        assert!(settled, "bot never landed");

        // Stand still until the tile goes under
        run(&mut state, &mut local, &TickInput::default(), 60 * 10);
        assert!(state.is_lost());
        assert_eq!(state.attached, None);
        let losses: Vec<_> = local.presentation.losses().collect();
        assert_eq!(losses.len(), 1);
        assert!(losses[0].1);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99999);
        let mut b = GameState::new(99999);
        let mut la = LocalServices::new();
        let mut lb = LocalServices::new();

        run(&mut a, &mut la, &demo(), 60 * 30);
        run(&mut b, &mut lb, &demo(), 60 * 30);

        assert_eq!(a.frog, b.frog);
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.phase, b.phase);
        assert_eq!(la.presentation.events, lb.presentation.events);
    }

    #[test]
    fn test_reset_cancels_flight() {
        let mut state = GameState::new(10);
        let mut local = LocalServices::new();
        // A flight that would splash down
        charge_and_release(&mut state, &mut local, 38, Vec3::new(2.5, 0.0, 1.0));
        run(&mut state, &mut local, &TickInput::default(), 5);
        assert!(matches!(state.phase, GamePhase::Airborne(_)));

        state.reset();
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.frog, state.tuning.frog.start_position);

        run(&mut state, &mut local, &TickInput::default(), 180);
        assert_eq!(local.presentation.losses().count(), 0);
        assert_eq!(state.phase, GamePhase::Idle);
    }

    #[test]
    fn test_exit_to_menu_stops_ticking() {
        let mut state = GameState::new(11);
        let mut local = LocalServices::new();
        charge_and_release(&mut state, &mut local, 20, Vec3::new(0.0, 0.0, 5.0));
        state.exit_to_menu();
        let frog = state.frog;
        let ticks = state.time_ticks;
        run(&mut state, &mut local, &demo(), 120);
        assert_eq!(state.frog, frog);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(local.presentation.losses().count(), 0);
    }

    #[test]
    fn test_pause_freezes() {
        let mut state = GameState::new(12);
        let mut local = LocalServices::new();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        run(&mut state, &mut local, &pause, 1);
        assert!(state.paused);
        let ticks = state.time_ticks;
        run(&mut state, &mut local, &demo(), 30);
        assert_eq!(state.time_ticks, ticks);

        run(&mut state, &mut local, &pause, 1);
        assert!(!state.paused);
        assert_eq!(state.time_ticks, ticks + 1);
    }

    #[test]
    fn test_asleep_event_once() {
        let mut state = GameState::new(13);
        let mut local = LocalServices::new();
        let ticks = (ASLEEP_IDLE_TIME / SIM_DT) as usize + 10;
        run(&mut state, &mut local, &TickInput::default(), ticks);
        state.reset();
        run(&mut state, &mut local, &TickInput::default(), ticks);
        let asleep = local
            .achievements
            .achievements()
            .filter(|a| *a == AchievementId::Asleep)
            .count();
        assert_eq!(asleep, 1);
    }

    #[test]
    fn test_trigger_loss_is_idempotent() {
        let mut state = GameState::new(14);
        trigger_loss(&mut state, true);
        trigger_loss(&mut state, false);
        assert!(matches!(state.phase, GamePhase::Lost(LossSequence { drowned: true, .. })));
    }
}
