//! Frog-go headless runner
//!
//! Plays one session with the demo bot and prints the final stats.
//!
//! Usage: `frog-go [SEED] [TUNING_JSON] [RECORDS_JSON]`

#[cfg(not(target_arch = "wasm32"))]
use frog_go::consts::SIM_DT;
#[cfg(not(target_arch = "wasm32"))]
use frog_go::persistence::{JsonFileStore, MemoryStore, PersistentStore};
#[cfg(not(target_arch = "wasm32"))]
use frog_go::services::LocalServices;
#[cfg(not(target_arch = "wasm32"))]
use frog_go::sim::{GamePhase, GameState, TickInput, tick};
#[cfg(not(target_arch = "wasm32"))]
use frog_go::{SessionStats, Tuning};

/// Give up after ten simulated minutes
#[cfg(not(target_arch = "wasm32"))]
const MAX_TICKS: u64 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    log::info!("Frog-go (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::error!("Invalid seed: {e}");
            return std::process::ExitCode::FAILURE;
        }
        None => rand::random(),
    };

    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning: {e}");
                return std::process::ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let stats = match args.next() {
        Some(path) => match JsonFileStore::load(&path) {
            Ok(store) => {
                let mut services = LocalServices::with_store(store);
                let stats = play(seed, tuning, &mut services);
                if let Err(e) = services.store.flush() {
                    log::error!("Failed to save records: {e}");
                }
                stats
            }
            Err(e) => {
                log::error!("Failed to load records: {e}");
                return std::process::ExitCode::FAILURE;
            }
        },
        None => play(seed, tuning, &mut LocalServices::<MemoryStore>::new()),
    };

    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to print stats: {e}"),
    }
    std::process::ExitCode::SUCCESS
}

/// Run the demo bot until the score screen (or the tick cap)
#[cfg(not(target_arch = "wasm32"))]
fn play<S: PersistentStore>(seed: u64, tuning: Tuning, services: &mut LocalServices<S>) -> SessionStats {
    let mut state = GameState::with_tuning(seed, tuning);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    while state.time_ticks < MAX_TICKS {
        tick(&mut state, &mut services.services(), &input, SIM_DT);
        if matches!(state.phase, GamePhase::Lost(loss) if loss.reported) {
            break;
        }
    }
    log::info!(
        "Seed {seed}: score {} after {:.1}s, tier {}",
        state.stats.final_score,
        state.time_ticks as f32 * SIM_DT,
        state.difficulty_tier()
    );
    state.stats
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by the host; there is no standalone wasm binary
}
