//! Session statistics and durable records
//!
//! Stats accumulate during a run. At the score screen they are folded into
//! the persistent records and posted to the leaderboards.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistentStore, keys};
use crate::services::{LeaderboardId, ScoreService};

/// Per-run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub final_score: i64,
    /// Difficulty tier when the run ended
    pub highest_difficulty: u32,
    pub highest_leap_streak: u32,
    /// Best single-landing reward
    pub highest_leap_score: i64,
    pub highest_near_miss_streak: u32,
    pub bugs_eaten: u32,
    pub fireflies_eaten: u32,
}

impl SessionStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Which records a committed session improved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub new_high_score: bool,
    pub new_near_miss_record: bool,
}

/// Fold end-of-run stats into the persistent records
///
/// Leap streak, leap score and difficulty records are written as they happen
/// during play; this handles the rest.
pub fn commit_records(stats: &SessionStats, store: &mut dyn PersistentStore) -> RecordUpdate {
    let update = RecordUpdate {
        new_high_score: store.set_max(keys::HIGH_SCORE, stats.final_score),
        new_near_miss_record: store.set_max(
            keys::RECORD_NEAR_MISS_STREAK,
            i64::from(stats.highest_near_miss_streak),
        ),
    };
    store.add_int(keys::TOTAL_BUGS_EATEN, i64::from(stats.bugs_eaten));
    store.add_int(keys::FIREFLIES_EATEN, i64::from(stats.fireflies_eaten));

    if update.new_high_score {
        log::info!("New high score: {}", stats.final_score);
    }
    update
}

/// Post the run to every leaderboard
pub fn submit_leaderboards(stats: &SessionStats, scores: &mut dyn ScoreService) {
    scores.submit(LeaderboardId::HighScores, stats.final_score);
    scores.submit(LeaderboardId::LeapStreak, i64::from(stats.highest_leap_streak));
    scores.submit(LeaderboardId::LeapScore, stats.highest_leap_score);
    scores.submit(LeaderboardId::HighestDifficulty, i64::from(stats.highest_difficulty));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::services::{EventLog, ServiceEvent};

    fn stats(score: i64) -> SessionStats {
        SessionStats {
            final_score: score,
            highest_difficulty: 2,
            highest_leap_streak: 3,
            highest_leap_score: 40,
            highest_near_miss_streak: 2,
            bugs_eaten: 5,
            fireflies_eaten: 1,
        }
    }

    #[test]
    fn test_commit_records_keeps_best_and_totals() {
        let mut store = MemoryStore::new();
        let first = commit_records(&stats(100), &mut store);
        assert!(first.new_high_score);
        assert!(first.new_near_miss_record);

        let second = commit_records(&stats(50), &mut store);
        assert!(!second.new_high_score);
        assert!(!second.new_near_miss_record);

        assert_eq!(store.get_int(keys::HIGH_SCORE, 0), 100);
        assert_eq!(store.get_int(keys::TOTAL_BUGS_EATEN, 0), 10);
        assert_eq!(store.get_int(keys::FIREFLIES_EATEN, 0), 2);
    }

    #[test]
    fn test_submit_all_boards() {
        let mut log = EventLog::default();
        submit_leaderboards(&stats(77), &mut log);
        assert_eq!(
            log.events,
            vec![
                ServiceEvent::Submitted(LeaderboardId::HighScores, 77),
                ServiceEvent::Submitted(LeaderboardId::LeapStreak, 3),
                ServiceEvent::Submitted(LeaderboardId::LeapScore, 40),
                ServiceEvent::Submitted(LeaderboardId::HighestDifficulty, 2),
            ]
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = stats(10);
        s.reset();
        assert_eq!(s, SessionStats::default());
    }
}
