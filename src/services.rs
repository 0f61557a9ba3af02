//! Outbound collaborator hooks
//!
//! The simulation calls out through these traits and never waits on them.
//! Achievements, leaderboards and presentation live outside the core.

use crate::SessionStats;
use crate::persistence::{MemoryStore, PersistentStore};

/// One-shot event achievements the core awards directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementId {
    /// Jumped off a sinking tile moments before going under
    QuickFeet,
    /// Landed on the off-screen copy of a tile
    SixthSense,
    /// Sat idle long enough to doze off
    Asleep,
    /// Hopped back onto the beach after leaving it
    IPreferTheBeach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardId {
    HighScores,
    LeapStreak,
    LeapScore,
    HighestDifficulty,
}

pub trait AchievementService {
    /// A persisted record changed; re-evaluate progress achievements
    fn record_progress(&mut self);
    fn record_event(&mut self, id: AchievementId);
}

pub trait ScoreService {
    fn submit(&mut self, board: LeaderboardId, value: i64);
}

pub trait Presentation {
    fn on_score_changed(&mut self, score: i64, delta: i64, was_perfect: bool);
    fn on_streak_changed(&mut self, streak: u32, reset: bool);
    fn on_loss(&mut self, stats: &SessionStats, drowned: bool);
}

/// Collaborators handed to each tick
pub struct Services<'a> {
    pub achievements: &'a mut dyn AchievementService,
    pub scores: &'a mut dyn ScoreService,
    pub presentation: &'a mut dyn Presentation,
    pub store: &'a mut dyn PersistentStore,
}

/// Everything a collaborator was told, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    Progress,
    Achievement(AchievementId),
    Submitted(LeaderboardId, i64),
    ScoreChanged {
        score: i64,
        delta: i64,
        was_perfect: bool,
    },
    StreakChanged {
        streak: u32,
        reset: bool,
    },
    Loss {
        stats: SessionStats,
        drowned: bool,
    },
}

/// Collaborator that logs and remembers every call
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<ServiceEvent>,
}

impl EventLog {
    pub fn count(&self, pred: impl Fn(&ServiceEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn achievements(&self) -> impl Iterator<Item = AchievementId> + '_ {
        self.events.iter().filter_map(|e| match e {
            ServiceEvent::Achievement(id) => Some(*id),
            _ => None,
        })
    }

    pub fn losses(&self) -> impl Iterator<Item = (&SessionStats, bool)> + '_ {
        self.events.iter().filter_map(|e| match e {
            ServiceEvent::Loss { stats, drowned } => Some((stats, *drowned)),
            _ => None,
        })
    }
}

impl AchievementService for EventLog {
    fn record_progress(&mut self) {
        self.events.push(ServiceEvent::Progress);
    }

    fn record_event(&mut self, id: AchievementId) {
        log::info!("Achievement: {id:?}");
        self.events.push(ServiceEvent::Achievement(id));
    }
}

impl ScoreService for EventLog {
    fn submit(&mut self, board: LeaderboardId, value: i64) {
        log::debug!("Submit {board:?} = {value}");
        self.events.push(ServiceEvent::Submitted(board, value));
    }
}

impl Presentation for EventLog {
    fn on_score_changed(&mut self, score: i64, delta: i64, was_perfect: bool) {
        log::debug!("Score {score} (+{delta}){}", if was_perfect { " perfect" } else { "" });
        self.events.push(ServiceEvent::ScoreChanged {
            score,
            delta,
            was_perfect,
        });
    }

    fn on_streak_changed(&mut self, streak: u32, reset: bool) {
        self.events.push(ServiceEvent::StreakChanged { streak, reset });
    }

    fn on_loss(&mut self, stats: &SessionStats, drowned: bool) {
        self.events.push(ServiceEvent::Loss {
            stats: stats.clone(),
            drowned,
        });
    }
}

/// Owned collaborator set for headless runs and tests
#[derive(Debug, Default)]
pub struct LocalServices<S = MemoryStore> {
    pub achievements: EventLog,
    pub scores: EventLog,
    pub presentation: EventLog,
    pub store: S,
}

impl LocalServices {
    /// Collaborators backed by a volatile store
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: PersistentStore> LocalServices<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            achievements: EventLog::default(),
            scores: EventLog::default(),
            presentation: EventLog::default(),
            store,
        }
    }

    pub fn services(&mut self) -> Services<'_> {
        Services {
            achievements: &mut self.achievements,
            scores: &mut self.scores,
            presentation: &mut self.presentation,
            store: &mut self.store,
        }
    }
}
