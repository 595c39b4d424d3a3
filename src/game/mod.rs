// Game module - fixed-timestep judgement engine
//
// The engine consumes a committed note schedule and a stream of key
// presses, driven by an external host loop calling tick(current_time)
// once per simulation step. It owns the per-lane note queues and the
// scoring state; rendering only ever sees copies.
//
// State machine: Idle -> Running -> Ended. Running begins when a
// schedule is committed; Ended once the clock passes the schedule's end
// time plus the hit window; no way back to Running without a reset.

use std::sync::{Arc, Mutex};

use crate::config::JudgementConfig;
use crate::error::GameError;
use crate::schedule::{Lane, NoteSchedule};

pub mod judge;
pub mod state;

pub use judge::Rating;
pub use state::JudgementState;

/// Lifecycle phase of the judgement engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Running,
    Ended,
}

/// JudgementEngine advances notes, detects misses and judges presses
pub struct JudgementEngine {
    config: JudgementConfig,
    phase: GamePhase,
    schedule: NoteSchedule,
    total_notes: usize,
    end_time: f64,
    state: JudgementState,
}

impl JudgementEngine {
    /// Create an engine in the Idle phase.
    pub fn new(config: JudgementConfig) -> Self {
        Self {
            config,
            phase: GamePhase::Idle,
            schedule: NoteSchedule::default(),
            total_notes: 0,
            end_time: 0.0,
            state: JudgementState::default(),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Read-only scoring state.
    pub fn state(&self) -> &JudgementState {
        &self.state
    }

    /// Remaining notes in one lane.
    pub fn pending_notes(&self, lane: Lane) -> usize {
        self.schedule.lane(lane).len()
    }

    /// Commit a schedule and enter the Running phase.
    ///
    /// Scoring state is reset; lanes are sorted so the per-lane
    /// monotonicity invariant holds from commit time on.
    pub fn commit_schedule(&mut self, mut schedule: NoteSchedule) {
        for lane in Lane::ALL {
            schedule
                .lane_mut(lane)
                .make_contiguous()
                .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        }

        self.total_notes = schedule.total_notes();
        self.end_time = schedule.end_time();
        self.schedule = schedule;
        self.state.reset();
        self.phase = GamePhase::Running;

        tracing::info!(
            "[JudgementEngine] Schedule committed: {} notes, ends at {:.2}s",
            self.total_notes,
            self.end_time
        );
    }

    /// Return to Idle, dropping the schedule and scoring state.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.schedule = NoteSchedule::default();
        self.total_notes = 0;
        self.end_time = 0.0;
        self.state.reset();
    }

    /// Advance the simulation to `current_time`.
    ///
    /// Recomputes every note's projected position, compacts notes past
    /// the miss threshold and applies at most one combo break for the
    /// whole tick regardless of how many notes were dropped.
    pub fn tick(&mut self, current_time: f64) -> Result<(), GameError> {
        match self.phase {
            GamePhase::Idle => return Err(GameError::ScheduleNotCommitted),
            GamePhase::Ended => return Ok(()),
            GamePhase::Running => {}
        }

        let config = self.config.clone();
        let mut missed = 0usize;
        let mut expired = 0usize;

        for lane in Lane::ALL {
            let queue = self.schedule.lane_mut(lane);
            for note in queue.iter_mut() {
                note.y = config.hit_line_offset
                    + (current_time - note.time) * config.position_scale * note.speed;
            }
            queue.retain(|note| {
                if note.y > config.miss_threshold {
                    if note.y >= config.miss_max_threshold {
                        // Single-tick jump straight past the expiry
                        // window; counted with the regular misses
                        expired += 1;
                    }
                    missed += 1;
                    false
                } else {
                    true
                }
            });
        }

        if missed > 0 {
            // Simultaneous misses count as a single combo break
            self.state.record_miss();
            tracing::debug!(
                "[JudgementEngine] {} note(s) missed at {:.3}s ({} expired), combo reset from {}",
                missed,
                current_time,
                expired,
                self.state.last_combo
            );
        }

        if current_time > self.end_time + config.hit_window {
            self.phase = GamePhase::Ended;
            tracing::info!(
                "[JudgementEngine] Run ended: score {}, max combo {}",
                self.state.score,
                self.state.max_combo
            );
        }

        Ok(())
    }

    /// Judge a key press on `lane` at `press_time`.
    ///
    /// Only the earliest pending note in the lane is eligible. A press
    /// with no eligible note (empty lane, or the note outside the hit
    /// window) is a no-op, never an error.
    ///
    /// # Returns
    /// * `Ok(Some(Rating))` - the press matched a note
    /// * `Ok(None)` - no-op press
    /// * `Err(GameError)` - no schedule committed yet
    pub fn key_press(&mut self, lane: Lane, press_time: f64) -> Result<Option<Rating>, GameError> {
        match self.phase {
            GamePhase::Idle => return Err(GameError::ScheduleNotCommitted),
            GamePhase::Ended => return Ok(None),
            GamePhase::Running => {}
        }

        let queue = self.schedule.lane_mut(lane);
        let Some(front) = queue.front() else {
            return Ok(None);
        };

        let time_diff = (press_time - front.time).abs();
        if time_diff >= self.config.hit_window {
            return Ok(None);
        }

        queue.pop_front();
        let rating = judge::classify(time_diff);
        let score_increase = judge::score_for(rating, self.total_notes);
        self.state.record_hit(rating, score_increase);

        tracing::debug!(
            "[JudgementEngine] {} on {} (diff {:.3}s, +{} score, combo {})",
            rating.display_name(),
            lane.key(),
            time_diff,
            score_increase,
            self.state.combo
        );

        Ok(Some(rating))
    }
}

/// Thread-tolerant wrapper around the engine
///
/// One exclusive lock is held for the duration of a single tick or a
/// single key-press handler, never across tick boundaries, so a host
/// embedding the engine across threads cannot stall its render loop on
/// the judgement state.
#[derive(Clone)]
pub struct SharedGame {
    inner: Arc<Mutex<JudgementEngine>>,
}

impl SharedGame {
    pub fn new(config: JudgementConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JudgementEngine::new(config))),
        }
    }

    pub fn commit_schedule(&self, schedule: NoteSchedule) -> Result<(), GameError> {
        self.lock()?.commit_schedule(schedule);
        Ok(())
    }

    pub fn tick(&self, current_time: f64) -> Result<(), GameError> {
        self.lock()?.tick(current_time)
    }

    pub fn key_press(&self, lane: Lane, press_time: f64) -> Result<Option<Rating>, GameError> {
        self.lock()?.key_press(lane, press_time)
    }

    /// Copy of the scoring state for rendering.
    pub fn state_snapshot(&self) -> Result<JudgementState, GameError> {
        Ok(self.lock()?.state().clone())
    }

    pub fn phase(&self) -> Result<GamePhase, GameError> {
        Ok(self.lock()?.phase())
    }

    pub fn reset(&self) -> Result<(), GameError> {
        self.lock()?.reset();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, JudgementEngine>, GameError> {
        self.inner.lock().map_err(|_| GameError::StatePoisoned)
    }
}
