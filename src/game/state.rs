// JudgementState - run-scoped score and combo bookkeeping
//
// Created at game start, mutated exclusively by the judgement engine,
// reset at game end. Upholds the combo invariants: combo resets to zero
// exactly on WORST/MISS, increments by one on PERFECT/GREAT/GOOD, and
// max_combo never falls below combo.

use serde::{Deserialize, Serialize};

use crate::game::judge::Rating;

/// Mutable scoring state for one play-through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgementState {
    /// Accumulated score
    pub score: u64,
    /// Current streak of combo-extending hits
    pub combo: u32,
    /// Highest combo reached this run
    pub max_combo: u32,
    /// Combo value captured the last time the combo broke
    pub last_combo: u32,
    /// Most recent rating shown to the player
    pub rating: Option<Rating>,
    pub perfect_count: u32,
    pub great_count: u32,
    pub good_count: u32,
    pub bad_count: u32,
    pub worst_count: u32,
    pub miss_count: u32,
}

impl JudgementState {
    /// Apply a judged key press.
    pub fn record_hit(&mut self, rating: Rating, score_increase: u64) {
        self.score += score_increase;

        if rating.increments_combo() {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        } else if rating.breaks_combo() {
            self.last_combo = self.combo;
            self.combo = 0;
        }

        self.bump_counter(rating);
        self.rating = Some(rating);
    }

    /// Apply the batched per-tick miss.
    pub fn record_miss(&mut self) {
        self.last_combo = self.combo;
        self.combo = 0;
        self.miss_count += 1;
        self.rating = Some(Rating::Miss);
    }

    /// Return to the initial state for a fresh run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn bump_counter(&mut self, rating: Rating) {
        match rating {
            Rating::Perfect => self.perfect_count += 1,
            Rating::Great => self.great_count += 1,
            Rating::Good => self.good_count += 1,
            Rating::Bad => self.bad_count += 1,
            Rating::Worst => self.worst_count += 1,
            Rating::Miss => self.miss_count += 1,
        }
    }
}
