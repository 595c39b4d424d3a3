// Distributor module - deterministic lane assignment pipeline
//
// This module redistributes a flat, time-sorted list of beat timestamps
// across the four lanes. It is independent of how the beats were
// produced: detected onsets and hand-written charts go through the same
// pipeline.
//
// Four ordered passes:
// 1. Burst detection (timing.rs)
// 2. Initial lane assignment (burst cycles + weighted repeat/switch)
// 3. Pattern synthesis (patterns.rs)
// 4. Global rebalancing toward the target distribution (balance.rs)
//
// All randomness comes from the seeded generator (rng.rs), so the same
// input and seed reproduce bit-identical output.

use std::collections::VecDeque;

use crate::config::DistributorConfig;
use crate::schedule::{Lane, LaneTimes};

pub mod balance;
pub mod patterns;
pub mod rng;
pub mod timing;

use rng::SeededRng;
use timing::TimingPatterns;

/// Probability of repeating the previous lane for a regular beat
const REPEAT_PROBABILITY: f64 = 0.4;

/// NoteDistributor assigns lanes to beat timestamps
///
/// The generator's seed state is owned exclusively by one distributor
/// instance; no locking is required.
pub struct NoteDistributor {
    config: DistributorConfig,
    rng: SeededRng,
    recent_lanes: VecDeque<Lane>,
}

impl NoteDistributor {
    /// Create a distributor with the given configuration.
    pub fn new(config: DistributorConfig) -> Self {
        let rng = SeededRng::new(config.seed);
        Self {
            config,
            rng,
            recent_lanes: VecDeque::new(),
        }
    }

    /// Distribute beat timestamps across the four lanes.
    ///
    /// The input is sorted first; output lanes are time-ascending
    /// and together hold exactly the input count.
    pub fn distribute(&mut self, beat_times: &[f64]) -> LaneTimes {
        let mut beats = beat_times.to_vec();
        beats.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut result = LaneTimes::default();
        if beats.is_empty() {
            return result;
        }

        let timing_patterns = timing::analyze_beat_timing(&beats, self.config.burst_threshold);
        tracing::debug!(
            "[NoteDistributor] {} beats: {} bursts, {} regular",
            beats.len(),
            timing_patterns.bursts.len(),
            timing_patterns.regular.len()
        );

        let mut lanes = self.assign_initial_lanes(beats.len(), &timing_patterns);
        patterns::apply_musical_patterns(
            &mut lanes,
            &self.config,
            &mut self.rng,
            &mut self.recent_lanes,
        );
        balance::balance_distribution(&mut lanes, &self.config);

        for (&time, &lane) in beats.iter().zip(lanes.iter()) {
            result.push(lane, time);
        }
        result
    }

    /// Re-run the full pipeline over an existing per-lane dictionary.
    ///
    /// Used to post-process live-detected onsets: the dictionary is
    /// flattened to a single sorted timestamp list and redistributed.
    pub fn rebalance_existing(&mut self, notes: &LaneTimes) -> LaneTimes {
        self.distribute(&notes.flattened_sorted())
    }

    /// Pass 2: bursts get the fixed lane cycle, regular beats a weighted
    /// repeat-or-switch pick capped at `max_consecutive_same_lane`.
    fn assign_initial_lanes(&mut self, beat_count: usize, patterns: &TimingPatterns) -> Vec<Lane> {
        let mut lanes: Vec<Option<Lane>> = vec![None; beat_count];

        for burst in &patterns.bursts {
            for (i, &beat_index) in burst.iter().enumerate() {
                lanes[beat_index] =
                    Some(self.config.burst_lane_pattern[i % self.config.burst_lane_pattern.len()]);
            }
        }

        let mut last: Option<Lane> = None;
        let mut consecutive = 0u32;
        for &index in &patterns.regular {
            if lanes[index].is_some() {
                continue;
            }

            let lane = match last {
                Some(prev)
                    if consecutive < self.config.max_consecutive_same_lane
                        && self.rng.next_f64() < REPEAT_PROBABILITY =>
                {
                    consecutive += 1;
                    prev
                }
                _ => {
                    let available: Vec<Lane> = Lane::ALL
                        .iter()
                        .copied()
                        .filter(|&lane| Some(lane) != last)
                        .collect();
                    let pick = available[(self.rng.next_f64() * available.len() as f64) as usize];
                    consecutive = 1;
                    pick
                }
            };

            lanes[index] = Some(lane);
            last = Some(lane);
        }

        // Every index is either burst or regular; the fallback pick
        // keeps the function total if that ever changes
        lanes
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Lane::ALL[(self.rng.next_f64() * 4.0) as usize])
            })
            .collect()
    }
}
