// Chart statistics - aggregate numbers reported with a finished chart
//
// Computed once after analysis/distribution and handed to the caller
// alongside the note dictionary: totals, per-lane shares, density and a
// coarse difficulty label.

use serde::{Deserialize, Serialize};

use crate::schedule::{Lane, LaneTimes};

/// Coarse difficulty label derived from note density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Label for a notes-per-minute density.
    pub fn from_notes_per_minute(npm: u32) -> Self {
        match npm {
            0..=59 => Difficulty::Easy,
            60..=119 => Difficulty::Medium,
            120..=199 => Difficulty::Hard,
            _ => Difficulty::Expert,
        }
    }

    /// Display label.
    pub fn display_name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

/// Aggregate statistics for a generated chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartStats {
    /// Total note count across all lanes
    pub total_notes: usize,
    /// Per-lane note counts in lane order
    pub notes_by_lane: [usize; 4],
    /// Per-lane share as rounded integer percentages
    pub distribution_percent: [u32; 4],
    /// Time of the last note in seconds
    pub duration_secs: f64,
    /// Rounded note density
    pub notes_per_minute: u32,
    /// Density-derived difficulty label
    pub difficulty: Difficulty,
}

impl ChartStats {
    /// Compute statistics for a note dictionary.
    pub fn from_lane_times(times: &LaneTimes) -> Self {
        let notes_by_lane = times.counts();
        let total_notes: usize = notes_by_lane.iter().sum();

        let mut distribution_percent = [0u32; 4];
        if total_notes > 0 {
            for (i, &count) in notes_by_lane.iter().enumerate() {
                distribution_percent[i] =
                    ((count as f64 / total_notes as f64) * 100.0).round() as u32;
            }
        }

        let duration_secs = Lane::ALL
            .iter()
            .flat_map(|&lane| times.lane(lane).iter().copied())
            .fold(0.0, f64::max);

        let notes_per_minute = if duration_secs > 0.0 {
            ((total_notes as f64 / duration_secs) * 60.0).round() as u32
        } else {
            0
        };

        Self {
            total_notes,
            notes_by_lane,
            distribution_percent,
            duration_secs,
            notes_per_minute,
            difficulty: Difficulty::from_notes_per_minute(notes_per_minute),
        }
    }
}
