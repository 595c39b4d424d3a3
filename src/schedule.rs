// Schedule types - lanes, notes and per-lane timing containers
//
// This module defines the data handed across the UI boundary: the four
// fixed input lanes, the per-lane timestamp dictionary produced by the
// analyzer and the distributor, and the committed note schedule consumed
// by the judgement engine.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Lead-in applied when converting raw timestamps into a playable schedule.
pub const SCHEDULE_LEAD_IN_SECS: f64 = 2.0;

/// One of the four fixed input lanes.
///
/// Lanes map to frequency content by convention (bass, low-mid, high-mid,
/// treble). The lane count is fixed at four and never generalized.
///
/// Serde names follow the `t1`..`t4` keys of the note-dictionary JSON
/// format shared with the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    #[serde(rename = "t1")]
    T1,
    #[serde(rename = "t2")]
    T2,
    #[serde(rename = "t3")]
    T3,
    #[serde(rename = "t4")]
    T4,
}

impl Lane {
    /// All lanes in display order.
    pub const ALL: [Lane; 4] = [Lane::T1, Lane::T2, Lane::T3, Lane::T4];

    /// Zero-based lane index (0..4).
    pub fn index(self) -> usize {
        match self {
            Lane::T1 => 0,
            Lane::T2 => 1,
            Lane::T3 => 2,
            Lane::T4 => 3,
        }
    }

    /// Lane for a zero-based index.
    ///
    /// # Returns
    /// * `Some(Lane)` - for indices 0..4
    /// * `None` - otherwise
    pub fn from_index(index: usize) -> Option<Lane> {
        Lane::ALL.get(index).copied()
    }

    /// Note-dictionary key for this lane (`t1`..`t4`).
    pub fn key(self) -> &'static str {
        match self {
            Lane::T1 => "t1",
            Lane::T2 => "t2",
            Lane::T3 => "t3",
            Lane::T4 => "t4",
        }
    }
}

/// A single scheduled note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Nominal hit time in seconds from game start
    pub time: f64,
    /// Projected screen position, recomputed by the judgement engine
    /// every tick
    pub y: f64,
    /// Per-note scroll speed multiplier
    pub speed: f64,
}

impl Note {
    /// Create a note at `time` with neutral position and unit speed.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            y: 0.0,
            speed: 1.0,
        }
    }
}

/// Per-lane timestamp lists in seconds.
///
/// This is the note-dictionary currency between the analyzer and the
/// distributor, serialized as `{"t1": [..], "t2": [..], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneTimes {
    pub t1: Vec<f64>,
    pub t2: Vec<f64>,
    pub t3: Vec<f64>,
    pub t4: Vec<f64>,
}

impl LaneTimes {
    /// Timestamps for one lane.
    pub fn lane(&self, lane: Lane) -> &[f64] {
        match lane {
            Lane::T1 => &self.t1,
            Lane::T2 => &self.t2,
            Lane::T3 => &self.t3,
            Lane::T4 => &self.t4,
        }
    }

    /// Mutable timestamps for one lane.
    pub fn lane_mut(&mut self, lane: Lane) -> &mut Vec<f64> {
        match lane {
            Lane::T1 => &mut self.t1,
            Lane::T2 => &mut self.t2,
            Lane::T3 => &mut self.t3,
            Lane::T4 => &mut self.t4,
        }
    }

    /// Append a timestamp to a lane.
    pub fn push(&mut self, lane: Lane, time: f64) {
        self.lane_mut(lane).push(time);
    }

    /// Total timestamp count across all lanes.
    pub fn total(&self) -> usize {
        Lane::ALL.iter().map(|&lane| self.lane(lane).len()).sum()
    }

    /// Per-lane counts in lane order.
    pub fn counts(&self) -> [usize; 4] {
        [
            self.t1.len(),
            self.t2.len(),
            self.t3.len(),
            self.t4.len(),
        ]
    }

    /// All timestamps flattened into a single ascending list.
    pub fn flattened_sorted(&self) -> Vec<f64> {
        let mut all: Vec<f64> = Lane::ALL
            .iter()
            .flat_map(|&lane| self.lane(lane).iter().copied())
            .collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        all
    }

    /// Sort every lane time-ascending.
    pub fn sort_lanes(&mut self) {
        for lane in Lane::ALL {
            self.lane_mut(lane)
                .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        }
    }
}

/// Committed per-lane note queues, time-ascending within each lane.
///
/// The judgement engine pops hit notes from the front of a lane and
/// compacts missed notes in place, so each lane is an index-based queue
/// rather than a plain vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteSchedule {
    pub t1: VecDeque<Note>,
    pub t2: VecDeque<Note>,
    pub t3: VecDeque<Note>,
    pub t4: VecDeque<Note>,
}

impl NoteSchedule {
    /// Notes for one lane.
    pub fn lane(&self, lane: Lane) -> &VecDeque<Note> {
        match lane {
            Lane::T1 => &self.t1,
            Lane::T2 => &self.t2,
            Lane::T3 => &self.t3,
            Lane::T4 => &self.t4,
        }
    }

    /// Mutable notes for one lane.
    pub fn lane_mut(&mut self, lane: Lane) -> &mut VecDeque<Note> {
        match lane {
            Lane::T1 => &mut self.t1,
            Lane::T2 => &mut self.t2,
            Lane::T3 => &mut self.t3,
            Lane::T4 => &mut self.t4,
        }
    }

    /// Build a schedule from raw per-lane timestamps.
    ///
    /// Each timestamp is offset by the fixed 2-second lead-in and lanes
    /// are sorted time-ascending, which upholds the per-lane monotonicity
    /// required at commit time.
    pub fn from_lane_times(times: &LaneTimes) -> Self {
        let mut schedule = Self::default();
        for lane in Lane::ALL {
            let queue = schedule.lane_mut(lane);
            for &time in times.lane(lane) {
                queue.push_back(Note::at(time + SCHEDULE_LEAD_IN_SECS));
            }
            queue
                .make_contiguous()
                .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        }
        schedule
    }

    /// Total remaining note count across all lanes.
    pub fn total_notes(&self) -> usize {
        Lane::ALL.iter().map(|&lane| self.lane(lane).len()).sum()
    }

    /// Whether every lane is empty.
    pub fn is_empty(&self) -> bool {
        self.total_notes() == 0
    }

    /// Nominal time of the last scheduled note, or 0.0 when empty.
    pub fn end_time(&self) -> f64 {
        Lane::ALL
            .iter()
            .flat_map(|&lane| self.lane(lane).iter().map(|note| note.time))
            .fold(0.0, f64::max)
    }

    /// Deterministic fallback schedule used when no chart is available.
    ///
    /// Generates 100 notes starting 3 seconds in, one every half beat,
    /// cycling through the lanes with occasional doubled notes.
    pub fn demo(bpm: u32) -> Self {
        let beat_time = 60.0 / bpm.max(1) as f64;
        let mut schedule = Self::default();

        for i in 0..100usize {
            let time = 3.0 + i as f64 * beat_time * 0.5;
            let lane = Lane::ALL[i % 4];
            schedule.lane_mut(lane).push_back(Note::at(time));

            // Doubled notes on a coarser grid
            if i % 8 == 0 {
                schedule.t3.push_back(Note::at(time + 0.1));
            }
            if i % 12 == 0 {
                schedule.t2.push_back(Note::at(time + 0.05));
            }
        }

        for lane in Lane::ALL {
            schedule
                .lane_mut(lane)
                .make_contiguous()
                .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        }
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_index_roundtrip() {
        for lane in Lane::ALL {
            assert_eq!(Lane::from_index(lane.index()), Some(lane));
        }
        assert_eq!(Lane::from_index(4), None);
    }

    #[test]
    fn test_lane_serde_names() {
        let json = serde_json::to_string(&Lane::T3).unwrap();
        assert_eq!(json, "\"t3\"");
        let lane: Lane = serde_json::from_str("\"t1\"").unwrap();
        assert_eq!(lane, Lane::T1);
    }

    #[test]
    fn test_from_lane_times_applies_lead_in_and_sorts() {
        let times = LaneTimes {
            t1: vec![1.5, 0.5],
            t2: vec![],
            t3: vec![2.0],
            t4: vec![],
        };
        let schedule = NoteSchedule::from_lane_times(&times);

        assert_eq!(schedule.t1.len(), 2);
        assert_eq!(schedule.t1[0].time, 0.5 + SCHEDULE_LEAD_IN_SECS);
        assert_eq!(schedule.t1[1].time, 1.5 + SCHEDULE_LEAD_IN_SECS);
        assert_eq!(schedule.t3[0].time, 2.0 + SCHEDULE_LEAD_IN_SECS);
        assert_eq!(schedule.total_notes(), 3);
    }

    #[test]
    fn test_end_time_tracks_last_note() {
        let times = LaneTimes {
            t1: vec![1.0],
            t2: vec![5.0],
            t3: vec![],
            t4: vec![3.0],
        };
        let schedule = NoteSchedule::from_lane_times(&times);
        assert_eq!(schedule.end_time(), 5.0 + SCHEDULE_LEAD_IN_SECS);
        assert_eq!(NoteSchedule::default().end_time(), 0.0);
    }

    #[test]
    fn test_demo_schedule_is_deterministic_and_sorted() {
        let a = NoteSchedule::demo(120);
        let b = NoteSchedule::demo(120);

        assert_eq!(a.total_notes(), b.total_notes());
        assert!(a.total_notes() > 100, "doubled notes should push past 100");

        for lane in Lane::ALL {
            let notes = a.lane(lane);
            for pair in notes.iter().zip(notes.iter().skip(1)) {
                assert!(pair.0.time <= pair.1.time, "lane must be time-ascending");
            }
            assert_eq!(
                notes.iter().map(|n| n.time).collect::<Vec<_>>(),
                b.lane(lane).iter().map(|n| n.time).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_flattened_sorted_merges_lanes() {
        let times = LaneTimes {
            t1: vec![3.0, 1.0],
            t2: vec![2.0],
            t3: vec![],
            t4: vec![0.5],
        };
        assert_eq!(times.flattened_sorted(), vec![0.5, 1.0, 2.0, 3.0]);
        assert_eq!(times.total(), 4);
    }
}
