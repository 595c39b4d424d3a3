// Pattern synthesis - musical lane motifs over assignment chunks
//
// The initial lane assignment is overwritten chunk by chunk with one of
// four motif families, chosen by independent random draws:
// - alternating two-lane (probability 0.3)
// - circular four-lane (0.3 of the remainder)
// - mirror eight-step (0.2 of the remainder)
// - weighted Markov walk over the transition table (remaining mass)
//
// The Markov branch down-weights lanes picked in the last three steps
// and carries a rolling window of the last ten selections across chunk
// boundaries, so consecutive Markov chunks stay varied.

use std::collections::VecDeque;

use crate::config::DistributorConfig;
use crate::distributor::rng::SeededRng;
use crate::schedule::Lane;

/// Chunks smaller than this keep their initial assignment
const MIN_CHUNK: usize = 3;

/// Lanes of the alternating motif
const ALTERNATING: [Lane; 2] = [Lane::T1, Lane::T3];

/// Lanes of the mirror motif
const MIRROR: [Lane; 8] = [
    Lane::T1,
    Lane::T2,
    Lane::T3,
    Lane::T4,
    Lane::T4,
    Lane::T3,
    Lane::T2,
    Lane::T1,
];

/// Decaying penalties applied to the last three Markov selections
const RECENT_PENALTIES: [f64; 3] = [0.8, 0.6, 0.4];

/// Size of the rolling recent-lane window
const RECENT_WINDOW: usize = 10;

/// Overwrite `lanes` chunk by chunk with synthesized motifs.
///
/// # Arguments
/// * `lanes` - Initial lane assignment, one entry per beat
/// * `config` - Pattern length and transition weights
/// * `rng` - The distributor's seeded generator
/// * `recent` - Rolling window of recent Markov selections, persisted
///   across calls by the owning distributor
pub fn apply_musical_patterns(
    lanes: &mut [Lane],
    config: &DistributorConfig,
    rng: &mut SeededRng,
    recent: &mut VecDeque<Lane>,
) {
    let pattern_length = config.pattern_length.max(1);

    let mut start = 0;
    while start < lanes.len() {
        let end = (start + pattern_length).min(lanes.len());
        if end - start >= MIN_CHUNK {
            synthesize_chunk(lanes, start, end, config, rng, recent);
        }
        start += pattern_length;
    }
}

fn synthesize_chunk(
    lanes: &mut [Lane],
    start: usize,
    end: usize,
    config: &DistributorConfig,
    rng: &mut SeededRng,
    recent: &mut VecDeque<Lane>,
) {
    if rng.next_f64() < 0.3 {
        // Alternating motif keyed on absolute beat parity
        for i in start..end {
            lanes[i] = ALTERNATING[i % ALTERNATING.len()];
        }
    } else if rng.next_f64() < 0.3 {
        // Circular walk through all four lanes
        for i in start..end {
            lanes[i] = Lane::ALL[(i - start) % Lane::ALL.len()];
        }
    } else if rng.next_f64() < 0.2 {
        // Mirror: up the lanes then back down
        for i in start..end {
            lanes[i] = MIRROR[(i - start) % MIRROR.len()];
        }
    } else {
        markov_walk(lanes, start, end, config, rng, recent);
    }
}

/// Weighted transition walk seeded from the chunk's first lane.
fn markov_walk(
    lanes: &mut [Lane],
    start: usize,
    end: usize,
    config: &DistributorConfig,
    rng: &mut SeededRng,
    recent: &mut VecDeque<Lane>,
) {
    let mut current = lanes[start];

    for i in start + 1..end {
        let mut weights = config.transition_weights[current.index()];

        // Penalize lanes that appeared very recently
        if recent.len() > 2 {
            for (j, &penalty) in RECENT_PENALTIES.iter().enumerate().take(recent.len()) {
                let lane = recent[recent.len() - 1 - j];
                weights[lane.index()] *= penalty;
            }
        }

        let total: f64 = weights.iter().sum();
        let mut value = rng.next_f64() * total;
        let mut selected = Lane::T1;
        for (idx, &weight) in weights.iter().enumerate() {
            value -= weight;
            if value <= 0.0 {
                selected = Lane::ALL[idx];
                break;
            }
        }

        lanes[i] = selected;
        current = selected;
        recent.push_back(selected);
        if recent.len() > RECENT_WINDOW {
            recent.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lanes: &mut [Lane], seed: u64) {
        let config = DistributorConfig {
            seed,
            ..DistributorConfig::default()
        };
        let mut rng = SeededRng::new(seed);
        let mut recent = VecDeque::new();
        apply_musical_patterns(lanes, &config, &mut rng, &mut recent);
    }

    #[test]
    fn test_small_tail_chunk_is_untouched() {
        // 10 beats with pattern_length 8: the 2-beat tail keeps its lanes
        let mut lanes = vec![Lane::T4; 10];
        run(&mut lanes, 12345);
        assert_eq!(lanes[8], Lane::T4);
        assert_eq!(lanes[9], Lane::T4);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let mut a = vec![Lane::T1; 64];
        let mut b = vec![Lane::T1; 64];
        run(&mut a, 999);
        run(&mut b, 999);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_usually_diverge() {
        let mut a = vec![Lane::T1; 64];
        let mut b = vec![Lane::T1; 64];
        run(&mut a, 1);
        run(&mut b, 2);
        assert_ne!(a, b, "different seeds should pick different motifs");
    }

    #[test]
    fn test_recent_window_is_bounded() {
        let config = DistributorConfig::default();
        let mut rng = SeededRng::new(4242);
        let mut recent = VecDeque::new();
        let mut lanes = vec![Lane::T2; 256];

        apply_musical_patterns(&mut lanes, &config, &mut rng, &mut recent);
        assert!(recent.len() <= RECENT_WINDOW);
    }

    #[test]
    fn test_markov_walk_respects_chunk_bounds() {
        let config = DistributorConfig::default();
        let mut rng = SeededRng::new(7);
        let mut recent = VecDeque::new();
        let mut lanes = vec![Lane::T4; 16];

        markov_walk(&mut lanes, 4, 8, &config, &mut rng, &mut recent);

        // Chunk head keeps its seed lane, outside stays untouched
        assert_eq!(lanes[4], Lane::T4);
        for i in (0..4).chain(8..16) {
            assert_eq!(lanes[i], Lane::T4, "index {} outside chunk changed", i);
        }
    }
}
