// Burst detection over sorted beat timestamps
//
// A burst is a run of three or more beats each separated by at most the
// burst threshold; shorter runs degrade to regular beats. Burst members
// get a fixed lane cycle so rapid rolls stay playable, while regular
// beats go through the weighted assignment path.

/// Indices of beats grouped by timing character
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingPatterns {
    /// Runs of >= 3 rapid beats, as indices into the sorted beat list
    pub bursts: Vec<Vec<usize>>,
    /// Indices of all remaining beats
    pub regular: Vec<usize>,
}

/// Scan consecutive gaps and split beats into bursts and regular beats.
///
/// # Arguments
/// * `beats` - Sorted, ascending beat timestamps in seconds
/// * `burst_threshold` - Maximum gap in seconds inside a burst
pub fn analyze_beat_timing(beats: &[f64], burst_threshold: f64) -> TimingPatterns {
    let mut patterns = TimingPatterns::default();
    let mut run: Vec<usize> = Vec::new();

    for i in 0..beats.len() {
        if run.is_empty() {
            run.push(i);
        }

        let continues = i + 1 < beats.len() && beats[i + 1] - beats[i] <= burst_threshold;
        if continues {
            run.push(i + 1);
        } else {
            if run.len() >= 3 {
                patterns.bursts.push(std::mem::take(&mut run));
            } else {
                patterns.regular.append(&mut run);
            }
        }
    }

    patterns
}
