// Analysis module - offline DSP pipeline for chart generation
//
// This module orchestrates the full track sweep: PCM frames are fed
// through the feature extractor and onset detector, detected onsets are
// bucketed per lane, post-processed for minimum spacing and summarized
// into chart statistics.
//
// Architecture:
// - TrackAnalyzer: orchestrator owning the busy flag and progress channel
// - Pipeline: frames -> FeatureExtractor -> OnsetDetector -> LaneTimes
// - Output: AnalysisOutcome (note dictionary + ChartStats)

use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::schedule::{Lane, LaneTimes};

pub mod features;
pub mod onset;
pub mod stats;

use onset::OnsetDetector;
pub use onset::OnsetEvent;
pub use stats::{ChartStats, Difficulty};

/// Advisory progress update emitted during a track sweep
///
/// Percentages are scaled into the caller-supplied span so the analysis
/// can occupy a sub-range of a larger pipeline's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisProgress {
    /// Overall progress in percent (0-100)
    pub percent: u8,
}

/// Sub-range of an overall progress bar occupied by the frame sweep
#[derive(Debug, Clone, Copy)]
pub struct ProgressSpan {
    pub start: u8,
    pub end: u8,
}

impl Default for ProgressSpan {
    fn default() -> Self {
        // Decode (before) and post-processing (after) own the remainder
        Self { start: 10, end: 90 }
    }
}

/// Result of a completed track analysis
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisOutcome {
    /// Detected onsets bucketed per lane, min-spacing enforced
    pub notes: LaneTimes,
    /// Aggregate chart statistics
    pub stats: ChartStats,
}

/// TrackAnalyzer runs the onset-detection sweep over a whole track
///
/// At most one analysis runs per analyzer instance at a time; concurrent
/// calls fail fast with `AnalysisError::Busy` instead of queueing.
pub struct TrackAnalyzer {
    config: AnalyzerConfig,
    busy: AtomicBool,
    progress_tx: tokio::sync::broadcast::Sender<AnalysisProgress>,
}

impl TrackAnalyzer {
    /// Create a new TrackAnalyzer with the given configuration
    pub fn new(config: AnalyzerConfig) -> Self {
        let (progress_tx, _) = tokio::sync::broadcast::channel(64);
        Self {
            config,
            busy: AtomicBool::new(false),
            progress_tx,
        }
    }

    /// Subscribe to progress updates for subsequent analyses
    pub fn subscribe_progress(&self) -> tokio::sync::broadcast::Receiver<AnalysisProgress> {
        self.progress_tx.subscribe()
    }

    /// Progress updates as an async stream
    ///
    /// Lagged receivers skip ahead; progress is advisory telemetry, not
    /// part of correctness.
    pub fn progress_stream(&self) -> impl Stream<Item = AnalysisProgress> {
        BroadcastStream::new(self.progress_tx.subscribe()).filter_map(|item| match item {
            Ok(progress) => Some(progress),
            Err(BroadcastStreamRecvError::Lagged(_)) => None,
        })
    }

    /// Analyze a track with the default progress span
    ///
    /// # Arguments
    /// * `samples` - Mono PCM samples, borrowed read-only
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Ok(AnalysisOutcome)` - Per-lane note dictionary plus statistics
    /// * `Err(AnalysisError)` - Invalid input or re-entrant call
    pub fn analyze(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        self.analyze_with_span(samples, sample_rate, ProgressSpan::default())
    }

    /// Analyze a track, scaling sweep progress into `span`
    pub fn analyze_with_span(
        &self,
        samples: &[f32],
        sample_rate: u32,
        span: ProgressSpan,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: "sample rate must be non-zero".to_string(),
            });
        }
        if samples.len() < self.config.frame_size {
            return Err(AnalysisError::InvalidInput {
                reason: format!(
                    "track too short: {} samples, need at least {}",
                    samples.len(),
                    self.config.frame_size
                ),
            });
        }

        // Fail fast on re-entrant analysis; never queue or block
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AnalysisError::Busy);
        }

        let outcome = self.run_sweep(samples, sample_rate, span);

        self.busy.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    fn run_sweep(&self, samples: &[f32], sample_rate: u32, span: ProgressSpan) -> AnalysisOutcome {
        let frame_size = self.config.frame_size;
        let hop_size = self.config.hop_size.max(1);
        let num_frames = (samples.len() - frame_size) / hop_size;
        let span_width = span.end.saturating_sub(span.start);

        tracing::info!(
            "[TrackAnalyzer] Analyzing {:.2}s of audio at {} Hz ({} frames)",
            samples.len() as f64 / sample_rate as f64,
            sample_rate,
            num_frames
        );

        self.emit_progress(span.start);

        let mut detector = OnsetDetector::new(sample_rate, self.config.clone());
        let mut notes = LaneTimes::default();

        for i in 0..num_frames {
            if i % 100 == 0 && num_frames > 0 {
                let scaled =
                    span.start + ((i as f64 / num_frames as f64) * span_width as f64) as u8;
                self.emit_progress(scaled);
            }

            let frame_start = i * hop_size;
            let frame = &samples[frame_start..frame_start + frame_size];
            let frame_time = frame_start as f64 / sample_rate as f64;

            if let Some(event) = detector.process_frame(frame, frame_time) {
                notes.push(event.lane, event.time);
            }
        }

        self.emit_progress(span.end);

        post_process_notes(&mut notes, self.config.min_note_spacing);
        let stats = ChartStats::from_lane_times(&notes);

        if detector.degraded_frames() > 0 {
            tracing::warn!(
                "[TrackAnalyzer] {} frames used the fallback feature vector",
                detector.degraded_frames()
            );
        }
        tracing::info!(
            "[TrackAnalyzer] Detected {} notes ({} notes/min, {})",
            stats.total_notes,
            stats.notes_per_minute,
            stats.difficulty.display_name()
        );

        self.emit_progress(100);

        AnalysisOutcome { notes, stats }
    }

    fn emit_progress(&self, percent: u8) {
        let _ = self.progress_tx.send(AnalysisProgress { percent });
    }
}

/// Sort each lane and drop timestamps closer than `min_spacing` to the
/// previously kept one (greedy left-to-right filter).
fn post_process_notes(notes: &mut LaneTimes, min_spacing: f64) {
    notes.sort_lanes();
    for lane in Lane::ALL {
        let times = notes.lane_mut(lane);
        let mut kept: Vec<f64> = Vec::with_capacity(times.len());
        for &time in times.iter() {
            match kept.last() {
                Some(&prev) if time - prev < min_spacing => {}
                _ => kept.push(time),
            }
        }
        *times = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_input() {
        let analyzer = TrackAnalyzer::new(AnalyzerConfig::default());
        let err = analyzer.analyze(&[], 44100).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let analyzer = TrackAnalyzer::new(AnalyzerConfig::default());
        let samples = vec![0.0f32; 4096];
        let err = analyzer.analyze(&samples, 0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn test_concurrent_analysis_fails_fast() {
        let analyzer = TrackAnalyzer::new(AnalyzerConfig::default());
        analyzer.busy.store(true, Ordering::SeqCst);

        let samples = vec![0.0f32; 4096];
        let err = analyzer.analyze(&samples, 44100).unwrap_err();
        assert_eq!(err, AnalysisError::Busy);

        // A finished analysis releases the flag
        analyzer.busy.store(false, Ordering::SeqCst);
        assert!(analyzer.analyze(&samples, 44100).is_ok());
    }

    #[test]
    fn test_min_spacing_filter_is_greedy() {
        let mut notes = LaneTimes::default();
        notes.t1 = vec![0.0, 0.1, 0.25, 0.3, 0.6];
        post_process_notes(&mut notes, 0.2);

        // 0.0 kept; 0.1 dropped (gap 0.1); 0.25 kept (gap from 0.0);
        // 0.3 dropped (gap 0.05 from 0.25); 0.6 kept
        assert_eq!(notes.t1, vec![0.0, 0.25, 0.6]);
    }

    #[test]
    fn test_min_spacing_sorts_before_filtering() {
        let mut notes = LaneTimes::default();
        notes.t2 = vec![1.0, 0.5, 0.55];
        post_process_notes(&mut notes, 0.2);
        assert_eq!(notes.t2, vec![0.5, 1.0]);
    }

    #[test]
    fn test_silence_yields_empty_chart() {
        let analyzer = TrackAnalyzer::new(AnalyzerConfig::default());
        let samples = vec![0.0f32; 44100];
        let outcome = analyzer.analyze(&samples, 44100).unwrap();
        assert_eq!(outcome.stats.total_notes, 0);
    }

    #[test]
    fn test_progress_reaches_completion() {
        let analyzer = TrackAnalyzer::new(AnalyzerConfig::default());
        let mut rx = analyzer.subscribe_progress();

        let samples = vec![0.0f32; 44100];
        analyzer.analyze(&samples, 44100).unwrap();

        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            seen.push(update.percent);
        }
        assert!(!seen.is_empty());
        assert_eq!(*seen.last().unwrap(), 100);
        for pair in seen.windows(2) {
            assert!(pair[0] <= pair[1], "progress must be non-decreasing");
        }
    }
}
