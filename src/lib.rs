// Beatforge Core - chart generation and judgement engine
// Onset analysis, lane distribution and real-time scoring for a
// four-lane rhythm game

// Module declarations
pub mod analysis;
pub mod config;
pub mod distributor;
pub mod error;
pub mod game;
pub mod schedule;

// Re-exports for convenience
pub use analysis::{AnalysisOutcome, AnalysisProgress, ProgressSpan, TrackAnalyzer};
pub use config::{AnalyzerConfig, AppConfig, DistributorConfig, JudgementConfig};
pub use distributor::NoteDistributor;
pub use error::{AnalysisError, ErrorCode, GameError};
pub use game::{GamePhase, JudgementEngine, SharedGame};
pub use schedule::{Lane, LaneTimes, Note, NoteSchedule};
