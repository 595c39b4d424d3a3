// Game error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log a game error with structured context
pub fn log_game_error(err: &GameError, context: &str) {
    error!(
        "Game error in {}: code={}, component=JudgementEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Judgement-engine errors
///
/// Error code range: 2001-2002
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// tick() or key_press() called before a schedule was committed
    ScheduleNotCommitted,

    /// The shared game lock was poisoned
    StatePoisoned,
}

impl ErrorCode for GameError {
    fn code(&self) -> i32 {
        match self {
            GameError::ScheduleNotCommitted => 2001,
            GameError::StatePoisoned => 2002,
        }
    }

    fn message(&self) -> String {
        match self {
            GameError::ScheduleNotCommitted => {
                "No note schedule committed. Call commit_schedule() first.".to_string()
            }
            GameError::StatePoisoned => "Game state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GameError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for GameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_codes() {
        assert_eq!(GameError::ScheduleNotCommitted.code(), 2001);
        assert_eq!(GameError::StatePoisoned.code(), 2002);
    }

    #[test]
    fn test_game_error_messages() {
        assert!(GameError::ScheduleNotCommitted
            .message()
            .contains("commit_schedule"));
        assert!(GameError::StatePoisoned.message().contains("poisoned"));
    }

    #[test]
    fn test_log_helper_does_not_panic() {
        log_game_error(&GameError::ScheduleNotCommitted, "unit-test");
    }
}
