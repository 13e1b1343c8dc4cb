//! Shared error types

use thiserror::Error;

/// Rejections produced when gating a vote or bet submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("voting is closed for this fight")]
    VotingClosed,

    #[error("betting is not open for this fight")]
    BettingClosed,

    #[error("unknown team index {index}, fight has {team_count} teams")]
    UnknownTeam { index: usize, team_count: usize },

    #[error("invalid vote choice: {0}")]
    InvalidVoteKey(String),
}
