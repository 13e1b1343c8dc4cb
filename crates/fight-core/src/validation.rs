//! Submission checks shared by the vote and bet endpoints

use time::OffsetDateTime;

use crate::{extract_teams, is_betting_eligible, is_voting_open, CoreError, Fight, VoteKey, MIN_BET};

/// Check that `choice` names something this fight can be voted or bet on
pub fn validate_choice(fight: &Fight, choice: &VoteKey) -> Result<(), CoreError> {
    match choice {
        VoteKey::Draw => Ok(()),
        VoteKey::Team(index) => {
            let team_count = extract_teams(fight).len();
            if *index < team_count {
                Ok(())
            } else {
                Err(CoreError::UnknownTeam {
                    index: *index,
                    team_count,
                })
            }
        }
        VoteKey::Unrecognized(raw) => Err(CoreError::InvalidVoteKey(raw.clone())),
    }
}

/// Validate a vote before forwarding it upstream
pub fn validate_vote(fight: &Fight, choice: &VoteKey, now: OffsetDateTime) -> Result<(), CoreError> {
    if !is_voting_open(fight, now) {
        return Err(CoreError::VotingClosed);
    }
    validate_choice(fight, choice)
}

/// Validate a bet before forwarding it upstream
pub fn validate_bet(
    fight: &Fight,
    prediction: &VoteKey,
    amount: u64,
    now: OffsetDateTime,
) -> Result<(), CoreError> {
    if !is_betting_eligible(fight, now) {
        return Err(CoreError::BettingClosed);
    }
    if amount < MIN_BET {
        return Err(CoreError::Validation(format!(
            "minimum bet is {} coin",
            MIN_BET
        )));
    }
    validate_choice(fight, prediction)
}
