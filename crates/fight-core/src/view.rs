use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    compute_percentage, compute_total_votes, compute_vote_counts, extract_teams,
    is_betting_eligible, is_voting_open, resolve_winner, time_remaining, Fight, FightStatus,
    TeamMember, VoteKey, Winner,
};

/// Everything a renderer needs for one fight, computed once
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FightView {
    pub teams: Vec<TeamView>,
    pub votes_hidden: bool,
    /// `None` on hidden fights
    pub draw: Option<Tally>,
    pub total_votes: u64,
    pub my_vote: Option<VoteKey>,
    pub voting_open: bool,
    pub betting_eligible: bool,
    pub seconds_remaining: Option<i64>,
    pub status: Option<FightStatus>,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub key: VoteKey,
    pub members: Vec<TeamMember>,
    /// `None` on hidden fights
    pub tally: Option<Tally>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub votes: u64,
    pub percentage: u32,
}

impl FightView {
    pub fn build(fight: &Fight, now: OffsetDateTime) -> Self {
        let counts = compute_vote_counts(fight);
        let total_votes = compute_total_votes(fight);
        let hidden = fight.votes_hidden;
        let tally = |votes: u64| {
            (!hidden).then(|| Tally {
                votes,
                percentage: compute_percentage(votes, total_votes),
            })
        };

        let teams = extract_teams(fight)
            .into_iter()
            .enumerate()
            .map(|(index, team)| TeamView {
                key: VoteKey::Team(index),
                members: team.members,
                tally: tally(counts.team(index)),
            })
            .collect();

        Self {
            teams,
            votes_hidden: hidden,
            draw: tally(counts.draw),
            total_votes,
            my_vote: fight.my_vote.as_ref().and_then(VoteKey::from_value),
            voting_open: is_voting_open(fight, now),
            betting_eligible: is_betting_eligible(fight, now),
            seconds_remaining: time_remaining(fight, now).map(|d| d.whole_seconds()),
            status: fight.status.clone(),
            winner: resolve_winner(fight),
        }
    }
}
