//! Vote counts, totals, percentages and winners

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{count_from_value, extract_teams, Fight, FightStatus, FightVotes};

/// Index keys past this are treated as junk rather than allocated for
const MAX_INDEXED_TEAMS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    /// One entry per team, in team order
    pub teams: Vec<u64>,
    pub draw: u64,
}

impl VoteCounts {
    pub fn team(&self, index: usize) -> u64 {
        self.teams.get(index).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Team(usize),
    Draw,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Team(index) => write!(f, "{}", index),
            Winner::Draw => f.write_str("draw"),
        }
    }
}

impl Serialize for Winner {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-team and draw counts.
///
/// Team counts come from `votes.teams` by position when present, then from
/// index keys (`"0"`, `"1"`, ...), then from the legacy `teamA`/`teamB` pair.
/// The list is padded with zeros so every extracted team has a count.
pub fn compute_vote_counts(fight: &Fight) -> VoteCounts {
    let team_count = extract_teams(fight).len();
    let Some(votes) = fight.votes.as_ref() else {
        return VoteCounts {
            teams: vec![0; team_count],
            draw: 0,
        };
    };

    let mut teams: Vec<u64> = if let Some(positional) = votes.teams.as_ref() {
        positional
            .iter()
            .map(|value| count_from_value(Some(value)))
            .collect()
    } else if let Some(indexed) = indexed_counts(votes) {
        indexed
    } else {
        vec![
            count_from_value(votes.team_a.as_ref()),
            count_from_value(votes.team_b.as_ref()),
        ]
    };

    if teams.len() < team_count {
        teams.resize(team_count, 0);
    }

    VoteCounts {
        teams,
        draw: count_from_value(votes.draw.as_ref()),
    }
}

fn indexed_counts(votes: &FightVotes) -> Option<Vec<u64>> {
    let indexed: Vec<(usize, u64)> = votes
        .by_index
        .iter()
        .filter(|(key, _)| !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|(key, value)| {
            let index = key.parse::<usize>().ok()?;
            (index < MAX_INDEXED_TEAMS).then(|| (index, count_from_value(Some(value))))
        })
        .collect();

    let len = indexed.iter().map(|(index, _)| index + 1).max()?;
    let mut counts = vec![0u64; len];
    for (index, count) in indexed {
        counts[index] = counts[index].saturating_add(count);
    }
    Some(counts)
}

/// Sum of all team counts plus draws. Hidden fights always report zero so
/// the total cannot be used to back out the hidden split.
pub fn compute_total_votes(fight: &Fight) -> u64 {
    if fight.votes_hidden {
        return 0;
    }
    let counts = compute_vote_counts(fight);
    counts
        .teams
        .iter()
        .fold(counts.draw, |acc, count| acc.saturating_add(*count))
}

/// `count / total` as a whole percentage, rounding halves up.
///
/// A zero total yields 0 and the result never exceeds 100.
pub fn compute_percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count.min(total) as u128;
    let total = total as u128;
    ((200 * count + total) / (2 * total)) as u32
}

/// Final result of a locked or completed fight.
///
/// Active fights (or fights with no status) have no winner yet. The team with
/// the strictly highest count wins; a tie among the leaders, 0-0 included, is
/// a draw. Draw votes do not compete with team counts.
pub fn resolve_winner(fight: &Fight) -> Option<Winner> {
    if !fight.status.as_ref().is_some_and(FightStatus::is_terminal) {
        return None;
    }

    // positional counts past the last extracted team have nobody to name
    let team_count = extract_teams(fight).len();
    let counts = compute_vote_counts(fight);
    let contenders = &counts.teams[..team_count.min(counts.teams.len())];
    let top = contenders.iter().copied().max().unwrap_or(0);
    let mut leaders = contenders
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == top);

    match (leaders.next(), leaders.next()) {
        (Some((index, _)), None) => Some(Winner::Team(index)),
        _ => Some(Winner::Draw),
    }
}
