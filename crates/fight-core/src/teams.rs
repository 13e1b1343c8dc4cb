use serde_json::Value;

use crate::{Fight, RawTeam, TeamDescriptor, TeamMember};

/// Ordered teams of a fight.
///
/// `fight.teams` is used as-is when it has entries. Otherwise the legacy
/// `teamA`/`teamB` pair is used, with missing sides becoming empty teams, so
/// the result always has at least the two panels a renderer expects.
pub fn extract_teams(fight: &Fight) -> Vec<TeamDescriptor> {
    if let Some(teams) = fight.teams.as_ref().filter(|teams| !teams.is_empty()) {
        return teams.iter().map(team_from_raw).collect();
    }

    [fight.team_a.as_ref(), fight.team_b.as_ref()]
        .into_iter()
        .map(|raw| raw.map(team_from_raw).unwrap_or_default())
        .collect()
}

pub fn team_from_raw(raw: &RawTeam) -> TeamDescriptor {
    let members = match raw {
        RawTeam::Text(text) => split_team_members(text)
            .into_iter()
            .map(TeamMember::named)
            .collect(),
        RawTeam::Members(entries) => entries.iter().filter_map(member_from_value).collect(),
        RawTeam::Other(_) => vec![],
    };
    TeamDescriptor { members }
}

/// Split "Name, Other Name" on top-level commas.
///
/// Commas inside parentheses belong to the name: `"Agent (Unit 4,000), X"` is
/// two members, not three. Names are trimmed and empty pieces dropped.
pub fn split_team_members(raw: &str) -> Vec<String> {
    let mut members = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;

    for ch in raw.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                push_trimmed(&mut members, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_trimmed(&mut members, &current);

    members
}

fn push_trimmed(members: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        members.push(trimmed.to_owned());
    }
}

/// Member entries have been written under several field names over time
fn member_from_value(entry: &Value) -> Option<TeamMember> {
    if let Value::String(name) = entry {
        let name = name.trim();
        return (!name.is_empty()).then(|| TeamMember::named(name));
    }

    let character = entry.get("character");
    let name = first_text(&[
        entry.get("name"),
        entry.get("characterName"),
        character.and_then(|c| c.get("name")),
        character.and_then(|c| c.get("characterName")),
    ])?;
    let image = first_text(&[
        entry.get("image"),
        entry.get("characterImage"),
        entry.get("customImage"),
        character.and_then(|c| c.get("image")),
    ]);

    Some(TeamMember { name, image })
}

fn first_text(candidates: &[Option<&Value>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .filter_map(|value| value.as_str())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_owned)
}
