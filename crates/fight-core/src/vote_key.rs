//! Canonical vote keys
//!
//! Clients and old posts encode a choice as `"A"`, `"teamA"`, `"fighter1"`, `"0"`,
//! `"tie"` and so on. Everything is translated into a [`VoteKey`] at the boundary
//! and only compared in that form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

const TEAM_ZERO_ALIASES: [&str; 5] = ["a", "teama", "team a", "fighter1", "fighterone"];
const TEAM_ONE_ALIASES: [&str; 5] = ["b", "teamb", "team b", "fighter2", "fightertwo"];
const DRAW_ALIASES: [&str; 2] = ["draw", "tie"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteKey {
    /// Zero-based team position
    Team(usize),
    Draw,
    /// Passed through untouched so it can be reported back
    Unrecognized(String),
}

impl VoteKey {
    /// Label the betting endpoint still expects: `A`/`B` for the first two teams
    pub fn legacy_label(&self) -> String {
        match self {
            VoteKey::Team(0) => String::from("A"),
            VoteKey::Team(1) => String::from("B"),
            VoteKey::Team(index) => index.to_string(),
            VoteKey::Draw => String::from("draw"),
            VoteKey::Unrecognized(raw) => raw.clone(),
        }
    }

    /// Accepts JSON strings and numbers, as `myVote` arrives in both
    pub fn from_value(value: &Value) -> Option<VoteKey> {
        match value {
            Value::String(raw) => normalize_vote_key(raw),
            Value::Number(number) => normalize_vote_key(&number.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteKey::Team(index) => write!(f, "{}", index),
            VoteKey::Draw => f.write_str("draw"),
            VoteKey::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for VoteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoteKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        VoteKey::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("vote choice cannot be empty"))
    }
}

/// Translate any historical vote encoding into its canonical key.
///
/// Matching is case-insensitive and the first rule that applies wins:
/// team A aliases, team B aliases, draw aliases, then all-digit strings which
/// are re-read as an index (`"01"` becomes team 1). Empty input has no key.
pub fn normalize_vote_key(raw: &str) -> Option<VoteKey> {
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_lowercase();
    if TEAM_ZERO_ALIASES.contains(&lowered.as_str()) {
        return Some(VoteKey::Team(0));
    }
    if TEAM_ONE_ALIASES.contains(&lowered.as_str()) {
        return Some(VoteKey::Team(1));
    }
    if DRAW_ALIASES.contains(&lowered.as_str()) {
        return Some(VoteKey::Draw);
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = raw.parse::<usize>() {
            return Some(VoteKey::Team(index));
        }
    }

    Some(VoteKey::Unrecognized(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(normalize_vote_key("A"), Some(VoteKey::Team(0)));
        assert_eq!(normalize_vote_key("teamA"), Some(VoteKey::Team(0)));
        assert_eq!(normalize_vote_key("Team A"), Some(VoteKey::Team(0)));
        assert_eq!(normalize_vote_key("FighterOne"), Some(VoteKey::Team(0)));
        assert_eq!(normalize_vote_key("fighter2"), Some(VoteKey::Team(1)));
        assert_eq!(normalize_vote_key("teamb"), Some(VoteKey::Team(1)));
        assert_eq!(normalize_vote_key("TIE"), Some(VoteKey::Draw));
        assert_eq!(normalize_vote_key("draw"), Some(VoteKey::Draw));
    }

    #[test]
    fn test_empty_has_no_key() {
        assert_eq!(normalize_vote_key(""), None);
        assert_eq!(VoteKey::from_value(&Value::Null), None);
    }

    #[test]
    fn test_digit_strings_become_indices() {
        assert_eq!(normalize_vote_key("0"), Some(VoteKey::Team(0)));
        assert_eq!(normalize_vote_key("01"), Some(VoteKey::Team(1)));
        assert_eq!(normalize_vote_key("3"), Some(VoteKey::Team(3)));
        assert_eq!(VoteKey::from_value(&json!(2)), Some(VoteKey::Team(2)));
    }

    #[test]
    fn test_unknown_values_pass_through() {
        assert_eq!(
            normalize_vote_key("C"),
            Some(VoteKey::Unrecognized(String::from("C")))
        );
        assert_eq!(
            normalize_vote_key("-1"),
            Some(VoteKey::Unrecognized(String::from("-1")))
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "A", "b", "Team B", "fighterone", "FIGHTER2", "tie", "Draw", "0", "01", "007", "12",
            "C", "x y", " a ", "-1", "1.5",
        ];
        for input in inputs {
            let once = normalize_vote_key(input).unwrap();
            let twice = normalize_vote_key(&once.to_string()).unwrap();
            assert_eq!(once, twice, "normalizing {:?} twice changed the key", input);
        }
    }

    #[test]
    fn test_serde_uses_canonical_form() {
        let key: VoteKey = serde_json::from_value(json!("teamB")).unwrap();
        assert_eq!(key, VoteKey::Team(1));
        assert_eq!(serde_json::to_value(&key).unwrap(), json!("1"));
        assert_eq!(serde_json::to_value(VoteKey::Draw).unwrap(), json!("draw"));
        assert!(serde_json::from_value::<VoteKey>(json!("")).is_err());
    }

    #[test]
    fn test_legacy_label() {
        assert_eq!(VoteKey::Team(0).legacy_label(), "A");
        assert_eq!(VoteKey::Team(1).legacy_label(), "B");
        assert_eq!(VoteKey::Team(2).legacy_label(), "2");
        assert_eq!(VoteKey::Draw.legacy_label(), "draw");
    }
}
