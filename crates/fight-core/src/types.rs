//! Fight snapshot as served by the posts API
//!
//! The upstream has shipped several shapes for the same data over time, so every
//! field here deserializes leniently: a field of the wrong type degrades to its
//! empty value instead of rejecting the whole post.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Fight data embedded in a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    /// Author-ordered teams, two or more
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<RawTeam>>,
    /// Legacy two-team shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_a: Option<RawTeam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_b: Option<RawTeam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<FightVotes>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub votes_hidden: bool,
    /// RFC 3339 string or epoch milliseconds, parsed on use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FightStatus>,
    /// Requesting user's earlier choice in any historical encoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<Value>,
}

/// A team as stored upstream: either "Name, Other Name" or a list of member entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTeam {
    Text(String),
    Members(Vec<Value>),
    Other(Value),
}

impl From<&str> for RawTeam {
    fn from(value: &str) -> Self {
        RawTeam::Text(value.to_owned())
    }
}

/// Vote counters. Values stay raw JSON until tallied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightVotes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_a: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_b: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw: Option<Value>,
    /// Index-keyed counters (`"0"`, `"1"`, ...)
    #[serde(flatten)]
    pub by_index: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FightStatus {
    Active,
    Locked,
    Completed,
    Other(String),
}

impl FightStatus {
    /// Locked and completed fights never accept votes again
    pub fn is_terminal(&self) -> bool {
        matches!(self, FightStatus::Locked | FightStatus::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FightStatus::Active => "active",
            FightStatus::Locked => "locked",
            FightStatus::Completed => "completed",
            FightStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for FightStatus {
    fn from(value: &str) -> Self {
        match value {
            "active" => FightStatus::Active,
            "locked" => FightStatus::Locked,
            "completed" => FightStatus::Completed,
            other => FightStatus::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for FightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FightStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FightStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(raw) => FightStatus::from(raw.as_str()),
            other => FightStatus::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl TeamMember {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDescriptor {
    pub members: Vec<TeamMember>,
}

impl TeamDescriptor {
    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Post envelope returned by `GET /api/posts/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fight: Option<Fight>,
}

impl Post {
    /// Prefers `id`, falling back to the Mongo `_id`
    pub fn id(&self) -> Option<String> {
        [self.id.as_ref(), self.mongo_id.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::String(raw) if !raw.is_empty() => Some(raw.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }
}

/// Reads a JSON counter the way the upstream writes them: integers, integral
/// floats or numeric strings. Anything else counts as zero.
pub fn count_from_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(number)) => number.as_u64().unwrap_or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(|f| f.trunc() as u64)
                .unwrap_or(0)
        }),
        Some(Value::String(raw)) => raw.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}
