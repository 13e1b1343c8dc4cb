//! Voting and betting windows
//!
//! All checks take `now` from the caller so they can be evaluated against any clock.

use serde_json::Value;
use time::{
    format_description::well_known::{Iso8601, Rfc3339},
    Duration, OffsetDateTime,
};

use crate::{Fight, FightStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTime {
    /// No time limit
    Absent,
    At(OffsetDateTime),
    /// Present but unreadable, treated as already locked
    Invalid,
}

/// Read `lockTime` as an RFC 3339 / ISO 8601 string or epoch milliseconds.
/// An empty string counts as absent, same as a missing field.
pub fn parse_lock_time(value: Option<&Value>) -> LockTime {
    match value {
        None | Some(Value::Null) => LockTime::Absent,
        Some(Value::String(raw)) if raw.trim().is_empty() => LockTime::Absent,
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            OffsetDateTime::parse(raw, &Rfc3339)
                .or_else(|_| OffsetDateTime::parse(raw, &Iso8601::DEFAULT))
                .map(LockTime::At)
                .unwrap_or(LockTime::Invalid)
        }
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|millis| {
                OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).ok()
            })
            .map(LockTime::At)
            .unwrap_or(LockTime::Invalid),
        Some(_) => LockTime::Invalid,
    }
}

impl Fight {
    pub fn lock(&self) -> LockTime {
        parse_lock_time(self.lock_time.as_ref())
    }
}

/// Whether a vote may be cast at `now`.
///
/// Locked and completed fights are closed whatever their lock time says. A
/// lock time that has passed closes an active fight before its status
/// catches up; an unreadable one closes it outright. No lock time means no limit.
pub fn is_voting_open(fight: &Fight, now: OffsetDateTime) -> bool {
    if fight.status.as_ref().is_some_and(FightStatus::is_terminal) {
        return false;
    }
    match fight.lock() {
        LockTime::Absent => true,
        LockTime::At(lock_time) => now < lock_time,
        LockTime::Invalid => false,
    }
}

/// Whether a bet may be placed at `now`.
///
/// Stricter than voting: bets need a settlement point, so a readable future
/// lock time is required, and any status other than `active` closes betting.
pub fn is_betting_eligible(fight: &Fight, now: OffsetDateTime) -> bool {
    if fight
        .status
        .as_ref()
        .is_some_and(|status| *status != FightStatus::Active)
    {
        return false;
    }
    matches!(fight.lock(), LockTime::At(lock_time) if now < lock_time)
}

/// Time left until the lock, zero once it has passed. `None` without a readable lock time.
pub fn time_remaining(fight: &Fight, now: OffsetDateTime) -> Option<Duration> {
    match fight.lock() {
        LockTime::At(lock_time) => Some((lock_time - now).max(Duration::ZERO)),
        _ => None,
    }
}
