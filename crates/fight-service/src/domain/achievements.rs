//! Achievement progress.
//!
//! Action sites (votes, bets, comments) only publish [`ProgressEvent`]s on the
//! [`AchievementBus`]. The [`AchievementTracker`] is the single subscriber: it owns
//! the definitions, the per-user counters and the unlock rule, and reports
//! unlocks to the backend. Nothing else needs a handle on achievement state.

use async_channel::{Receiver, Sender, TrySendError};
use itertools::Itertools;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
};
use tokio_util::sync::CancellationToken;

use crate::infra::backend::GeekFightsApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressKind {
    FightCreated,
    Voting,
    Betting,
    Commenting,
    PostLiked,
    SocialInteraction,
    DailyLogin,
    TournamentWon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub user_id: String,
    pub kind: ProgressKind,
    pub amount: u64,
}

impl ProgressEvent {
    pub fn new(user_id: impl Into<String>, kind: ProgressKind, amount: u64) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub xp: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ProgressKind,
    /// `None` unlocks on the first event of `kind`
    pub requirement: Option<u64>,
    pub reward: Reward,
    pub rarity: Rarity,
}

pub const ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        id: "first_fight",
        name: "First Blood",
        description: "Create your first fight",
        kind: ProgressKind::FightCreated,
        requirement: None,
        reward: Reward { xp: 50, points: 10 },
        rarity: Rarity::Common,
    },
    AchievementDefinition {
        id: "fight_creator",
        name: "Fight Master",
        description: "Create 10 fights",
        kind: ProgressKind::FightCreated,
        requirement: Some(10),
        reward: Reward { xp: 200, points: 50 },
        rarity: Rarity::Rare,
    },
    AchievementDefinition {
        id: "first_vote",
        name: "Voice of the Crowd",
        description: "Vote in your first fight",
        kind: ProgressKind::Voting,
        requirement: None,
        reward: Reward { xp: 25, points: 5 },
        rarity: Rarity::Common,
    },
    AchievementDefinition {
        id: "ballot_box",
        name: "Ballot Box",
        description: "Vote in 100 fights",
        kind: ProgressKind::Voting,
        requirement: Some(100),
        reward: Reward { xp: 250, points: 50 },
        rarity: Rarity::Uncommon,
    },
    AchievementDefinition {
        id: "high_roller",
        name: "High Roller",
        description: "Place 25 bets",
        kind: ProgressKind::Betting,
        requirement: Some(25),
        reward: Reward { xp: 150, points: 30 },
        rarity: Rarity::Uncommon,
    },
    AchievementDefinition {
        id: "tournament_winner",
        name: "Champion",
        description: "Win your first tournament",
        kind: ProgressKind::TournamentWon,
        requirement: None,
        reward: Reward { xp: 500, points: 100 },
        rarity: Rarity::Legendary,
    },
    AchievementDefinition {
        id: "popular_post",
        name: "Viral",
        description: "Get 100 likes on a post",
        kind: ProgressKind::PostLiked,
        requirement: Some(100),
        reward: Reward { xp: 150, points: 30 },
        rarity: Rarity::Uncommon,
    },
    AchievementDefinition {
        id: "comment_king",
        name: "Chatterbox",
        description: "Write 50 comments",
        kind: ProgressKind::Commenting,
        requirement: Some(50),
        reward: Reward { xp: 100, points: 20 },
        rarity: Rarity::Common,
    },
    AchievementDefinition {
        id: "social_butterfly",
        name: "Social Butterfly",
        description: "Interact with 25 other users",
        kind: ProgressKind::SocialInteraction,
        requirement: Some(25),
        reward: Reward { xp: 100, points: 20 },
        rarity: Rarity::Uncommon,
    },
    AchievementDefinition {
        id: "daily_streak_7",
        name: "Week Warrior",
        description: "Log in for 7 consecutive days",
        kind: ProgressKind::DailyLogin,
        requirement: Some(7),
        reward: Reward { xp: 200, points: 40 },
        rarity: Rarity::Uncommon,
    },
    AchievementDefinition {
        id: "daily_streak_30",
        name: "Dedication",
        description: "Log in for 30 consecutive days",
        kind: ProgressKind::DailyLogin,
        requirement: Some(30),
        reward: Reward { xp: 1000, points: 200 },
        rarity: Rarity::Legendary,
    },
];

/// Body of `POST /api/achievements/unlock`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementUnlock {
    pub user_id: String,
    pub achievement_id: String,
    pub reward: Reward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub progress: u64,
    pub requirement: Option<u64>,
    pub percentage: u32,
    pub unlocked: bool,
}

/// Share of the requirement reached, capped at 100. Requirement-less
/// achievements are all or nothing, so they always read 100.
pub fn progress_percentage(definition: &AchievementDefinition, progress: u64) -> u32 {
    match definition.requirement {
        None | Some(0) => 100,
        Some(requirement) => {
            let pct = (progress as u128 * 100) / requirement as u128;
            pct.min(100) as u32
        }
    }
}

pub fn achievement_channel(capacity: usize) -> (AchievementBus, Receiver<ProgressEvent>) {
    let (sender, receiver) = async_channel::bounded(capacity.max(1));
    (AchievementBus { sender }, receiver)
}

/// Publisher handle, cheap to clone into every action site
#[derive(Clone)]
pub struct AchievementBus {
    sender: Sender<ProgressEvent>,
}

impl AchievementBus {
    /// Never waits; when the channel is full the event is dropped
    pub fn publish(&self, event: ProgressEvent) {
        match self.sender.try_send(event) {
            Ok(_) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    "achievement channel full, dropping {:?} for user {}",
                    event.kind, event.user_id
                );
            }
            Err(TrySendError::Closed(event)) => {
                debug!(
                    "achievement tracker stopped, dropping {:?} for user {}",
                    event.kind, event.user_id
                );
            }
        }
    }
}

#[derive(Default)]
struct UserProgress {
    counters: HashMap<ProgressKind, u64>,
    unlocked: HashSet<&'static str>,
}

/// Per-user counters, shared between the tracker and the read api
#[derive(Default)]
pub struct ProgressBook {
    users: RwLock<HashMap<String, UserProgress>>,
}

impl ProgressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the user's counters and return the achievements it unlocks.
    ///
    /// With a requirement, the event that first reaches it unlocks; without one,
    /// the first event of that kind does.
    pub fn record(&self, event: &ProgressEvent) -> Vec<&'static AchievementDefinition> {
        if event.amount == 0 {
            return vec![];
        }

        let mut users = match self.users.write() {
            Ok(users) => users,
            Err(poisoned) => poisoned.into_inner(),
        };
        let user = users.entry(event.user_id.clone()).or_default();
        let counter = user.counters.entry(event.kind).or_insert(0);
        let previous = *counter;
        let current = previous.saturating_add(event.amount);
        *counter = current;

        let unlocked: Vec<&'static AchievementDefinition> = ACHIEVEMENTS
            .iter()
            .filter(|definition| definition.kind == event.kind)
            .filter(|definition| !user.unlocked.contains(definition.id))
            .filter(|definition| match definition.requirement {
                Some(requirement) => previous < requirement && current >= requirement,
                None => previous == 0,
            })
            .collect();

        for definition in &unlocked {
            user.unlocked.insert(definition.id);
        }
        unlocked
    }

    pub fn progress_for(&self, user_id: &str) -> Vec<AchievementProgress> {
        let users = match self.users.read() {
            Ok(users) => users,
            Err(poisoned) => poisoned.into_inner(),
        };
        let user = users.get(user_id);

        ACHIEVEMENTS
            .iter()
            .map(|definition| {
                let progress = user
                    .and_then(|u| u.counters.get(&definition.kind).copied())
                    .unwrap_or(0);
                let unlocked = user.is_some_and(|u| u.unlocked.contains(definition.id));
                AchievementProgress {
                    id: definition.id,
                    name: definition.name,
                    rarity: definition.rarity,
                    progress,
                    requirement: definition.requirement,
                    percentage: match (unlocked, definition.requirement) {
                        (true, _) => 100,
                        (false, None) => 0,
                        (false, Some(_)) => progress_percentage(definition, progress),
                    },
                    unlocked,
                }
            })
            .collect()
    }
}

pub struct AchievementTracker {
    api: Arc<dyn GeekFightsApi>,
    book: Arc<ProgressBook>,
    events: Receiver<ProgressEvent>,
    cancel_token: CancellationToken,
}

impl AchievementTracker {
    pub fn new(
        api: Arc<dyn GeekFightsApi>,
        book: Arc<ProgressBook>,
        events: Receiver<ProgressEvent>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            api,
            book,
            events,
            cancel_token,
        }
    }

    pub async fn watch(&self) -> Result<(), anyhow::Error> {
        info!("Starting achievement tracker");

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Ok(event) => self.handle(event).await,
                    Err(_) => {
                        info!("Achievement channel closed");
                        break;
                    }
                },
                _ = self.cancel_token.cancelled() => {
                    info!("Achievement tracker received cancellation");
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn handle(&self, event: ProgressEvent) {
        debug!(
            "progress {:?} +{} for user {}",
            event.kind, event.amount, event.user_id
        );

        let unlocked = self.book.record(&event);
        if !unlocked.is_empty() {
            info!(
                "user {} unlocked {}",
                event.user_id,
                unlocked.iter().map(|definition| definition.id).join(", ")
            );
        }

        for definition in unlocked {
            let unlock = AchievementUnlock {
                user_id: event.user_id.clone(),
                achievement_id: definition.id.to_string(),
                reward: definition.reward,
            };
            if let Err(e) = self.api.unlock_achievement(&unlock).await {
                error!(
                    "error reporting achievement {} for user {}: {}",
                    definition.id, event.user_id, e
                );
            }
        }
    }
}
