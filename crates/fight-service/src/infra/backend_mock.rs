use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use async_trait::async_trait;
use fight_core::{
    count_from_value, fixed_odds, potential_winnings, Fight, FightVotes, Post, VoteKey,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

use super::backend::{BetReceipt, Character, Error, GeekFightsApi};
use crate::domain::{AchievementUnlock, Caller};

/// Starting eurodolary balance of every mock account
pub const STARTING_BALANCE: i64 = 1000;

/// In-memory stand-in for the GeekFights REST api, for local runs and tests
pub struct MockBackend {
    posts: Arc<RwLock<HashMap<String, Post>>>,
    votes: Arc<RwLock<HashMap<(String, String), VoteKey>>>,
    balances: Arc<RwLock<HashMap<String, i64>>>,
    characters: Arc<RwLock<Vec<Character>>>,
    unlocks: Arc<RwLock<Vec<AchievementUnlock>>>,
    character_fetches: AtomicUsize,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(HashMap::new())),
            balances: Arc::new(RwLock::new(HashMap::new())),
            characters: Arc::new(RwLock::new(vec![])),
            unlocks: Arc::new(RwLock::new(vec![])),
            character_fetches: AtomicUsize::new(0),
        }
    }

    /// A backend with one open fight (`demo-fight`) and a small roster
    pub fn seeded(now: OffsetDateTime) -> Self {
        let backend = Self::new();
        let lock_time = (now + Duration::days(1))
            .format(&Rfc3339)
            .unwrap_or_default();
        let fight: Fight = serde_json::from_value(json!({
            "teams": ["Goku", "Saitama, Genos", "Batman (Earth-1, 1939)"],
            "votes": { "teams": [12, 9, 4], "draw": 2 },
            "lockTime": lock_time,
            "status": "active",
        }))
        .unwrap_or_default();
        backend.insert_fight("demo-fight", "Who wins?", fight);
        backend.set_characters(vec![
            Character {
                name: String::from("Goku"),
                image: Some(String::from("/characters/goku.png")),
                universe: Some(String::from("Dragon Ball")),
            },
            Character {
                name: String::from("Saitama"),
                image: Some(String::from("/characters/saitama.png")),
                universe: Some(String::from("One Punch Man")),
            },
            Character {
                name: String::from("Genos"),
                image: None,
                universe: Some(String::from("One Punch Man")),
            },
        ]);
        backend
    }

    pub fn insert_fight(&self, post_id: &str, title: &str, fight: Fight) {
        let post = Post {
            mongo_id: Some(Value::String(post_id.to_owned())),
            title: Some(title.to_owned()),
            kind: Some(String::from("fight")),
            fight: Some(fight),
            ..Default::default()
        };
        self.insert_post(post_id, post);
    }

    pub fn insert_post(&self, post_id: &str, post: Post) {
        self.posts.write().unwrap().insert(post_id.to_owned(), post);
    }

    pub fn fight(&self, post_id: &str) -> Option<Fight> {
        self.posts
            .read()
            .unwrap()
            .get(post_id)
            .and_then(|post| post.fight.clone())
    }

    pub fn set_characters(&self, characters: Vec<Character>) {
        *self.characters.write().unwrap() = characters;
    }

    pub fn character_fetches(&self) -> usize {
        self.character_fetches.load(Ordering::SeqCst)
    }

    pub fn unlocks(&self) -> Vec<AchievementUnlock> {
        self.unlocks.read().unwrap().clone()
    }

    pub fn balance(&self, token: &str) -> i64 {
        self.balances
            .read()
            .unwrap()
            .get(token)
            .copied()
            .unwrap_or(STARTING_BALANCE)
    }

    pub fn reset(&self) {
        self.posts.write().unwrap().clear();
        self.votes.write().unwrap().clear();
        self.balances.write().unwrap().clear();
        self.characters.write().unwrap().clear();
        self.unlocks.write().unwrap().clear();
        self.character_fetches.store(0, Ordering::SeqCst);
    }
}

fn require_token(caller: &Caller) -> Result<&str, Error> {
    caller
        .token
        .as_deref()
        .ok_or_else(|| Error::Unauthorized(String::from("No token, authorization denied")))
}

fn increment(slot: &mut Option<Value>) {
    let next = count_from_value(slot.as_ref()).saturating_add(1);
    *slot = Some(Value::from(next));
}

/// Bump the counter for `choice` in whichever shape the post already stores
fn record_vote(votes: &mut FightVotes, choice: &VoteKey) {
    let index = match choice {
        VoteKey::Draw => return increment(&mut votes.draw),
        VoteKey::Team(index) => *index,
        VoteKey::Unrecognized(_) => return,
    };

    if let Some(teams) = votes.teams.as_mut() {
        if teams.len() <= index {
            teams.resize(index + 1, Value::from(0));
        }
        let next = count_from_value(Some(&teams[index])).saturating_add(1);
        teams[index] = Value::from(next);
    } else if votes.by_index.is_empty() && index < 2 {
        match index {
            0 => increment(&mut votes.team_a),
            _ => increment(&mut votes.team_b),
        }
    } else {
        let slot = votes.by_index.entry(index.to_string()).or_insert(Value::from(0));
        *slot = Value::from(count_from_value(Some(slot)).saturating_add(1));
    }
}

#[async_trait]
impl GeekFightsApi for MockBackend {
    async fn get_post(&self, post_id: &str, caller: &Caller) -> Result<Post, Error> {
        let mut post = self
            .posts
            .read()
            .unwrap()
            .get(post_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("post {} not found", post_id)))?;

        // myVote is per requester
        if let Some(fight) = post.fight.as_mut() {
            fight.my_vote = caller.token.as_ref().and_then(|token| {
                self.votes
                    .read()
                    .unwrap()
                    .get(&(post_id.to_owned(), token.clone()))
                    .map(|choice| Value::String(choice.to_string()))
            });
        }
        Ok(post)
    }

    async fn submit_fight_vote(
        &self,
        post_id: &str,
        choice: &VoteKey,
        caller: &Caller,
    ) -> Result<(), Error> {
        let token = require_token(caller)?;
        let voter = (post_id.to_owned(), token.to_owned());
        // held from the duplicate check until the vote is stored
        let mut votes = self.votes.write().unwrap();
        if votes.contains_key(&voter) {
            return Err(Error::BadRequest(String::from(
                "You have already voted on this fight",
            )));
        }

        let mut posts = self.posts.write().unwrap();
        let fight = posts
            .get_mut(post_id)
            .and_then(|post| post.fight.as_mut())
            .ok_or_else(|| Error::NotFound(format!("post {} not found", post_id)))?;
        record_vote(fight.votes.get_or_insert_with(FightVotes::default), choice);
        votes.insert(voter, choice.clone());
        Ok(())
    }

    async fn place_bet(
        &self,
        post_id: &str,
        prediction: &VoteKey,
        amount: u64,
        caller: &Caller,
    ) -> Result<BetReceipt, Error> {
        let token = require_token(caller)?;
        if !self.posts.read().unwrap().contains_key(post_id) {
            return Err(Error::NotFound(format!("fight {} not found", post_id)));
        }

        let mut balances = self.balances.write().unwrap();
        let balance = balances.entry(token.to_owned()).or_insert(STARTING_BALANCE);
        let stake = i64::try_from(amount).unwrap_or(i64::MAX);
        if stake > *balance {
            return Err(Error::BadRequest(String::from("Insufficient eurodolary")));
        }
        *balance -= stake;

        let odds = fixed_odds(prediction);
        Ok(BetReceipt {
            bet: json!({
                "fightId": post_id,
                "prediction": prediction.legacy_label(),
                "amount": amount,
                "odds": odds,
                "potentialWinnings": potential_winnings(amount, odds),
                "status": "pending",
            }),
            new_balance: Some(*balance),
        })
    }

    async fn get_characters(&self) -> Result<Vec<Character>, Error> {
        self.character_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.characters.read().unwrap().clone())
    }

    async fn unlock_achievement(&self, unlock: &AchievementUnlock) -> Result<(), Error> {
        self.unlocks.write().unwrap().push(unlock.clone());
        Ok(())
    }
}
