use fight_core::{
    fixed_odds, potential_winnings, validate_bet, validate_vote, Fight, FightView, Post, VoteKey,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;

use super::{AchievementBus, Caller, CharacterCache, Error, ProgressEvent, ProgressKind};
use crate::infra::backend::{BetReceipt, GeekFightsApi};

const MAX_POST_ID_LEN: usize = 64;

/// Body of a vote submission; `team` may be any historical encoding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub team: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    #[serde(alias = "predictedWinner")]
    pub prediction: Value,
    #[serde(alias = "betAmount")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetPlaced {
    pub prediction: VoteKey,
    pub amount: u64,
    pub odds: f64,
    pub potential_winnings: u64,
    #[serde(flatten)]
    pub receipt: BetReceipt,
}

pub struct FightService {
    api: Arc<dyn GeekFightsApi>,
    characters: Arc<CharacterCache>,
    achievements: AchievementBus,
}

impl FightService {
    pub fn new(
        api: Arc<dyn GeekFightsApi>,
        characters: Arc<CharacterCache>,
        achievements: AchievementBus,
    ) -> Self {
        Self {
            api,
            characters,
            achievements,
        }
    }

    /// Shape a snapshot the caller already holds; only the character list is fetched
    pub async fn preview(&self, fight: &Fight, now: OffsetDateTime) -> FightView {
        self.with_images(FightView::build(fight, now)).await
    }

    pub async fn get_fight_view(
        &self,
        post_id: &str,
        caller: &Caller,
        now: OffsetDateTime,
    ) -> Result<FightView, Error> {
        let fight = self.load_fight(post_id, caller).await?;
        Ok(self.with_images(FightView::build(&fight, now)).await)
    }

    /// Fill member images the post left out from the character list.
    /// A failed character load leaves them empty.
    async fn with_images(&self, mut view: FightView) -> FightView {
        let missing = view
            .teams
            .iter_mut()
            .flat_map(|team| team.members.iter_mut())
            .filter(|member| member.image.is_none());
        for member in missing {
            match self.characters.image_for(&member.name).await {
                Ok(image) => member.image = image,
                Err(e) => {
                    warn!("character images unavailable: {}", e);
                    break;
                }
            }
        }
        view
    }

    pub async fn load_fight(&self, post_id: &str, caller: &Caller) -> Result<Fight, Error> {
        validate_post_id(post_id)?;
        let post: Post = self.api.get_post(post_id, caller).await?;
        post.fight
            .ok_or_else(|| Error::NotFound(format!("post {} is not a fight", post_id)))
    }

    pub async fn cast_vote(
        &self,
        post_id: &str,
        request: &VoteRequest,
        caller: &Caller,
        now: OffsetDateTime,
    ) -> Result<FightView, Error> {
        let choice = request
            .team
            .as_ref()
            .and_then(VoteKey::from_value)
            .ok_or_else(|| Error::BadRequest(String::from("missing vote choice")))?;

        let fight = self.load_fight(post_id, caller).await?;
        validate_vote(&fight, &choice, now)?;

        self.api.submit_fight_vote(post_id, &choice, caller).await?;
        info!("vote {} recorded on post {}", choice, post_id);
        self.record_progress(caller, ProgressKind::Voting);

        match self.get_fight_view(post_id, caller, now).await {
            Ok(view) => Ok(view),
            Err(e) => {
                warn!(
                    "vote on post {} accepted but refetch failed, serving local view: {}",
                    post_id, e
                );
                let mut view = self.with_images(FightView::build(&fight, now)).await;
                view.my_vote = Some(choice);
                Ok(view)
            }
        }
    }

    pub async fn place_bet(
        &self,
        post_id: &str,
        request: &BetRequest,
        caller: &Caller,
        now: OffsetDateTime,
    ) -> Result<BetPlaced, Error> {
        if caller.token.is_none() {
            return Err(Error::Unauthorized(String::from(
                "betting requires a signed in user",
            )));
        }
        let prediction = VoteKey::from_value(&request.prediction)
            .ok_or_else(|| Error::BadRequest(String::from("missing prediction")))?;

        let fight = self.load_fight(post_id, caller).await?;
        validate_bet(&fight, &prediction, request.amount, now)?;

        let receipt = self
            .api
            .place_bet(post_id, &prediction, request.amount, caller)
            .await?;
        let odds = fixed_odds(&prediction);
        info!(
            "bet of {} on {} placed for post {} at {}",
            request.amount, prediction, post_id, odds
        );
        self.record_progress(caller, ProgressKind::Betting);

        Ok(BetPlaced {
            potential_winnings: potential_winnings(request.amount, odds),
            prediction,
            amount: request.amount,
            odds,
            receipt,
        })
    }

    fn record_progress(&self, caller: &Caller, kind: ProgressKind) {
        match &caller.user_id {
            Some(user_id) => self
                .achievements
                .publish(ProgressEvent::new(user_id.clone(), kind, 1)),
            None => debug!("no user id on request, skipping {:?} progress", kind),
        }
    }
}

fn validate_post_id(post_id: &str) -> Result<(), Error> {
    let valid = !post_id.is_empty()
        && post_id.len() <= MAX_POST_ID_LEN
        && post_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::BadRequest(format!("invalid post id: {:?}", post_id)))
    }
}
