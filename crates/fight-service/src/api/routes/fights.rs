use axum::{
    extract::{Path, State},
    response::ErrorResponse,
    Json,
};
use fight_core::{Fight, FightView};
use log::error;
use std::sync::Arc;
use time::OffsetDateTime;

use crate::{
    api::JsonBody,
    domain::{BetPlaced, BetRequest, Caller, VoteRequest},
    startup::AppState,
};

// No upstream traffic, shapes whatever snapshot the client posts
pub async fn preview_fight(
    State(state): State<Arc<AppState>>,
    JsonBody(fight): JsonBody<Fight>,
) -> Json<FightView> {
    Json(state.fights.preview(&fight, OffsetDateTime::now_utc()).await)
}

pub async fn get_fight(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<FightView>, ErrorResponse> {
    state
        .fights
        .get_fight_view(&post_id, &caller, OffsetDateTime::now_utc())
        .await
        .map(Json)
        .map_err(|e| {
            error!("error getting fight {}: {}", post_id, e);
            e.into()
        })
}

pub async fn cast_vote(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<VoteRequest>,
) -> Result<Json<FightView>, ErrorResponse> {
    state
        .fights
        .cast_vote(&post_id, &body, &caller, OffsetDateTime::now_utc())
        .await
        .map(Json)
        .map_err(|e| {
            error!("error voting on fight {}: {}", post_id, e);
            e.into()
        })
}

pub async fn place_bet(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<BetRequest>,
) -> Result<Json<BetPlaced>, ErrorResponse> {
    state
        .fights
        .place_bet(&post_id, &body, &caller, OffsetDateTime::now_utc())
        .await
        .map(Json)
        .map_err(|e| {
            error!("error placing bet on fight {}: {}", post_id, e);
            e.into()
        })
}
