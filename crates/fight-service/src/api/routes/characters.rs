use axum::{extract::State, response::ErrorResponse, Json};
use log::error;
use std::sync::Arc;

use crate::{infra::backend::Character, startup::AppState};

pub async fn get_characters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Character>>, ErrorResponse> {
    state
        .characters
        .get()
        .await
        .map(|characters| Json(characters.as_ref().clone()))
        .map_err(|e| {
            error!("error loading characters: {}", e);
            e.into()
        })
}
