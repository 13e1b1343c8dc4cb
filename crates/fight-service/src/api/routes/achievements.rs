use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{domain::AchievementProgress, startup::AppState};

pub async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<Vec<AchievementProgress>> {
    Json(state.achievements.progress_for(&user_id))
}
