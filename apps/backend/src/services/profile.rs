//! Profile and learning statistics

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::*;
use crate::services::MAX_WRITE_ATTEMPTS;
use crate::AppState;

/// Caller's profile, created on first access
pub async fn get_profile(
    state: &AppState,
    user_id: Uuid,
    default_username: Option<&str>,
) -> Result<UserProfile> {
    state.db.get_or_create_profile(user_id, default_username).await
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> Result<UserProfile> {
    state
        .db
        .update_profile(
            user_id,
            payload.username.as_deref(),
            payload.avatar_url.as_deref(),
        )
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))
}

pub async fn get_stats(state: &AppState, user_id: Uuid) -> Result<StatsResponse> {
    let stats = state.db.get_or_create_stats(user_id).await?;
    Ok(StatsResponse::from(&stats.to_core_stats()))
}

/// Add study minutes and return the updated stats
pub async fn add_study_time(
    state: &AppState,
    user_id: Uuid,
    minutes: u32,
) -> Result<StatsResponse> {
    let _guard = state.locks.lock(user_id).await;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let row = state.db.get_or_create_stats(user_id).await?;
        let mut stats = row.to_core_stats();
        stats.add_study_time(minutes, Utc::now());

        if state.db.save_stats(user_id, &stats, row.version).await? {
            info!(
                user_id = %user_id,
                minutes,
                total = stats.total_study_time,
                "Added study time"
            );
            return Ok(StatsResponse::from(&stats));
        }
        warn!(user_id = %user_id, attempt, "Stats version changed, retrying");
    }

    Err(ServiceError::Conflict(format!("user_stats {}", user_id)))
}
