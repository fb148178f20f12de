//! Historical figures and stored chat conversations
//!
//! `figure_id = None` addresses the general assistant conversation. Per-figure
//! operations check the figure against the catalog first.

use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::*;
use crate::AppState;

pub fn list_figures(state: &AppState) -> Vec<FigureSummary> {
    state
        .catalog
        .figures()
        .iter()
        .map(FigureSummary::from)
        .collect()
}

pub fn get_figure(state: &AppState, figure_id: &str) -> Result<FigureSummary> {
    state
        .catalog
        .figure(figure_id)
        .map(FigureSummary::from)
        .ok_or_else(|| ServiceError::FigureNotFound(figure_id.to_string()))
}

/// Persona prompt handed to the chat completion proxy
pub fn system_prompt(state: &AppState, figure_id: &str) -> Result<String> {
    state
        .catalog
        .figure(figure_id)
        .map(|f| f.system_prompt.clone())
        .ok_or_else(|| ServiceError::FigureNotFound(figure_id.to_string()))
}

fn ensure_figure(state: &AppState, figure_id: Option<&str>) -> Result<()> {
    match figure_id {
        Some(id) if state.catalog.figure(id).is_none() => {
            Err(ServiceError::FigureNotFound(id.to_string()))
        }
        _ => Ok(()),
    }
}

pub async fn get_history(
    state: &AppState,
    user_id: Uuid,
    figure_id: Option<&str>,
) -> Result<Option<ChatHistoryResponse>> {
    ensure_figure(state, figure_id)?;
    let history = state.db.get_chat_history(user_id, figure_id).await?;
    Ok(history.map(ChatHistoryResponse::from))
}

/// Replace the stored conversation with `messages`
pub async fn save_history(
    state: &AppState,
    user_id: Uuid,
    figure_id: Option<&str>,
    messages: Vec<ChatMessage>,
) -> Result<ChatHistoryResponse> {
    ensure_figure(state, figure_id)?;
    state.db.get_or_create_profile(user_id, None).await?;

    let history = state
        .db
        .save_chat_history(user_id, figure_id, &messages)
        .await?;

    info!(
        user_id = %user_id,
        figure_id = figure_id.unwrap_or("general"),
        messages = messages.len(),
        "Saved chat history"
    );
    Ok(ChatHistoryResponse::from(history))
}

/// Delete the stored conversation. Clearing an empty history succeeds.
pub async fn clear_history(state: &AppState, user_id: Uuid, figure_id: Option<&str>) -> Result<()> {
    ensure_figure(state, figure_id)?;
    if state.db.clear_chat_history(user_id, figure_id).await? {
        info!(user_id = %user_id, figure_id = figure_id.unwrap_or("general"), "Cleared chat history");
    }
    Ok(())
}
