//! PK matches: start, read, answer, finish, history

use std::collections::HashMap;

use chrono::Utc;
use historia_core::pk as engine;
use historia_core::{CoinFlipOpponent, MatchError, OpponentModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::*;
use crate::services::MAX_WRITE_ATTEMPTS;
use crate::AppState;

/// Completed matches returned by [`history`].
pub const HISTORY_LIMIT: i64 = 20;

/// Challenge an existing user to a new match.
pub async fn start_match(
    state: &AppState,
    user_id: Uuid,
    opponent_id: Uuid,
) -> Result<PkStartResponse> {
    if user_id == opponent_id {
        return Err(MatchError::SelfMatch.into());
    }
    let opponent = state
        .db
        .get_profile(opponent_id)
        .await?
        .ok_or(ServiceError::UserNotFound(opponent_id))?;
    state.db.get_or_create_profile(user_id, None).await?;

    let pool = state.catalog.question_pool();
    let pk = {
        let mut rng = rand::thread_rng();
        engine::start_match(
            user_id,
            opponent_id,
            &pool,
            state.settings.pk_question_count,
            Utc::now(),
            &mut rng,
        )?
    };
    state.db.insert_match(&pk).await?;

    info!(
        match_id = %pk.id,
        user_id = %user_id,
        opponent_id = %opponent_id,
        questions = pk.questions.len(),
        "Started PK match"
    );

    Ok(PkStartResponse {
        id: pk.id,
        opponent_id,
        opponent_name: opponent.username,
        my_score: pk.user1_score,
        opponent_score: pk.user2_score,
        status: pk.status,
        questions: pk.questions,
        current_question: 0,
    })
}

/// Reload a match the caller takes part in. Questions come back exactly as
/// they were frozen at start.
pub async fn get_match(state: &AppState, user_id: Uuid, match_id: Uuid) -> Result<PkMatch> {
    let pk = state
        .db
        .get_match(match_id)
        .await?
        .ok_or(ServiceError::MatchNotFound(match_id))?
        .to_core_match()?;

    if pk.opponent_of(user_id).is_none() {
        return Err(MatchError::NotParticipant.into());
    }
    Ok(pk)
}

/// Submit an answer; the opponent is simulated with the configured accuracy.
pub async fn submit_answer(
    state: &AppState,
    user_id: Uuid,
    payload: PkAnswerRequest,
) -> Result<AnswerOutcome> {
    let mut opponent = CoinFlipOpponent::with_rng(
        state.settings.pk_opponent_accuracy,
        StdRng::from_entropy(),
    );
    submit_answer_with(state, user_id, payload, &mut opponent).await
}

/// Submit an answer with an explicit opponent model.
pub async fn submit_answer_with(
    state: &AppState,
    user_id: Uuid,
    payload: PkAnswerRequest,
    opponent: &mut (dyn OpponentModel + Send),
) -> Result<AnswerOutcome> {
    let match_id = payload.match_id;
    let _guard = state.locks.lock(match_id).await;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let row = state
            .db
            .get_match(match_id)
            .await?
            .ok_or(ServiceError::MatchNotFound(match_id))?;
        let mut pk = row.to_core_match()?;

        let outcome = engine::submit_answer(
            &mut pk,
            user_id,
            payload.question_index,
            payload.answer,
            &mut *opponent,
        )?;

        if state.db.save_match(&pk, row.version).await? {
            info!(
                match_id = %match_id,
                user_id = %user_id,
                question_index = payload.question_index,
                is_correct = outcome.is_correct,
                my_score = outcome.my_score,
                opponent_score = outcome.opponent_score,
                "PK answer recorded"
            );
            return Ok(outcome);
        }
        warn!(match_id = %match_id, attempt, "Match version changed, retrying answer");
    }

    Err(ServiceError::Conflict(format!("pk_match {}", match_id)))
}

/// Close the match and report the caller's result. Repeat calls return the
/// same result.
pub async fn finish_match(
    state: &AppState,
    user_id: Uuid,
    match_id: Uuid,
) -> Result<FinishOutcome> {
    let _guard = state.locks.lock(match_id).await;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let row = state
            .db
            .get_match(match_id)
            .await?
            .ok_or(ServiceError::MatchNotFound(match_id))?;
        let mut pk = row.to_core_match()?;
        let was_completed = pk.is_completed();

        let outcome = engine::finish_match(&mut pk, user_id, Utc::now())?;
        if was_completed {
            return Ok(outcome);
        }

        if state.db.save_match(&pk, row.version).await? {
            info!(
                match_id = %match_id,
                winner_id = ?pk.winner_id,
                user1_score = pk.user1_score,
                user2_score = pk.user2_score,
                "PK match finished"
            );
            return Ok(outcome);
        }
        warn!(match_id = %match_id, attempt, "Match version changed, retrying finish");
    }

    Err(ServiceError::Conflict(format!("pk_match {}", match_id)))
}

/// The caller's most recent completed matches, newest first.
pub async fn history(state: &AppState, user_id: Uuid) -> Result<Vec<PkHistoryEntry>> {
    let matches = state
        .db
        .get_match_history(user_id, HISTORY_LIMIT)
        .await?
        .iter()
        .map(|row| row.to_core_match())
        .collect::<Result<Vec<PkMatch>>>()?;

    let opponent_ids: Vec<Uuid> = matches
        .iter()
        .filter_map(|pk| pk.opponent_of(user_id))
        .collect();
    let names: HashMap<Uuid, Option<String>> = state
        .db
        .get_profiles(&opponent_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.username))
        .collect();

    Ok(matches
        .iter()
        .filter_map(|pk| history_entry(pk, user_id, &names))
        .collect())
}

fn history_entry(
    pk: &PkMatch,
    user_id: Uuid,
    names: &HashMap<Uuid, Option<String>>,
) -> Option<PkHistoryEntry> {
    let opponent_id = pk.opponent_of(user_id)?;
    let (my_score, opponent_score) = pk.scores_for(user_id)?;
    let result = pk.result_for(user_id)?;

    Some(PkHistoryEntry {
        id: pk.id,
        opponent: OpponentSummary {
            id: opponent_id,
            username: names.get(&opponent_id).cloned().flatten(),
        },
        my_score,
        opponent_score,
        result,
        completed_at: pk.completed_at,
    })
}
