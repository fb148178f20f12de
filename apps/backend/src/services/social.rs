//! Friend requests and friend lists

use std::collections::HashMap;

use chrono::Utc;
use historia_core::FriendshipError;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::*;
use crate::AppState;

/// Send a friend request to an existing user.
pub async fn send_request(state: &AppState, user_id: Uuid, friend_id: Uuid) -> Result<Friendship> {
    if user_id == friend_id {
        return Err(FriendshipError::SelfRequest.into());
    }
    state
        .db
        .get_profile(friend_id)
        .await?
        .ok_or(ServiceError::UserNotFound(friend_id))?;
    state.db.get_or_create_profile(user_id, None).await?;

    let (low, high) = if user_id < friend_id {
        (user_id, friend_id)
    } else {
        (friend_id, user_id)
    };
    let _low = state.locks.lock(low).await;
    let _high = state.locks.lock(high).await;

    let existing = state
        .db
        .find_friendship_between(user_id, friend_id)
        .await?
        .map(|f| f.to_core_friendship())
        .transpose()?;
    let request = Friendship::request(user_id, friend_id, existing.as_ref(), Utc::now())?;
    state.db.replace_friendship(&request).await?;

    info!(user_id = %user_id, friend_id = %friend_id, request_id = %request.id, "Friend request sent");
    Ok(request)
}

/// Pending requests addressed to the caller, with requester profiles
pub async fn incoming_requests(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<FriendRequestSummary>> {
    let requests = state.db.get_incoming_requests(user_id).await?;
    let requester_ids: Vec<Uuid> = requests.iter().map(|r| r.user_id).collect();
    let profiles = profiles_by_id(state, &requester_ids).await?;

    Ok(requests
        .iter()
        .filter_map(|r| {
            profiles.get(&r.user_id).map(|p| FriendRequestSummary {
                id: r.id,
                from_user: FriendSummary::from(p),
                created_at: r.created_at,
            })
        })
        .collect())
}

/// Accept a pending request addressed to the caller.
pub async fn accept_request(state: &AppState, user_id: Uuid, request_id: Uuid) -> Result<Friendship> {
    let friendship = answer_request(state, user_id, request_id, Friendship::accept).await?;
    info!(user_id = %user_id, request_id = %request_id, "Friend request accepted");
    Ok(friendship)
}

/// Decline a pending request addressed to the caller. The requester may ask
/// again later.
pub async fn reject_request(state: &AppState, user_id: Uuid, request_id: Uuid) -> Result<Friendship> {
    let friendship = answer_request(state, user_id, request_id, Friendship::reject).await?;
    info!(user_id = %user_id, request_id = %request_id, "Friend request rejected");
    Ok(friendship)
}

async fn answer_request(
    state: &AppState,
    user_id: Uuid,
    request_id: Uuid,
    answer: fn(&mut Friendship, Uuid) -> std::result::Result<(), FriendshipError>,
) -> Result<Friendship> {
    let mut friendship = state
        .db
        .get_friendship(request_id)
        .await?
        .ok_or(ServiceError::FriendRequestNotFound(request_id))?
        .to_core_friendship()?;

    answer(&mut friendship, user_id)?;
    if !state
        .db
        .answer_friendship(request_id, friendship.status)
        .await?
    {
        return Err(FriendshipError::NotPending.into());
    }
    Ok(friendship)
}

/// Remove any relation with `friend_id`. Removing a non-friend is not an error.
pub async fn remove_friend(state: &AppState, user_id: Uuid, friend_id: Uuid) -> Result<()> {
    let removed = state.db.delete_friendship_between(user_id, friend_id).await?;
    if removed > 0 {
        info!(user_id = %user_id, friend_id = %friend_id, "Friend removed");
    }
    Ok(())
}

/// Accepted friends of the caller
pub async fn list_friends(state: &AppState, user_id: Uuid) -> Result<Vec<FriendSummary>> {
    let friendships = state
        .db
        .get_accepted_friendships(user_id)
        .await?
        .iter()
        .map(|f| f.to_core_friendship())
        .collect::<Result<Vec<Friendship>>>()?;
    let friend_ids: Vec<Uuid> = friendships
        .iter()
        .filter_map(|f| f.other_party(user_id))
        .collect();
    let profiles = profiles_by_id(state, &friend_ids).await?;

    Ok(friend_ids
        .iter()
        .filter_map(|id| profiles.get(id).map(FriendSummary::from))
        .collect())
}

async fn profiles_by_id(state: &AppState, ids: &[Uuid]) -> Result<HashMap<Uuid, UserProfile>> {
    Ok(state
        .db
        .get_profiles(ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect())
}
