//! Friend requests and friendships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FriendshipError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Directed friendship record: `user_id` asked, `friend_id` answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: Uuid,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// Create a pending request after checking the existing relation between
    /// the two users (in either direction). A rejected request may be renewed.
    pub fn request(
        from: Uuid,
        to: Uuid,
        existing: Option<&Friendship>,
        now: DateTime<Utc>,
    ) -> Result<Self, FriendshipError> {
        if from == to {
            return Err(FriendshipError::SelfRequest);
        }
        match existing.map(|f| f.status) {
            Some(FriendshipStatus::Accepted) => return Err(FriendshipError::AlreadyFriends),
            Some(FriendshipStatus::Pending) => return Err(FriendshipError::RequestPending),
            Some(FriendshipStatus::Rejected) | None => {}
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: from,
            friend_id: to,
            status: FriendshipStatus::Pending,
            created_at: now,
        })
    }

    pub fn accept(&mut self, by: Uuid) -> Result<(), FriendshipError> {
        self.answer(by, FriendshipStatus::Accepted)
    }

    pub fn reject(&mut self, by: Uuid) -> Result<(), FriendshipError> {
        self.answer(by, FriendshipStatus::Rejected)
    }

    fn answer(&mut self, by: Uuid, status: FriendshipStatus) -> Result<(), FriendshipError> {
        if by != self.friend_id {
            return Err(FriendshipError::NotAddressee);
        }
        if self.status != FriendshipStatus::Pending {
            return Err(FriendshipError::NotPending);
        }
        self.status = status;
        Ok(())
    }

    /// The other user of the relation, if `user` is part of it.
    pub fn other_party(&self, user: Uuid) -> Option<Uuid> {
        if user == self.user_id {
            Some(self.friend_id)
        } else if user == self.friend_id {
            Some(self.user_id)
        } else {
            None
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == FriendshipStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(from: Uuid, to: Uuid) -> Friendship {
        Friendship::request(from, to, None, Utc::now()).unwrap()
    }

    #[test]
    fn cannot_befriend_yourself() {
        let me = Uuid::new_v4();
        assert_eq!(
            Friendship::request(me, me, None, Utc::now()).unwrap_err(),
            FriendshipError::SelfRequest
        );
    }

    #[test]
    fn existing_relation_blocks_new_request() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut existing = pending(b, a);
        assert_eq!(
            Friendship::request(a, b, Some(&existing), Utc::now()).unwrap_err(),
            FriendshipError::RequestPending
        );

        existing.accept(a).unwrap();
        assert_eq!(
            Friendship::request(a, b, Some(&existing), Utc::now()).unwrap_err(),
            FriendshipError::AlreadyFriends
        );
    }

    #[test]
    fn rejected_request_can_be_renewed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut existing = pending(a, b);
        existing.reject(b).unwrap();

        let renewed = Friendship::request(a, b, Some(&existing), Utc::now()).unwrap();
        assert_eq!(renewed.status, FriendshipStatus::Pending);
    }

    #[test]
    fn only_addressee_answers_pending_requests() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut request = pending(a, b);

        assert_eq!(request.accept(a).unwrap_err(), FriendshipError::NotAddressee);
        request.accept(b).unwrap();
        assert!(request.is_accepted());
        assert_eq!(request.reject(b).unwrap_err(), FriendshipError::NotPending);
    }

    #[test]
    fn other_party_works_both_ways() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let f = pending(a, b);
        assert_eq!(f.other_party(a), Some(b));
        assert_eq!(f.other_party(b), Some(a));
        assert_eq!(f.other_party(Uuid::new_v4()), None);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            FriendshipStatus::Pending,
            FriendshipStatus::Accepted,
            FriendshipStatus::Rejected,
        ] {
            assert_eq!(FriendshipStatus::from_str(status.as_str()), Some(status));
        }
    }
}
