//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

const PROFILE_COLUMNS: &str = "id, username, avatar_url, created_at, updated_at";
const STATS_COLUMNS: &str = "user_id, total_study_time, correct_answers, total_answers, \
     current_streak, last_study_date, badges, version, updated_at";
const PROGRESS_COLUMNS: &str =
    "id, user_id, lesson_id, completed, score, completed_at, created_at";
const MATCH_COLUMNS: &str = "id, user1_id, user2_id, user1_score, user2_score, winner_id, \
     status, questions, user1_answers, user2_answers, version, created_at, completed_at";
const FRIENDSHIP_COLUMNS: &str = "id, user_id, friend_id, status, created_at";
const CHAT_COLUMNS: &str = "id, user_id, figure_id, messages, created_at, updated_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === Profile Repository ===

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Fetch the profile, creating it with `default_username` on first access
    pub async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        default_username: Option<&str>,
    ) -> Result<UserProfile> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(default_username)
        .execute(&self.pool)
        .await?;

        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Update the given profile fields; `None` leaves a field unchanged
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        username: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE user_profiles
            SET username = COALESCE($2, username),
                avatar_url = COALESCE($3, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(username)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn get_profiles(&self, user_ids: &[Uuid]) -> Result<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = ANY($1)"
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    // === Stats Repository ===

    /// Fetch stats, creating the profile and a zeroed stats row when missing
    pub async fn get_or_create_stats(&self, user_id: Uuid) -> Result<DbUserStats> {
        sqlx::query("INSERT INTO user_profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let stats = sqlx::query_as::<_, DbUserStats>(&format!(
            "SELECT {STATS_COLUMNS} FROM user_stats WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Write stats if the stored version still equals `expected_version`.
    ///
    /// Returns false when another writer got there first.
    pub async fn save_stats(
        &self,
        user_id: Uuid,
        stats: &UserStats,
        expected_version: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_stats
            SET total_study_time = $3,
                correct_answers = $4,
                total_answers = $5,
                current_streak = $6,
                last_study_date = $7,
                badges = $8,
                version = version + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND version = $2
            "#,
        )
        .bind(user_id)
        .bind(expected_version)
        .bind(i64::from(stats.total_study_time))
        .bind(i64::from(stats.correct_answers))
        .bind(i64::from(stats.total_answers))
        .bind(i64::from(stats.current_streak))
        .bind(stats.last_study_date)
        .bind(Json(&stats.badges))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // === Lesson Progress Repository ===

    pub async fn get_progress(
        &self,
        user_id: Uuid,
        lesson_id: &str,
    ) -> Result<Option<DbLessonProgress>> {
        let progress = sqlx::query_as::<_, DbLessonProgress>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2"
        ))
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    pub async fn list_progress(&self, user_id: Uuid) -> Result<Vec<DbLessonProgress>> {
        let progress = sqlx::query_as::<_, DbLessonProgress>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM lesson_progress WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Number of distinct completed lessons among `lesson_ids`
    pub async fn count_completed_lessons(
        &self,
        user_id: Uuid,
        lesson_ids: &[String],
    ) -> Result<u32> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM lesson_progress
            WHERE user_id = $1 AND completed AND lesson_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(lesson_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_u32(row.get::<i64, _>("count")))
    }

    /// Persist a lesson completion: progress upsert and versioned stats write
    /// commit together or not at all.
    ///
    /// Returns false (nothing written) when the stats version moved.
    pub async fn record_completion(
        &self,
        user_id: Uuid,
        progress: &LessonProgress,
        stats: &UserStats,
        expected_version: i64,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id, completed, score, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                completed = EXCLUDED.completed,
                score = EXCLUDED.score,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&progress.lesson_id)
        .bind(progress.completed)
        .bind(progress.score)
        .bind(progress.completed_at)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE user_stats
            SET correct_answers = $3,
                total_answers = $4,
                badges = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND version = $2
            "#,
        )
        .bind(user_id)
        .bind(expected_version)
        .bind(i64::from(stats.correct_answers))
        .bind(i64::from(stats.total_answers))
        .bind(Json(&stats.badges))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    // === PK Match Repository ===

    pub async fn insert_match(&self, pk: &PkMatch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pk_matches (id, user1_id, user2_id, user1_score, user2_score, winner_id,
                                    status, questions, user1_answers, user2_answers, created_at,
                                    completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(pk.id)
        .bind(pk.user1_id)
        .bind(pk.user2_id)
        .bind(to_i32(pk.user1_score))
        .bind(to_i32(pk.user2_score))
        .bind(pk.winner_id)
        .bind(pk.status.as_str())
        .bind(Json(&pk.questions))
        .bind(Json(&pk.user1_answers))
        .bind(Json(&pk.user2_answers))
        .bind(pk.created_at)
        .bind(pk.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Option<DbPkMatch>> {
        let pk = sqlx::query_as::<_, DbPkMatch>(&format!(
            "SELECT {MATCH_COLUMNS} FROM pk_matches WHERE id = $1"
        ))
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pk)
    }

    /// Write the mutable match fields if the stored version is unchanged
    pub async fn save_match(&self, pk: &PkMatch, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE pk_matches
            SET user1_score = $3,
                user2_score = $4,
                winner_id = $5,
                status = $6,
                user1_answers = $7,
                user2_answers = $8,
                completed_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(pk.id)
        .bind(expected_version)
        .bind(to_i32(pk.user1_score))
        .bind(to_i32(pk.user2_score))
        .bind(pk.winner_id)
        .bind(pk.status.as_str())
        .bind(Json(&pk.user1_answers))
        .bind(Json(&pk.user2_answers))
        .bind(pk.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Most recently completed matches the user took part in
    pub async fn get_match_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<DbPkMatch>> {
        let matches = sqlx::query_as::<_, DbPkMatch>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM pk_matches
            WHERE (user1_id = $1 OR user2_id = $1) AND status = 'completed'
            ORDER BY completed_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    // === Friendship Repository ===

    pub async fn get_friendship(&self, id: Uuid) -> Result<Option<DbFriendship>> {
        let friendship = sqlx::query_as::<_, DbFriendship>(&format!(
            "SELECT {FRIENDSHIP_COLUMNS} FROM friendships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    /// Latest relation between two users, in either direction
    pub async fn find_friendship_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<DbFriendship>> {
        let friendship = sqlx::query_as::<_, DbFriendship>(&format!(
            r#"
            SELECT {FRIENDSHIP_COLUMNS}
            FROM friendships
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    /// Store a new request, dropping any stale relation between the pair
    pub async fn replace_friendship(&self, friendship: &Friendship) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
            "#,
        )
        .bind(friendship.user_id)
        .bind(friendship.friend_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO friendships (id, user_id, friend_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(friendship.id)
        .bind(friendship.user_id)
        .bind(friendship.friend_id)
        .bind(friendship.status.as_str())
        .bind(friendship.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Move a pending friendship to `status`; false if it was no longer pending
    pub async fn answer_friendship(&self, id: Uuid, status: FriendshipStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE friendships SET status = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_friendship_between(&self, a: Uuid, b: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Pending requests addressed to the user, oldest first
    pub async fn get_incoming_requests(&self, user_id: Uuid) -> Result<Vec<DbFriendship>> {
        let requests = sqlx::query_as::<_, DbFriendship>(&format!(
            r#"
            SELECT {FRIENDSHIP_COLUMNS}
            FROM friendships
            WHERE friend_id = $1 AND status = 'pending'
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    pub async fn get_accepted_friendships(&self, user_id: Uuid) -> Result<Vec<DbFriendship>> {
        let friendships = sqlx::query_as::<_, DbFriendship>(&format!(
            r#"
            SELECT {FRIENDSHIP_COLUMNS}
            FROM friendships
            WHERE (user_id = $1 OR friend_id = $1) AND status = 'accepted'
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friendships)
    }

    // === Chat History Repository ===

    pub async fn get_chat_history(
        &self,
        user_id: Uuid,
        figure_id: Option<&str>,
    ) -> Result<Option<DbChatHistory>> {
        let history = sqlx::query_as::<_, DbChatHistory>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chat_history
            WHERE user_id = $1 AND figure_id IS NOT DISTINCT FROM $2
            "#
        ))
        .bind(user_id)
        .bind(figure_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(history)
    }

    /// Replace the stored conversation for (user, figure)
    pub async fn save_chat_history(
        &self,
        user_id: Uuid,
        figure_id: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<DbChatHistory> {
        let history = sqlx::query_as::<_, DbChatHistory>(&format!(
            r#"
            INSERT INTO chat_history (id, user_id, figure_id, messages)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, (COALESCE(figure_id, ''))) DO UPDATE SET
                messages = EXCLUDED.messages,
                updated_at = NOW()
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(figure_id)
        .bind(Json(messages))
        .fetch_one(&self.pool)
        .await?;

        Ok(history)
    }

    pub async fn clear_chat_history(&self, user_id: Uuid, figure_id: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM chat_history WHERE user_id = $1 AND figure_id IS NOT DISTINCT FROM $2",
        )
        .bind(user_id)
        .bind(figure_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
