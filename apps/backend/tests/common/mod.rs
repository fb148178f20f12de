//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring the service state to a real database
//! - Helpers for creating and removing test users
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).
//! The reference schema in `schema.sql` is applied on first use.

#![allow(dead_code)]

pub mod fixtures;

use uuid::Uuid;

use historia_backend::config::{builtin_catalog, Settings};
use historia_backend::db::Database;
use historia_backend::AppState;

const SCHEMA: &str = include_str!("../../schema.sql");

/// Test context holding service state backed by a real database.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub state: AppState,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        Self::with_question_count(5).await
    }

    /// Create a test context whose PK matches use `pk_question_count` questions.
    pub async fn with_question_count(pk_question_count: usize) -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url, 5)
            .await
            .expect("Failed to connect to test database");

        // The advisory lock keeps parallel test binaries from racing on DDL.
        sqlx::raw_sql(&format!("SELECT pg_advisory_xact_lock(7305);\n{SCHEMA}"))
            .execute(db.pool())
            .await
            .expect("Failed to apply schema");

        let settings = Settings {
            database_url,
            max_connections: 5,
            catalog_path: None,
            pk_question_count,
            pk_opponent_accuracy: 0.6,
        };
        let catalog = builtin_catalog().expect("Built-in catalog must be valid");

        Self {
            state: AppState::new(db, catalog, settings),
        }
    }

    /// Create a test user profile and return its ID.
    pub async fn create_test_user(&self, username: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .db
            .get_or_create_profile(id, username)
            .await
            .expect("Failed to create test user");
        id
    }

    /// Remove a test user; dependent rows cascade.
    pub async fn cleanup_user(&self, user_id: Uuid) {
        let _ = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(user_id)
            .execute(self.state.db.pool())
            .await;
    }
}
