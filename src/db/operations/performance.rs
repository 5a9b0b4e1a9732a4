use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;

use crate::adaptive::{AnswerRecord, PerformanceProfile};
use crate::db::{DatabaseProxy, PerformanceStore, StoreError};

const SELECT_PROFILE: &str = r#"
    SELECT "userId", "totalQuestionsAnswered", "totalCorrectAnswers", "averageAccuracy",
           "currentDifficultyLevel", "recentPerformance", "version", "updatedAt"
    FROM "user_performance"
    WHERE "userId" = $1
"#;

#[derive(Clone)]
pub struct PgPerformanceStore {
    proxy: Arc<DatabaseProxy>,
}

impl PgPerformanceStore {
    pub fn new(proxy: Arc<DatabaseProxy>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl PerformanceStore for PgPerformanceStore {
    async fn load(&self, user_id: &str) -> Result<Option<PerformanceProfile>, StoreError> {
        let row = sqlx::query(SELECT_PROFILE)
            .bind(user_id)
            .fetch_optional(self.proxy.pool())
            .await?;

        Ok(row.map(|r| map_profile(&r)).transpose()?)
    }

    async fn create(&self, profile: &PerformanceProfile) -> Result<PerformanceProfile, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "user_performance" (
                "userId", "totalQuestionsAnswered", "totalCorrectAnswers", "averageAccuracy",
                "currentDifficultyLevel", "recentPerformance", "version", "updatedAt"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT ("userId") DO NOTHING
            "#,
        )
        .bind(&profile.user_id)
        .bind(to_db_count(profile.total_questions_answered))
        .bind(to_db_count(profile.total_correct_answers))
        .bind(profile.average_accuracy)
        .bind(profile.current_difficulty_level)
        .bind(Json(&profile.recent_performance))
        .bind(profile.version)
        .bind(profile.updated_at)
        .execute(self.proxy.pool())
        .await?;

        let row = sqlx::query(SELECT_PROFILE)
            .bind(&profile.user_id)
            .fetch_one(self.proxy.pool())
            .await?;
        Ok(map_profile(&row)?)
    }

    async fn save(&self, profile: &mut PerformanceProfile) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE "user_performance"
            SET "totalQuestionsAnswered" = $3,
                "totalCorrectAnswers" = $4,
                "averageAccuracy" = $5,
                "currentDifficultyLevel" = $6,
                "recentPerformance" = $7,
                "updatedAt" = $8,
                "version" = "version" + 1
            WHERE "userId" = $1 AND "version" = $2
            "#,
        )
        .bind(&profile.user_id)
        .bind(profile.version)
        .bind(to_db_count(profile.total_questions_answered))
        .bind(to_db_count(profile.total_correct_answers))
        .bind(profile.average_accuracy)
        .bind(profile.current_difficulty_level)
        .bind(Json(&profile.recent_performance))
        .bind(profile.updated_at)
        .execute(self.proxy.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                user_id: profile.user_id.clone(),
            });
        }

        profile.version += 1;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn map_profile(row: &PgRow) -> Result<PerformanceProfile, sqlx::Error> {
    let recent: Json<VecDeque<AnswerRecord>> = row.try_get("recentPerformance")?;
    Ok(PerformanceProfile {
        user_id: row.try_get("userId")?,
        total_questions_answered: from_db_count(row.try_get("totalQuestionsAnswered")?),
        total_correct_answers: from_db_count(row.try_get("totalCorrectAnswers")?),
        average_accuracy: row.try_get("averageAccuracy")?,
        current_difficulty_level: row.try_get("currentDifficultyLevel")?,
        recent_performance: recent.0,
        version: row.try_get("version")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updatedAt")?,
    })
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
