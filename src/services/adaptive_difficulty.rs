use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::adaptive::selector::{self, AdaptiveCandidate};
use crate::adaptive::tier::{self, DifficultyTier, SessionPerformance};
use crate::adaptive::{AnswerOutcome, PerformanceInsights, PerformanceProfile};
use crate::db::{PerformanceStore, StoreError};

#[derive(Debug, Error)]
pub enum AdaptiveError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecorded {
    pub new_difficulty_level: f64,
    pub accuracy: f64,
}

/// Serializes profile writes per user within this process.
#[derive(Default)]
struct UserLocks {
    inner: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    fn slot<'a>(&'a self, user_id: &str) -> UserLockSlot<'a> {
        let mut map = self.inner.lock();
        let handle = Arc::clone(
            map.entry(user_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        );
        UserLockSlot {
            locks: self,
            user_id: user_id.to_string(),
            handle,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().len()
    }
}

/// A caller's claim on one user's lock. Dropping it, including when the owning
/// future is cancelled, removes the map entry once nobody else holds it.
struct UserLockSlot<'a> {
    locks: &'a UserLocks,
    user_id: String,
    handle: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for UserLockSlot<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.inner.lock();
        // map + this handle; anyone else is still queued on it
        if Arc::strong_count(&self.handle) == 2 {
            map.remove(&self.user_id);
        }
    }
}

pub struct AdaptiveDifficultyService {
    store: Arc<dyn PerformanceStore>,
    locks: UserLocks,
}

impl AdaptiveDifficultyService {
    pub fn new(store: Arc<dyn PerformanceStore>) -> Self {
        Self {
            store,
            locks: UserLocks::default(),
        }
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn get_user_performance(
        &self,
        user_id: &str,
    ) -> Result<PerformanceProfile, AdaptiveError> {
        if let Some(profile) = self.store.load(user_id).await? {
            return Ok(profile);
        }

        let profile = self.store.create(&PerformanceProfile::new(user_id)).await?;
        tracing::debug!(user_id, "created performance profile");
        Ok(profile)
    }

    pub async fn record_answer(
        &self,
        user_id: &str,
        outcome: AnswerOutcome,
    ) -> Result<AnswerRecorded, AdaptiveError> {
        let slot = self.locks.slot(user_id);
        let _guard = slot.handle.lock().await;
        self.record_answer_locked(user_id, outcome).await
    }

    async fn record_answer_locked(
        &self,
        user_id: &str,
        outcome: AnswerOutcome,
    ) -> Result<AnswerRecorded, AdaptiveError> {
        let mut profile = self.get_user_performance(user_id).await?;
        let previous_level = profile.current_difficulty_level;

        profile.record_answer(outcome, Utc::now());
        self.store.save(&mut profile).await?;

        if profile.current_difficulty_level != previous_level {
            tracing::info!(
                user_id,
                from = previous_level,
                to = profile.current_difficulty_level,
                "difficulty level adjusted"
            );
        }

        Ok(AnswerRecorded {
            new_difficulty_level: profile.current_difficulty_level,
            accuracy: profile.average_accuracy,
        })
    }

    pub async fn get_performance_insights(
        &self,
        user_id: &str,
    ) -> Result<PerformanceInsights, AdaptiveError> {
        let profile = self.get_user_performance(user_id).await?;
        Ok(profile.insights())
    }

    /// Best match for the user's current level. Does not modify the profile.
    pub async fn select_adaptive_question<'a, Q: AdaptiveCandidate>(
        &self,
        user_id: &str,
        pool: &'a [Q],
    ) -> Result<Option<&'a Q>, AdaptiveError> {
        let profile = self.get_user_performance(user_id).await?;
        Ok(selector::select_question(&profile, pool))
    }

    pub fn next_session_tier(
        &self,
        current: DifficultyTier,
        performance: &SessionPerformance,
    ) -> DifficultyTier {
        tier::next_tier(current, performance)
    }
}
