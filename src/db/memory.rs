use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::adaptive::PerformanceProfile;
use crate::db::{PerformanceStore, StoreError};

/// Process-local store used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryPerformanceStore {
    profiles: RwLock<HashMap<String, PerformanceProfile>>,
}

impl MemoryPerformanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

#[async_trait]
impl PerformanceStore for MemoryPerformanceStore {
    async fn load(&self, user_id: &str) -> Result<Option<PerformanceProfile>, StoreError> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn create(&self, profile: &PerformanceProfile) -> Result<PerformanceProfile, StoreError> {
        let mut profiles = self.profiles.write();
        let stored = profiles
            .entry(profile.user_id.clone())
            .or_insert_with(|| profile.clone());
        Ok(stored.clone())
    }

    async fn save(&self, profile: &mut PerformanceProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write();
        let Some(stored) = profiles.get_mut(&profile.user_id) else {
            return Err(StoreError::Conflict {
                user_id: profile.user_id.clone(),
            });
        };
        if stored.version != profile.version {
            return Err(StoreError::Conflict {
                user_id: profile.user_id.clone(),
            });
        }

        profile.version += 1;
        *stored = profile.clone();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
