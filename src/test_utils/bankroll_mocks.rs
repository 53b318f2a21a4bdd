//! In-memory mock implementations for bankroll repository traits.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::bankroll::{BankrollEntryRepo, BankrollSettingsRepo},
    domain::entities::bankroll::{BankrollEntry, BankrollSettings},
};

// ============================================================================
// InMemoryBankrollSettingsRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryBankrollSettingsRepo {
    pub settings: Mutex<HashMap<Uuid, BankrollSettings>>,
}

#[async_trait]
impl BankrollSettingsRepo for InMemoryBankrollSettingsRepo {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<BankrollSettings>> {
        Ok(self.settings.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, settings: &BankrollSettings) -> AppResult<BankrollSettings> {
        let mut map = self.settings.lock().unwrap();
        let now = Utc::now().naive_utc();

        let mut stored = settings.clone();
        if let Some(existing) = map.get(&settings.user_id) {
            stored.id = existing.id;
            stored.created_at = existing.created_at;
        } else {
            stored.created_at = Some(now);
        }
        stored.updated_at = Some(now);

        map.insert(stored.user_id, stored.clone());
        Ok(stored)
    }
}

// ============================================================================
// InMemoryBankrollEntryRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryBankrollEntryRepo {
    pub entries: Mutex<HashMap<Uuid, BankrollEntry>>,
}

#[async_trait]
impl BankrollEntryRepo for InMemoryBankrollEntryRepo {
    async fn create(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry> {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BankrollEntry>> {
        Ok(self.entries.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<BankrollEntry>> {
        let mut entries: Vec<BankrollEntry> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn update_settlement(&self, entry: &BankrollEntry) -> AppResult<BankrollEntry> {
        let mut entries = self.entries.lock().unwrap();
        let stored = entries.get_mut(&entry.id).ok_or(AppError::NotFound)?;
        stored.status = entry.status;
        stored.profit_loss = entry.profit_loss;
        Ok(stored.clone())
    }
}
