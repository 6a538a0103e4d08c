//! Ban list: the sole ban signal is the presence of a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use utoipa::ToSchema;

use crate::notify::{Notifier, Severity};
use crate::store::{RecordStore, StoreError};

/// Reason recorded when an admin bans without giving one.
pub const DEFAULT_BAN_REASON: &str = "Banned by admin";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BanRecord {
    pub reason: String,
    pub banned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_by: Option<String>,
}

pub struct BanRegistry {
    store: RecordStore<BanRecord>,
    notifier: Notifier,
}

impl BanRegistry {
    #[must_use]
    pub fn new(store: RecordStore<BanRecord>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Absence means not banned.
    pub async fn is_banned(&self, id: &str) -> Option<BanRecord> {
        self.store.get(id).await
    }

    pub async fn total(&self) -> usize {
        self.store.len().await
    }

    pub async fn snapshot(&self) -> HashMap<String, BanRecord> {
        self.store.snapshot().await
    }

    /// Insert or overwrite the ban record for `id`.
    ///
    /// Notifies the channel on every call, including re-bans of an already
    /// banned id; consumers are expected to tolerate duplicates.
    ///
    /// # Errors
    /// Returns a store error when the updated set cannot be persisted.
    pub async fn ban(
        &self,
        id: &str,
        reason: Option<String>,
        banned_by: Option<String>,
    ) -> Result<BanRecord, StoreError> {
        let record = BanRecord {
            reason: reason
                .filter(|reason| !reason.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BAN_REASON.to_string()),
            banned_at: Utc::now(),
            banned_by,
        };

        self.store
            .update(|records| {
                records.insert(id.to_string(), record.clone());
            })
            .await?;

        info!(id, reason = %record.reason, "user banned");
        self.notifier.emit(
            "🚫 User Banned",
            format!("ID: {id}\nReason: {}", record.reason),
            Severity::Critical,
        );

        Ok(record)
    }

    /// Remove the ban for `id` if present. Unbanning a non-banned id is a
    /// no-op and emits nothing.
    ///
    /// # Errors
    /// Returns a store error when the updated set cannot be persisted.
    pub async fn unban(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .store
            .update(|records| records.remove(id).is_some())
            .await?;

        if removed {
            info!(id, "user unbanned");
            self.notifier
                .emit("✅ Unbanned", format!("ID: {id}"), Severity::Success);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify;
    use anyhow::Result;
    use tokio::sync::mpsc::error::TryRecvError;

    async fn registry() -> (
        BanRegistry,
        tokio::sync::mpsc::UnboundedReceiver<notify::Notification>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path().join("bans.json")).await;
        let (notifier, rx) = notify::channel();
        (BanRegistry::new(store, notifier), rx, dir)
    }

    #[tokio::test]
    async fn ban_then_is_banned_round_trip() -> Result<()> {
        let (registry, _rx, _dir) = registry().await;

        registry
            .ban("u1", Some("cheating".to_string()), Some("admin".to_string()))
            .await?;
        let record = registry.is_banned("u1").await.expect("banned");
        assert_eq!(record.reason, "cheating");
        assert_eq!(record.banned_by.as_deref(), Some("admin"));

        assert!(registry.unban("u1").await?);
        assert!(registry.is_banned("u1").await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn ban_without_reason_uses_default() -> Result<()> {
        let (registry, _rx, _dir) = registry().await;

        registry.ban("u1", None, None).await?;
        let record = registry.is_banned("u1").await.expect("banned");
        assert_eq!(record.reason, DEFAULT_BAN_REASON);

        registry.ban("u2", Some("  ".to_string()), None).await?;
        let record = registry.is_banned("u2").await.expect("banned");
        assert_eq!(record.reason, DEFAULT_BAN_REASON);
        Ok(())
    }

    #[tokio::test]
    async fn reban_overwrites_and_notifies_again() -> Result<()> {
        let (registry, mut rx, _dir) = registry().await;

        registry.ban("u1", Some("first".to_string()), None).await?;
        registry.ban("u1", Some("second".to_string()), None).await?;

        assert_eq!(registry.total().await, 1);
        let record = registry.is_banned("u1").await.expect("banned");
        assert_eq!(record.reason, "second");

        // One notification per call, duplicates included.
        assert_eq!(rx.try_recv()?.title, "🚫 User Banned");
        assert_eq!(rx.try_recv()?.title, "🚫 User Banned");
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        Ok(())
    }

    #[tokio::test]
    async fn unban_unknown_id_is_silent_noop() -> Result<()> {
        let (registry, mut rx, _dir) = registry().await;

        assert!(!registry.unban("ghost").await?);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
        Ok(())
    }
}
