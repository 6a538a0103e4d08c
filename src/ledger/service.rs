//! Login accounting with hardware-binding enforcement.

use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use super::models::{HwidPolicy, ProviderProfile, UserRecord};
use crate::notify::{Notifier, Severity};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("hardware fingerprint does not match the bound device")]
    HardwareMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authoritative record of users and their login history.
pub struct IdentityLedger {
    store: RecordStore<UserRecord>,
    policy: HwidPolicy,
    notifier: Notifier,
}

impl IdentityLedger {
    #[must_use]
    pub fn new(store: RecordStore<UserRecord>, policy: HwidPolicy, notifier: Notifier) -> Self {
        Self {
            store,
            policy,
            notifier,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> HwidPolicy {
        self.policy
    }

    pub async fn get(&self, id: &str) -> Option<UserRecord> {
        self.store.get(id).await
    }

    pub async fn total_users(&self) -> usize {
        self.store.len().await
    }

    pub async fn snapshot(&self) -> HashMap<String, UserRecord> {
        self.store.snapshot().await
    }

    /// Record a successful authentication for `profile`.
    ///
    /// First login creates the record with `total_logins == 1` and fires a
    /// new-user notification; repeat logins bump the counter, refresh the
    /// profile snapshot, and enforce the hardware-binding policy. Returns the
    /// post-mutation record and whether it was newly created.
    ///
    /// # Errors
    /// `HardwareMismatch` under the strict policy when the incoming
    /// fingerprint differs from the bound one (nothing is mutated), or a
    /// store error when the updated set cannot be persisted.
    pub async fn record_login(
        &self,
        profile: &ProviderProfile,
        hardware_id: Option<&str>,
    ) -> Result<(UserRecord, bool), LoginError> {
        let now = Utc::now();
        let policy = self.policy;

        let outcome = self
            .store
            .try_update(|records| match records.get_mut(&profile.id) {
                None => {
                    let record = UserRecord {
                        username: profile.username.clone(),
                        email: profile.email.clone(),
                        email_verified: profile.verified,
                        avatar: profile.avatar.clone(),
                        hardware_id: hardware_id.map(str::to_string),
                        first_login: now,
                        last_login: now,
                        total_logins: 1,
                    };
                    records.insert(profile.id.clone(), record.clone());
                    Ok((record, true))
                }
                Some(record) => {
                    match policy {
                        HwidPolicy::Strict => {
                            if let (Some(bound), Some(incoming)) =
                                (record.hardware_id.as_deref(), hardware_id)
                            {
                                if bound != incoming {
                                    return Err(LoginError::HardwareMismatch);
                                }
                            }
                            // Unbound records adopt the first supplied fingerprint.
                            if record.hardware_id.is_none() {
                                record.hardware_id = hardware_id.map(str::to_string);
                            }
                        }
                        HwidPolicy::Lenient => {
                            if hardware_id.is_some() {
                                record.hardware_id = hardware_id.map(str::to_string);
                            }
                        }
                    }

                    record.username = profile.username.clone();
                    record.email = profile.email.clone();
                    record.email_verified = profile.verified;
                    record.avatar = profile.avatar.clone();
                    record.last_login = now;
                    record.total_logins += 1;
                    Ok((record.clone(), false))
                }
            })
            .await?;
        let (record, created) = outcome?;

        if created {
            info!(id = %profile.id, username = %record.username, "new user registered");
            self.notifier.emit(
                "🆕 New User",
                format!("**{}**\nID: {}", record.username, profile.id),
                Severity::Info,
            );
        }

        Ok((record, created))
    }
}
