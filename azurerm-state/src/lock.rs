//! State lock records

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Locks left behind by a crashed run expire after this many minutes
pub const DEFAULT_LOCK_TTL_MINUTES: i64 = 15;

/// Contents of a lock file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub id: String,
    /// Command holding the lock ("apply", "destroy", "import")
    pub operation: String,
    /// `user@host`
    pub who: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>) -> Self {
        Self::with_ttl(operation, TimeDelta::minutes(DEFAULT_LOCK_TTL_MINUTES))
    }

    pub fn with_ttl(operation: impl Into<String>, ttl: TimeDelta) -> Self {
        let created = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
            who: lock_owner(),
            created,
            expires: created + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires
    }
}

fn lock_owner() -> String {
    let user = ["USER", "USERNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| "unknown".to_string());
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lock_is_valid_for_default_ttl() {
        let lock = LockInfo::new("apply");
        assert_eq!(lock.operation, "apply");
        assert!(lock.who.contains('@'));
        assert_eq!(
            lock.expires - lock.created,
            TimeDelta::minutes(DEFAULT_LOCK_TTL_MINUTES)
        );
        assert!(!lock.is_expired());
    }

    #[test]
    fn negative_ttl_is_expired() {
        let lock = LockInfo::with_ttl("destroy", TimeDelta::seconds(-1));
        assert!(lock.is_expired());
    }

    #[test]
    fn lock_ids_are_unique() {
        assert_ne!(LockInfo::new("apply").id, LockInfo::new("apply").id);
    }
}
