//! Experience points, levels and per-topic skill XP.
//!
//! The engine owns a [`ProgressState`], persists it through a
//! [`KeyValueStore`] after every mutation and hands back a [`Notification`]
//! for each award. Level and progress are always derived from `xp` at read
//! time and are never stored.
//!
//! All mutations run under a single mutex, so the "level before / level
//! after" comparison that decides between an XP and a level-up notification
//! stays correct when the engine is shared between threads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::store::{KeyValueStore, StoreError};

/// Store key holding the global XP as decimal text.
pub const XP_KEY: &str = "astra_xp";
/// Store key holding the skills map as a JSON object.
pub const SKILLS_KEY: &str = "astra_skills";
/// XP needed to go up one level.
pub const XP_PER_LEVEL: u64 = 100;
/// How long a notification stays in the active set.
pub const NOTIFICATION_TTL_MS: i64 = 3000;

/// Level reached with `xp` experience points. Level 1 covers 0..=99.
pub fn level_for(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("XP amount must be positive")]
    InvalidAmount,
    #[error("skill topic must not be empty")]
    EmptyTopic,
    #[error("failed to persist progression state: {0}")]
    Store(#[from] StoreError),
}

/// Persistent progression data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub xp: u64,
    pub skills: BTreeMap<String, u64>,
}

impl ProgressState {
    pub fn level(&self) -> u64 {
        level_for(self.xp)
    }

    /// Percentage through the current level, in `0.0..100.0`.
    pub fn progress(&self) -> f64 {
        (self.xp % XP_PER_LEVEL) as f64 * 100.0 / XP_PER_LEVEL as f64
    }

    /// XP total at which the next level starts.
    pub fn next_level_xp(&self) -> u64 {
        self.level() * XP_PER_LEVEL
    }
}

/// Read-only view returned by [`ProgressionEngine::state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub xp: u64,
    pub level: u64,
    pub progress: f64,
    pub next_level_xp: u64,
    pub skills: BTreeMap<String, u64>,
}

impl From<&ProgressState> for ProgressSnapshot {
    fn from(state: &ProgressState) -> Self {
        Self {
            xp: state.xp,
            level: state.level(),
            progress: state.progress(),
            next_level_xp: state.next_level_xp(),
            skills: state.skills.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Xp,
    LevelUp,
}

/// A short-lived message produced by every XP award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(kind: NotificationKind, message: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            message,
            kind,
            created_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::milliseconds(NOTIFICATION_TTL_MS)
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

struct Inner {
    state: ProgressState,
    notifications: Vec<Notification>,
}

/// Owns and mutates the progression state.
pub struct ProgressionEngine {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl ProgressionEngine {
    /// Loads the persisted state using the system clock.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, ProgressionError> {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Loads the persisted state. Missing entries start at zero; entries
    /// that fail to parse are logged and replaced by defaults.
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProgressionError> {
        let xp = match store.get(XP_KEY)? {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                log::warn!("ignoring unreadable {} value {:?}: {}", XP_KEY, raw, e);
                0
            }),
            None => 0,
        };
        let skills = match store.get(SKILLS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable {} value: {}", SKILLS_KEY, e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        log::debug!("progression loaded: xp={} skills={}", xp, skills.len());

        Ok(Self {
            store,
            clock,
            inner: Mutex::new(Inner {
                state: ProgressState { xp, skills },
                notifications: Vec::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Critical sections never panic mid-update, so a poisoned guard still
        // holds a consistent state.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Awards `amount` global XP.
    pub fn add_xp(&self, amount: u64, reason: &str) -> Result<Notification, ProgressionError> {
        if amount == 0 {
            return Err(ProgressionError::InvalidAmount);
        }
        let mut inner = self.lock();
        let mut next = inner.state.clone();
        let notification = self.apply_xp(&mut next, amount, reason);
        self.persist_xp(&next)?;
        Ok(self.commit(&mut inner, next, notification))
    }

    /// Awards `amount` XP to `topic`. The same amount counts once toward the
    /// global XP, with reason `"{topic} Proficiency"`.
    pub fn add_skill_xp(&self, topic: &str, amount: u64) -> Result<Notification, ProgressionError> {
        if topic.trim().is_empty() {
            return Err(ProgressionError::EmptyTopic);
        }
        if amount == 0 {
            return Err(ProgressionError::InvalidAmount);
        }
        let mut inner = self.lock();
        let mut next = inner.state.clone();
        let entry = next.skills.entry(topic.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
        let notification = self.apply_xp(&mut next, amount, &format!("{} Proficiency", topic));
        self.persist_all(&inner.state, &next)?;
        Ok(self.commit(&mut inner, next, notification))
    }

    /// Clears XP and skills back to the initial state.
    pub fn reset(&self) -> Result<(), ProgressionError> {
        let mut inner = self.lock();
        self.persist_all(&inner.state, &ProgressState::default())?;
        inner.state = ProgressState::default();
        inner.notifications.clear();
        log::info!("progression state reset");
        Ok(())
    }

    pub fn state(&self) -> ProgressSnapshot {
        ProgressSnapshot::from(&self.lock().state)
    }

    /// Notifications created less than three seconds ago, oldest first.
    pub fn active_notifications(&self) -> Vec<Notification> {
        let now = self.clock.now();
        let mut inner = self.lock();
        inner.notifications.retain(|n| n.is_active_at(now));
        inner.notifications.clone()
    }

    /// Adds `amount` to `state.xp` and builds the matching notification.
    fn apply_xp(&self, state: &mut ProgressState, amount: u64, reason: &str) -> Notification {
        let before = state.xp;
        let after = before.saturating_add(amount);
        let current_level = level_for(before);
        let new_level = level_for(after);
        state.xp = after;

        let (kind, message) = if new_level > current_level {
            (
                NotificationKind::LevelUp,
                format!("LEVEL UP! REACHED LEVEL {}", new_level),
            )
        } else {
            (NotificationKind::Xp, format!("+{} XP: {}", amount, reason))
        };
        log::debug!("xp {} -> {} ({})", before, after, reason);
        Notification::new(kind, message, self.clock.now())
    }

    /// Installs a persisted state and publishes its notification.
    fn commit(&self, inner: &mut Inner, next: ProgressState, notification: Notification) -> Notification {
        inner.state = next;
        let now = self.clock.now();
        inner.notifications.retain(|n| n.is_active_at(now));
        inner.notifications.push(notification.clone());
        notification
    }

    /// Writes skills then XP. When the XP write fails the skills entry is
    /// restored to `current`, so the store never holds a half-applied award.
    fn persist_all(&self, current: &ProgressState, next: &ProgressState) -> Result<(), StoreError> {
        self.persist_skills(next)?;
        if let Err(e) = self.persist_xp(next) {
            if let Err(restore) = self.persist_skills(current) {
                log::warn!("could not restore {} after failed write: {}", SKILLS_KEY, restore);
            }
            return Err(e);
        }
        Ok(())
    }

    fn persist_xp(&self, state: &ProgressState) -> Result<(), StoreError> {
        self.store.set(XP_KEY, &state.xp.to_string())
    }

    fn persist_skills(&self, state: &ProgressState) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string(&state.skills).map_err(|e| StoreError::CodecError(e.to_string()))?;
        self.store.set(SKILLS_KEY, &encoded)
    }
}
