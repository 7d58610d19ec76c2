use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Path families used by the marketplace documents.
pub const EVENTS_ROOT: &str = "events";
pub const USERS_ROOT: &str = "users";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store path: '{0}'")]
    InvalidPath(String),

    #[error("value at '{path}' cannot be traversed or written")]
    WrongShape { path: StorePath },

    #[error("precondition failed at '{path}'")]
    PreconditionFailed { path: StorePath },

    #[error("failed to read seed file: {0}")]
    SeedIo(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),

    #[error("seed root must be a JSON object")]
    SeedShape,
}

/// A slash-separated location in the document tree, e.g.
/// `events/{eventId}/ticketTiers/{index}/availableTickets`.
///
/// Segments are non-empty and never contain `/`; array nodes are addressed
/// by decimal index segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorePath(String);

impl StorePath {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|segment| segment.is_empty()) {
            return Err(StoreError::InvalidPath(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn from_segments<'a, I>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut joined = String::new();
        for segment in segments {
            if segment.is_empty() || segment.contains('/') {
                return Err(StoreError::InvalidPath(segment.to_string()));
            }
            if !joined.is_empty() {
                joined.push('/');
            }
            joined.push_str(segment);
        }
        if joined.is_empty() {
            return Err(StoreError::InvalidPath(String::new()));
        }
        Ok(Self(joined))
    }

    /// `events` collection root.
    pub fn events_root() -> Self {
        Self(EVENTS_ROOT.to_string())
    }

    /// `events/{eventId}`
    pub fn event(event_id: &str) -> Result<Self, StoreError> {
        Self::from_segments([EVENTS_ROOT, event_id])
    }

    /// `events/{eventId}/ticketTiers/{index}/availableTickets`
    pub fn tier_availability(event_id: &str, tier_index: usize) -> Result<Self, StoreError> {
        let index = tier_index.to_string();
        Self::from_segments([
            EVENTS_ROOT,
            event_id,
            "ticketTiers",
            index.as_str(),
            "availableTickets",
        ])
    }

    /// `users/{userId}/purchasedTickets`
    pub fn purchased_root(user_id: &str) -> Result<Self, StoreError> {
        Self::from_segments([USERS_ROOT, user_id, "purchasedTickets"])
    }

    /// `users/{userId}/purchasedTickets/{eventId}`
    pub fn purchased(user_id: &str, event_id: &str) -> Result<Self, StoreError> {
        Self::from_segments([USERS_ROOT, user_id, "purchasedTickets", event_id])
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A precondition attached to a [`WriteBatch`]: the batch commits only if the
/// path still holds `expected` (`None` = must be absent).
#[derive(Debug, Clone)]
pub struct Guard {
    pub path: StorePath,
    pub expected: Option<Value>,
}

/// An ordered set of path->value updates applied atomically as a set,
/// optionally fenced by guards.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    updates: BTreeMap<StorePath, Value>,
    guards: Vec<Guard>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: StorePath, value: impl Into<Value>) {
        self.updates.insert(path, value.into());
    }

    pub fn guard(&mut self, path: StorePath, expected: Option<Value>) {
        self.guards.push(Guard { path, expected });
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.guards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn updates(&self) -> impl Iterator<Item = (&StorePath, &Value)> {
        self.updates.iter()
    }

    pub fn into_updates(self) -> BTreeMap<StorePath, Value> {
        self.updates
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }
}

/// Hierarchical document store addressed by [`StorePath`].
///
/// `commit` applies every update in the batch or none of them; guards let a
/// caller make the batch conditional on values it previously read, so
/// read-then-write sequences against shared counters serialize instead of
/// silently clobbering each other.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    async fn exists(&self, path: &StorePath) -> Result<bool, StoreError> {
        Ok(self.read(path).await?.is_some())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Coerce a stored JSON value to a count.
///
/// Counters in the tree have historically been written as numbers or numeric
/// strings depending on the client; this is the single conversion applied at
/// the read boundary. Missing, non-numeric, and negative values all coerce
/// to 0.
pub fn as_count(value: Option<&Value>) -> u64 {
    let Some(value) = value else { return 0 };
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                i.max(0) as u64
            } else if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() && f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Serde adapter for count fields stored with loose typing.
pub mod count {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::as_count;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(as_count(value.as_ref()))
    }

    pub fn serialize<S>(count: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(*count)
    }
}

/// Serde adapter for optional count fields.
pub mod count_opt {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::as_count;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.map(|v| as_count(Some(&v))))
    }
}

/// Guard comparison. Counts are numeric-aware so a guard recorded from a
/// stored `"12"` still matches a concurrent rewrite to the number `12`.
pub(crate) fn guard_matches(current: Option<&Value>, expected: Option<&Value>) -> bool {
    match (current, expected) {
        (None, None) => true,
        (Some(c), Some(e)) => c == e || numeric_eq(c, e),
        _ => false,
    }
}

fn numeric_eq(a: &Value, b: &Value) -> bool {
    match (strict_num(a), strict_num(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn strict_num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
