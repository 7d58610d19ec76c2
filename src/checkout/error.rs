use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Per-line-item failure reason. Items are evaluated independently, so one
/// checkout attempt collects every problem in the cart instead of stopping at
/// the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("event {0} not found")]
    EventNotFound(String),

    #[error("no valid ticket tier found for event {event_id}")]
    TierNotFound {
        event_id: String,
        tier_name: Option<String>,
    },

    #[error("not enough tickets available for {title}: requested {requested}, available {available}")]
    InsufficientInventory {
        title: String,
        requested: u64,
        available: u64,
    },

    #[error("unexpected error during checkout: {0}")]
    Unknown(String),
}

/// Every [`ItemError`] from one checkout attempt, rolled into a single
/// human-readable failure. Nothing was written to the store.
#[derive(Debug, Clone)]
pub struct CheckoutFailure {
    errors: Vec<ItemError>,
}

impl CheckoutFailure {
    pub(crate) fn new(errors: Vec<ItemError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    pub fn errors(&self) -> &[ItemError] {
        &self.errors
    }
}

impl fmt::Display for CheckoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checkout failed: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckoutFailure {}

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Validation rejected the cart; the aggregate carries every item-level
    /// reason.
    #[error(transparent)]
    Rejected(#[from] CheckoutFailure),

    /// A guard failed at commit: someone else changed the inventory between
    /// our reads and our write. Nothing was written; the caller may retry
    /// with its cart intact.
    #[error("inventory changed while checking out, please retry")]
    Conflict(#[source] StoreError),

    /// The store itself failed at commit time.
    #[error("store failure during checkout")]
    Store(#[source] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_joins_every_item_message() {
        let failure = CheckoutFailure::new(vec![
            ItemError::EventNotFound("ev9".to_string()),
            ItemError::InsufficientInventory {
                title: "Summer Music Festival".to_string(),
                requested: 3,
                available: 1,
            },
        ]);

        let message = failure.to_string();
        assert!(message.starts_with("Checkout failed: "));
        assert!(message.contains("event ev9 not found"));
        assert!(message.contains("Summer Music Festival"));
        assert!(message.contains(", "));
    }
}
