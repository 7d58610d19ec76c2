use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::models::{CartLineItem, Event};
use crate::store::{as_count, DocumentStore, StoreError, StorePath, WriteBatch};

pub mod error;

pub use error::{CheckoutError, CheckoutFailure, ItemError};

/// Turns a client-supplied cart into a validated, consistent set of store
/// mutations, or fails without mutating anything.
///
/// Every line item is evaluated before any write: per-item failures are
/// collected, and one aggregated error reports them all. A clean cart becomes
/// a single guarded batch, so the whole checkout commits or nothing does, and
/// a concurrent checkout against the same tier is rejected by the store
/// instead of silently overselling.
pub struct CheckoutEngine {
    store: Arc<dyn DocumentStore>,
}

impl CheckoutEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Process a checkout for `buyer_id`.
    ///
    /// An empty cart succeeds trivially with no store writes. Success means
    /// every tier availability was decremented by exactly the requested
    /// quantity and the buyer's per-event purchase counts incremented
    /// accordingly, in one batched write. Re-running the same cart after a
    /// success decrements again; clients clear their cart on success.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Rejected`] aggregates every item-level failure;
    /// [`CheckoutError::Conflict`] means concurrent inventory movement was
    /// detected at commit and the caller may retry. In both cases the store
    /// is untouched.
    pub async fn process_checkout(
        &self,
        items: &[CartLineItem],
        buyer_id: &str,
    ) -> Result<(), CheckoutError> {
        let mut batch = WriteBatch::new();
        let mut staged: BTreeMap<StorePath, u64> = BTreeMap::new();
        let mut errors = Vec::new();

        for item in items {
            if let Err(error) = self
                .evaluate_item(item, buyer_id, &mut batch, &mut staged)
                .await
            {
                errors.push(error);
            }
        }

        if !errors.is_empty() {
            warn!(
                items = items.len(),
                failed = errors.len(),
                "checkout rejected"
            );
            return Err(CheckoutFailure::new(errors).into());
        }

        if batch.is_empty() {
            info!("checkout with empty cart, nothing to write");
            return Ok(());
        }

        let updates = batch.len();
        self.store.commit(batch).await.map_err(|error| {
            if matches!(error, StoreError::PreconditionFailed { .. }) {
                warn!(%error, "checkout lost an inventory race");
                CheckoutError::Conflict(error)
            } else {
                CheckoutError::Store(error)
            }
        })?;

        info!(items = items.len(), updates, "checkout committed");
        Ok(())
    }

    /// Evaluate one line item, staging its two updates on success.
    ///
    /// Counters consult staged values before the store, so two items against
    /// the same event or tier read-modify-write on top of each other's staged
    /// deltas rather than the stale pre-checkout snapshot. The first touch of
    /// each counter records a guard asserting the value read from the store.
    async fn evaluate_item(
        &self,
        item: &CartLineItem,
        buyer_id: &str,
        batch: &mut WriteBatch,
        staged: &mut BTreeMap<StorePath, u64>,
    ) -> Result<(), ItemError> {
        let event_path = StorePath::event(&item.event_id)
            .map_err(|_| ItemError::EventNotFound(item.event_id.clone()))?;
        let doc = self
            .store
            .read(&event_path)
            .await
            .map_err(|error| ItemError::Unknown(error.to_string()))?
            .ok_or_else(|| ItemError::EventNotFound(item.event_id.clone()))?;
        let event: Event = serde_json::from_value(doc.clone()).map_err(|error| {
            ItemError::Unknown(format!(
                "malformed event document for {}: {error}",
                item.event_id
            ))
        })?;

        let tier_index = event
            .resolve_tier(item.tier_name.as_deref())
            .ok_or_else(|| ItemError::TierNotFound {
                event_id: item.event_id.clone(),
                tier_name: item.tier_name.clone(),
            })?;
        let tier = &event.ticket_tiers[tier_index];

        let availability_path = StorePath::tier_availability(&item.event_id, tier_index)
            .map_err(|error| ItemError::Unknown(error.to_string()))?;

        let available = staged
            .get(&availability_path)
            .copied()
            .unwrap_or(tier.available_tickets);
        if available < item.quantity {
            return Err(ItemError::InsufficientInventory {
                title: event.title.clone(),
                requested: item.quantity,
                available,
            });
        }
        let remaining = available - item.quantity;

        if !staged.contains_key(&availability_path) {
            batch.guard(
                availability_path.clone(),
                raw_tier_availability(&doc, tier_index),
            );
        }
        staged.insert(availability_path.clone(), remaining);
        batch.set(availability_path, remaining);

        let purchased_path = StorePath::purchased(buyer_id, &item.event_id)
            .map_err(|error| ItemError::Unknown(error.to_string()))?;
        let purchased = match staged.get(&purchased_path) {
            Some(count) => *count,
            None => {
                let raw = self
                    .store
                    .read(&purchased_path)
                    .await
                    .map_err(|error| ItemError::Unknown(error.to_string()))?;
                batch.guard(purchased_path.clone(), raw.clone());
                as_count(raw.as_ref())
            }
        };
        let total = purchased + item.quantity;
        staged.insert(purchased_path.clone(), total);
        batch.set(purchased_path, total);

        Ok(())
    }
}

/// The availability value exactly as stored, for guard recording. The typed
/// model coerces this field, which would turn a stored `"12"` into `12` and
/// weaken the guard.
fn raw_tier_availability(doc: &Value, tier_index: usize) -> Option<Value> {
    doc.get("ticketTiers")
        .and_then(|tiers| tiers.get(tier_index))
        .and_then(|tier| tier.get("availableTickets"))
        .cloned()
}
