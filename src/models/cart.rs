use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a client-held cart, as submitted to checkout.
///
/// Prices and the title are snapshots captured at add-to-cart time and are
/// display-only; inventory decisions use the stored tier state, never these
/// fields. Quantities arrive loosely typed from older clients and go through
/// the count coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_name: Option<String>,
    #[serde(default, with = "crate::store::count")]
    pub quantity: u64,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
}

impl CartLineItem {
    /// Bare item referencing an event's first-defined tier.
    pub fn new(event_id: impl Into<String>, quantity: u64) -> Self {
        Self {
            event_id: event_id.into(),
            tier_name: None,
            quantity,
            unit_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
            title: String::new(),
            date: String::new(),
        }
    }

    pub fn with_tier(mut self, tier_name: impl Into<String>) -> Self {
        self.tier_name = Some(tier_name.into());
        self
    }
}
