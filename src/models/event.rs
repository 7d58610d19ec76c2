use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event document as stored under `events/{eventId}`.
///
/// Documents written by older clients can be sparse, so everything except the
/// tier list defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub organizer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ticket_tiers: Vec<TicketTier>,
}

impl Event {
    /// Resolve a cart line item's tier to its positional index.
    ///
    /// No requested name selects the first-defined tier (the synthetic
    /// "Standard Ticket" convention for single-price events). Duplicate names
    /// resolve to the lowest index.
    pub fn resolve_tier(&self, tier_name: Option<&str>) -> Option<usize> {
        match tier_name {
            None => {
                if self.ticket_tiers.is_empty() {
                    None
                } else {
                    Some(0)
                }
            }
            Some(name) => self.ticket_tiers.iter().position(|tier| tier.name == name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTier {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default, with = "crate::store::count")]
    pub available_tickets: u64,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub is_highlighted: bool,
}

/// An event joined with its store key, as returned by the listing and detail
/// endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(flatten)]
    pub event: Event,
}

pub const STANDARD_TIER_NAME: &str = "Standard Ticket";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NewEventError {
    #[error("event title must not be empty")]
    EmptyTitle,

    #[error("ticket tier names must not be empty")]
    EmptyTierName,

    #[error("an event needs at least one ticket tier or a price")]
    NoTiers,
}

/// Organizer-supplied payload for event creation.
///
/// Tiers are optional: a flat `price` + `availableTickets` pair becomes one
/// synthetic "Standard Ticket" tier, so every stored event carries a tier
/// list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ticket_tiers: Vec<TicketTier>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default, with = "crate::store::count_opt")]
    pub available_tickets: Option<u64>,
}

impl NewEvent {
    pub fn into_event(
        self,
        organizer_id: String,
        created_at: DateTime<Utc>,
    ) -> Result<Event, NewEventError> {
        if self.title.trim().is_empty() {
            return Err(NewEventError::EmptyTitle);
        }

        let ticket_tiers = if self.ticket_tiers.is_empty() {
            let Some(price) = self.price else {
                return Err(NewEventError::NoTiers);
            };
            vec![TicketTier {
                name: STANDARD_TIER_NAME.to_string(),
                description: String::new(),
                price,
                available_tickets: self.available_tickets.unwrap_or(0),
                benefits: Vec::new(),
                is_highlighted: false,
            }]
        } else {
            if self
                .ticket_tiers
                .iter()
                .any(|tier| tier.name.trim().is_empty())
            {
                return Err(NewEventError::EmptyTierName);
            }
            self.ticket_tiers
        };

        Ok(Event {
            title: self.title,
            description: self.description,
            category: self.category,
            date: self.date,
            location: self.location,
            image: self.image,
            organizer_id,
            created_at: Some(created_at),
            ticket_tiers,
        })
    }
}
