use serde::Serialize;

/// A buyer's holding for one event: the per-event purchase count stored at
/// `users/{userId}/purchasedTickets/{eventId}`, joined with event details for
/// display. No tier breakdown is kept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketHolding {
    pub event_id: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub quantity: u64,
}
