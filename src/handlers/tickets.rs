use axum::extract::State;
use axum::response::Response;
use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::CurrentUser;
use crate::models::{Event, TicketHolding};
use crate::routes::AppState;
use crate::store::{as_count, StorePath};
use crate::utils::error::AppError;
use crate::utils::response::success;

/// The buyer's purchased tickets: one aggregate count per event, joined with
/// the event details still present in the store.
pub async fn my_tickets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let root = state.store.read(&StorePath::purchased_root(&user.id)?).await?;

    let mut holdings = Vec::new();
    if let Some(Value::Object(entries)) = root {
        for (event_id, raw_count) in entries {
            let quantity = as_count(Some(&raw_count));
            if quantity == 0 {
                continue;
            }

            let Some(doc) = state.store.read(&StorePath::event(&event_id)?).await? else {
                debug!(%event_id, "purchased event no longer exists");
                continue;
            };
            let event: Event = match serde_json::from_value(doc) {
                Ok(event) => event,
                Err(error) => {
                    warn!(%event_id, %error, "skipping malformed event document");
                    continue;
                }
            };

            holdings.push(TicketHolding {
                event_id,
                title: event.title,
                date: event.date,
                location: event.location,
                quantity,
            });
        }
    }

    Ok(success(holdings, "Tickets fetched successfully"))
}
