use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract::CurrentUser;
use crate::models::{Event, EventRecord, NewEvent};
use crate::routes::AppState;
use crate::store::{StorePath, WriteBatch};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let root = state.store.read(&StorePath::events_root()).await?;

    let mut events = Vec::new();
    if let Some(Value::Object(entries)) = root {
        for (id, doc) in entries {
            match serde_json::from_value::<Event>(doc) {
                Ok(event) => events.push(EventRecord { id, event }),
                Err(error) => {
                    warn!(event_id = %id, %error, "skipping malformed event document");
                }
            }
        }
    }

    Ok(success(events, "Events fetched successfully"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("Event with id '{id}' was not found"));

    let path = StorePath::event(&id).map_err(|_| not_found())?;
    let doc = state.store.read(&path).await?.ok_or_else(not_found)?;
    let event: Event = serde_json::from_value(doc)
        .map_err(|error| AppError::Internal(format!("malformed event document for {id}: {error}")))?;

    Ok(success(EventRecord { id, event }, "Event fetched successfully"))
}

#[derive(Serialize)]
struct CreatedEvent {
    id: String,
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewEvent>,
) -> Result<Response, AppError> {
    let event = payload.into_event(user.id, Utc::now())?;

    let id = Uuid::new_v4().to_string();
    let path = StorePath::event(&id)?;
    let doc = serde_json::to_value(&event).map_err(|error| AppError::Internal(error.to_string()))?;

    let mut batch = WriteBatch::new();
    // Store-assigned ids must never overwrite an existing document.
    batch.guard(path.clone(), None);
    batch.set(path, doc);
    state.store.commit(batch).await?;

    info!(event_id = %id, tiers = event.ticket_tiers.len(), "event created");
    Ok(created(CreatedEvent { id }, "Event created successfully"))
}
