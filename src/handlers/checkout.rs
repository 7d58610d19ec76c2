use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::checkout::CheckoutEngine;
use crate::extract::CurrentUser;
use crate::models::CartLineItem;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::empty_success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLineItem>,
}

/// Convert the submitted cart into inventory deductions and purchase records,
/// all-or-nothing. The client keeps its cart on failure and clears it on
/// success.
pub async fn process_checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Response, AppError> {
    let engine = CheckoutEngine::new(state.store.clone());
    engine.process_checkout(&request.items, &user.id).await?;

    Ok(empty_success("Checkout completed successfully"))
}
