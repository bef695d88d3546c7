//! Custom guitar commission handler.

use axum::{Json, extract::State, http::StatusCode};
use tonewood_core::custom_order::{CustomGuitarInput, CustomGuitarRequest};
use tracing::instrument;

use super::ApiJson;
use crate::db::CustomOrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// `POST /api/custom-guitar`
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CustomGuitarInput>,
) -> Result<(StatusCode, Json<CustomGuitarRequest>)> {
    let request = input.validate()?;
    let created = CustomOrderRepository::new(state.pool())
        .create(&request)
        .await?;

    add_breadcrumb("custom_guitar", "Custom guitar requested", None);
    tracing::info!(
        request_id = %created.id,
        budget = %created.budget,
        "Custom guitar request received"
    );
    Ok((StatusCode::CREATED, Json(created)))
}
