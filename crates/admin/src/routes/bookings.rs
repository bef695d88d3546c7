//! Booking review handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tonewood_core::booking::Booking;
use tonewood_core::{BookingId, BookingStatus};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery, StatusFilter, StatusUpdate};
use crate::db::BookingRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingList {
    bookings: Vec<Booking>,
}

/// `GET /api/bookings?status=`
///
/// Bookings in appointment order, optionally filtered by status.
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StatusFilter<BookingStatus>>,
) -> Result<Json<BookingList>> {
    let bookings = BookingRepository::new(state.pool())
        .list(filter.status)
        .await?;
    Ok(Json(BookingList { bookings }))
}

/// `PATCH /api/bookings/{id}`
///
/// Cancelling frees the time slot for new bookings.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BookingId>,
    ApiJson(body): ApiJson<StatusUpdate<BookingStatus>>,
) -> Result<Json<Booking>> {
    let booking = BookingRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;
    Ok(Json(booking))
}
