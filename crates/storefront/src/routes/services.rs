//! Service desk handlers: listing, detail and slot availability.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tonewood_core::ServiceId;
use tonewood_core::ValidationErrors;
use tonewood_core::booking::{BOOKING_WINDOW_DAYS, OpeningHours, SlotAvailability};
use tonewood_core::catalog::Service;
use tonewood_core::listing::{self, ListingParams, MAX_LIMIT, Pagination};
use tracing::instrument;

use super::{ApiPath, ApiQuery};
use crate::db::BookingRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Serialize)]
struct ServiceList<'a> {
    services: Vec<&'a Service>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Availability {
    service_id: ServiceId,
    date: NaiveDate,
    duration_minutes: i32,
    slots: Vec<SlotAvailability>,
}

/// `GET /api/services`
///
/// Only active services unless `isActive=false` is passed. Without a
/// `limit` the first [`MAX_LIMIT`] services come back in one page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> Result<Response> {
    let mut query = params.into_query(Some(true))?;
    if query.limit == 0 {
        query.limit = MAX_LIMIT;
    }
    let services = state.catalog().services(state.pool()).await?;
    let page = listing::list(services.iter(), &query);

    Ok(Json(ServiceList {
        services: page.items,
        pagination: page.pagination,
    })
    .into_response())
}

/// `GET /api/services/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
) -> Result<Json<Service>> {
    state
        .catalog()
        .active_service(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))
}

/// Parse a requested day and check it can be booked from `today`.
fn bookable_date(raw: Option<&str>, today: NaiveDate) -> std::result::Result<NaiveDate, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let last = today.checked_add_days(Days::new(BOOKING_WINDOW_DAYS));

    match raw.map(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")) {
        None => errors.add("date", "is required"),
        Some(Err(_)) => errors.add("date", "must be a date in YYYY-MM-DD format"),
        Some(Ok(date)) if date < today => errors.add("date", "cannot be in the past"),
        Some(Ok(date)) if last.is_some_and(|last| date > last) => {
            errors.add("date", format!("must be within {BOOKING_WINDOW_DAYS} days"));
        }
        Some(Ok(date)) => return Ok(date),
    }
    Err(errors)
}

/// `GET /api/services/{id}/availability?date=YYYY-MM-DD`
///
/// Every start time that leaves room for the service before closing, marked
/// unavailable when a booking already holds it.
#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
    ApiQuery(params): ApiQuery<AvailabilityParams>,
) -> Result<Response> {
    let date = bookable_date(params.date.as_deref(), Utc::now().date_naive())?;
    let service = state
        .catalog()
        .active_service(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;

    let taken = BookingRepository::new(state.pool())
        .taken_slots(id, date)
        .await?;
    let duration = u32::try_from(service.duration_minutes).unwrap_or(0);
    let slots = OpeningHours::default().availability(duration, &taken);

    Ok(Json(Availability {
        service_id: id,
        date,
        duration_minutes: service.duration_minutes,
        slots,
    })
    .into_response())
}
