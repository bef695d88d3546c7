//! Service administration handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tonewood_core::ServiceId;
use tonewood_core::catalog::{Service, ServiceInput};
use tonewood_core::listing::{self, ListingParams, Pagination};
use tracing::instrument;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::ServiceRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ServiceList {
    services: Vec<Service>,
    pagination: Pagination,
}

/// `GET /api/services`
#[instrument(skip(state, _admin))]
pub async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> Result<Json<ServiceList>> {
    let query = params.into_query(None)?;
    let services = ServiceRepository::new(state.pool()).list_all().await?;
    let page = listing::list(services.iter(), &query).map(Clone::clone);

    Ok(Json(ServiceList {
        services: page.items,
        pagination: page.pagination,
    }))
}

/// `GET /api/services/{id}`
#[instrument(skip(state, _admin))]
pub async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
) -> Result<Json<Service>> {
    ServiceRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))
}

/// `POST /api/services`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ServiceInput>,
) -> Result<(StatusCode, Json<Service>)> {
    let draft = input.validate()?;
    let service = ServiceRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(service_id = %service.id, "Service created");
    Ok((StatusCode::CREATED, Json(service)))
}

/// `PUT /api/services/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
    ApiJson(input): ApiJson<ServiceInput>,
) -> Result<Json<Service>> {
    let draft = input.validate()?;
    let service = ServiceRepository::new(state.pool()).update(id, &draft).await?;
    tracing::info!("Service updated");
    Ok(Json(service))
}

/// `DELETE /api/services/{id}`
///
/// Refused with 409 once the service has bookings.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ServiceId>,
) -> Result<StatusCode> {
    ServiceRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Service deleted");
    Ok(StatusCode::NO_CONTENT)
}
