//! Appointment booking handler.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tonewood_core::ValidationErrors;
use tonewood_core::booking::{Booking, BookingRequest, OpeningHours};
use tracing::instrument;

use super::ApiJson;
use crate::db::BookingRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// `POST /api/bookings`
///
/// 201 with the pending booking, 422 with field errors, or 409 when the
/// slot is already held for that service and date.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>)> {
    let hours = OpeningHours::default();
    let booking = request.validate(Utc::now().date_naive(), &hours)?;

    let service = state
        .catalog()
        .active_service(state.pool(), booking.service_id)
        .await?;
    let Some(service) = service else {
        let mut errors = ValidationErrors::new();
        errors.add("serviceId", "is not an available service");
        return Err(AppError::Validation(errors));
    };

    let duration = u32::try_from(service.duration_minutes).unwrap_or(u32::MAX);
    if !hours.fits(booking.time, duration) {
        let mut errors = ValidationErrors::new();
        errors.add(
            "time",
            format!(
                "leaves no room for a {duration}-minute appointment before {}",
                hours.close.format("%H:%M")
            ),
        );
        return Err(AppError::Validation(errors));
    }

    let created = BookingRepository::new(state.pool()).create(&booking).await?;

    add_breadcrumb(
        "booking",
        "Booking created",
        Some(&[("service_id", &service.id.to_string())]),
    );
    tracing::info!(
        booking_id = %created.id,
        service = %service.name,
        date = %created.appointment_date,
        time = %created.appointment_time,
        "Booking created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Days, Utc};
    use serde_json::json;

    use crate::routes::test_support::Client;

    fn tomorrow() -> String {
        Utc::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn body(service_id: i64, time: &str) -> serde_json::Value {
        json!({
            "serviceId": service_id,
            "customerName": "Robin Vega",
            "email": "robin@example.com",
            "phone": "+1 (555) 010-2030",
            "date": tomorrow(),
            "time": time,
            "instrument": "1972 Telecaster"
        })
    }

    #[tokio::test]
    async fn test_missing_fields_are_reported() {
        let mut client = Client::new().await;
        let (status, body) = client.send("POST", "/api/bookings", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        for field in ["serviceId", "customerName", "email", "phone", "date", "time"] {
            assert!(body["fields"][field].is_array(), "{field} should be reported");
        }
    }

    #[tokio::test]
    async fn test_inactive_service_is_rejected() {
        let mut client = Client::new().await;
        let (status, body) = client
            .send("POST", "/api/bookings", Some(body(3, "11:00")))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["serviceId"][0], "is not an available service");
    }

    #[tokio::test]
    async fn test_slot_must_fit_before_closing() {
        let mut client = Client::new().await;
        // Fret level takes two hours
        let (status, body) = client
            .send("POST", "/api/bookings", Some(body(2, "17:00")))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["time"][0].as_str().unwrap().contains("120-minute"));
    }

    #[tokio::test]
    async fn test_off_grid_time_is_rejected() {
        let mut client = Client::new().await;
        let (status, body) = client
            .send("POST", "/api/bookings", Some(body(1, "10:15")))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["time"].is_array());
    }
}
