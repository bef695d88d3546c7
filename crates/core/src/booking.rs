//! Service appointment booking: request validation and time slots.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BookingId, BookingStatus, Email, Phone, ServiceId};
use crate::validation::ValidationErrors;

/// How far ahead appointments can be made.
pub const BOOKING_WINDOW_DAYS: u64 = 90;

/// Shop opening hours and slot granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
        }
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

impl OpeningHours {
    /// Whether `time` is a slot boundary inside opening hours.
    #[must_use]
    pub fn is_slot(&self, time: NaiveTime) -> bool {
        let minutes = minutes_of(time);
        time.second() == 0
            && time >= self.open
            && time < self.close
            && (minutes - minutes_of(self.open)) % self.slot_minutes == 0
    }

    /// Whether a service of `duration_minutes` starting at `time` ends by
    /// closing time.
    #[must_use]
    pub fn fits(&self, time: NaiveTime, duration_minutes: u32) -> bool {
        self.is_slot(time) && minutes_of(time) + duration_minutes <= minutes_of(self.close)
    }

    /// Every start time that leaves room for `duration_minutes`.
    #[must_use]
    pub fn slots_for(&self, duration_minutes: u32) -> Vec<NaiveTime> {
        let close = minutes_of(self.close);
        (minutes_of(self.open)..close)
            .step_by(self.slot_minutes.max(1) as usize)
            .filter(|start| start + duration_minutes <= close)
            .filter_map(|start| NaiveTime::from_hms_opt(start / 60, start % 60, 0))
            .collect()
    }

    /// Slots for a day with availability given the slots already taken.
    #[must_use]
    pub fn availability(&self, duration_minutes: u32, taken: &[NaiveTime]) -> Vec<SlotAvailability> {
        self.slots_for(duration_minutes)
            .into_iter()
            .map(|time| SlotAvailability {
                time: time.format("%H:%M").to_string(),
                available: !taken.contains(&time),
            })
            .collect()
    }
}

/// One bookable start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub time: String,
    pub available: bool,
}

/// Booking form submission.
///
/// Date and time arrive as text (`YYYY-MM-DD`, `HH:MM`) so malformed values
/// surface as field errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub service_id: Option<ServiceId>,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub service_id: ServiceId,
    pub customer_name: String,
    pub email: Email,
    pub phone: Phone,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub instrument: Option<String>,
    pub notes: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl BookingRequest {
    pub const MAX_NOTES: usize = 2000;

    /// Validate against `today` (shop-local date) and the opening hours.
    ///
    /// The service duration is checked separately with
    /// [`OpeningHours::fits`] once the service is loaded.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn validate(
        &self,
        today: NaiveDate,
        hours: &OpeningHours,
    ) -> Result<ValidBooking, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.add_if(self.service_id.is_none(), "serviceId", "is required");
        errors.require_text("customerName", &self.customer_name, 200);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let phone = Phone::parse(&self.phone)
            .map_err(|e| errors.add("phone", e.to_string()))
            .ok();

        let date = match NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d") {
            Err(_) => {
                errors.add("date", "must be a date in YYYY-MM-DD format");
                None
            }
            Ok(date) if date < today => {
                errors.add("date", "cannot be in the past");
                None
            }
            Ok(date) if today
                .checked_add_days(Days::new(BOOKING_WINDOW_DAYS))
                .is_some_and(|last| date > last) =>
            {
                errors.add(
                    "date",
                    format!("must be within {BOOKING_WINDOW_DAYS} days"),
                );
                None
            }
            Ok(date) => Some(date),
        };

        let time = match NaiveTime::parse_from_str(self.time.trim(), "%H:%M") {
            Ok(time) if hours.is_slot(time) => Some(time),
            Ok(_) => {
                errors.add(
                    "time",
                    format!(
                        "must be a {}-minute slot between {} and {}",
                        hours.slot_minutes,
                        hours.open.format("%H:%M"),
                        hours.close.format("%H:%M")
                    ),
                );
                None
            }
            Err(_) => {
                errors.add("time", "must be a time in HH:MM format");
                None
            }
        };

        errors.limit_text("instrument", self.instrument.as_deref(), 200);
        errors.limit_text("notes", self.notes.as_deref(), Self::MAX_NOTES);

        let (Some(service_id), Some(email), Some(phone), Some(date), Some(time), true) = (
            self.service_id,
            email,
            phone,
            date,
            time,
            errors.is_empty(),
        ) else {
            return Err(errors);
        };

        Ok(ValidBooking {
            service_id,
            customer_name: self.customer_name.trim().to_owned(),
            email,
            phone,
            date,
            time,
            instrument: trimmed(self.instrument.as_deref()),
            notes: trimmed(self.notes.as_deref()),
        })
    }
}

/// A booking as stored in `shop.bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub service_id: ServiceId,
    pub customer_name: String,
    pub email: Email,
    pub phone: Phone,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub instrument: Option<String>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn request() -> BookingRequest {
        BookingRequest {
            service_id: Some(ServiceId::new(3)),
            customer_name: " Alex Chen ".to_owned(),
            email: "alex@example.com".to_owned(),
            phone: "(615) 555-0199".to_owned(),
            date: "2025-06-10".to_owned(),
            time: "14:30".to_owned(),
            instrument: Some("1978 Les Paul Custom".to_owned()),
            notes: Some("   ".to_owned()),
        }
    }

    #[test]
    fn test_valid_booking() {
        let valid = request().validate(today(), &OpeningHours::default()).unwrap();
        assert_eq!(valid.customer_name, "Alex Chen");
        assert_eq!(valid.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(valid.notes, None);
    }

    #[test]
    fn test_date_rules() {
        let hours = OpeningHours::default();
        for (date, expect_error) in [
            ("2025-06-01", true),
            ("2025-06-02", false),
            ("2025-08-31", false),
            ("2025-09-01", true),
            ("06/10/2025", true),
        ] {
            let req = BookingRequest {
                date: date.to_owned(),
                ..request()
            };
            let result = req.validate(today(), &hours);
            assert_eq!(
                result.as_ref().err().is_some_and(|e| e.has("date")),
                expect_error,
                "{date}"
            );
        }
    }

    #[test]
    fn test_time_rules() {
        let hours = OpeningHours::default();
        for time in ["09:30", "18:00", "14:15", "2pm"] {
            let req = BookingRequest {
                time: time.to_owned(),
                ..request()
            };
            assert!(req.validate(today(), &hours).unwrap_err().has("time"), "{time}");
        }
    }

    #[test]
    fn test_notes_limit_and_missing_fields() {
        let req = BookingRequest {
            service_id: None,
            phone: "12".to_owned(),
            notes: Some("x".repeat(BookingRequest::MAX_NOTES + 1)),
            ..request()
        };
        let errors = req
            .validate(today(), &OpeningHours::default())
            .unwrap_err();
        assert!(errors.has("serviceId"));
        assert!(errors.has("phone"));
        assert!(errors.has("notes"));
    }

    #[test]
    fn test_slots_leave_room_for_duration() {
        let hours = OpeningHours::default();
        assert_eq!(hours.slots_for(30).len(), 16);
        let long = hours.slots_for(120);
        assert_eq!(long.last().unwrap(), &NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert!(hours.fits(NaiveTime::from_hms_opt(16, 0, 0).unwrap(), 120));
        assert!(!hours.fits(NaiveTime::from_hms_opt(16, 30, 0).unwrap(), 120));
    }

    #[test]
    fn test_availability_marks_taken() {
        let hours = OpeningHours::default();
        let taken = [NaiveTime::from_hms_opt(10, 0, 0).unwrap()];
        let slots = hours.availability(60, &taken);
        assert_eq!(slots.first().unwrap().time, "10:00");
        assert!(!slots.first().unwrap().available);
        assert!(slots.iter().skip(1).all(|s| s.available));
    }
}
