//! Resource shapes exchanged with the booking backend.
//!
//! Field names follow the backend's camelCase JSON. Optional fields default so
//! older payloads still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{BookingId, DriverId, RideId, RouteId, ScheduleId, UserId, VehicleId};

/// Most seats a single booking may reserve.
pub const MAX_SEATS_PER_BOOKING: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    /// Inactive drivers stay on record but cannot be assigned to rides.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate_number: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Passenger seats.
    pub capacity: u32,
    /// Driver normally assigned to this vehicle.
    #[serde(default)]
    pub driver_id: Option<DriverId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: RouteId,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Default fare for rides on this route, in the backend's currency.
    #[serde(default)]
    pub base_fare: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Scheduled,
    Boarding,
    Departed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub route_id: RouteId,
    #[serde(default)]
    pub vehicle_id: Option<VehicleId>,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
    pub departure_at: DateTime<Utc>,
    /// Seats still open for booking.
    pub available_seats: u32,
    /// Price per seat.
    pub fare: f64,
    pub status: RideStatus,
}

impl Ride {
    /// Scheduled and not sold out.
    pub fn is_bookable(&self) -> bool {
        self.status == RideStatus::Scheduled && self.available_seats > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub route_id: RouteId,
    /// Local departure time, `HH:MM`.
    pub departure_time: String,
    #[serde(default)]
    pub days: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub ride_id: RideId,
    /// Account that made the booking; absent for counter bookings.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub passenger_name: String,
    /// Seats reserved by this booking.
    pub seats: u32,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Booking request submitted from the public booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub ride_id: RideId,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub seats: u32,
}

impl NewBooking {
    /// Inline validation run before the request is sent.
    pub fn validate(&self) -> DomainResult<()> {
        if self.passenger_name.trim().is_empty() {
            return Err(DomainError::validation("passenger name is required"));
        }
        let digits = self.passenger_phone.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 7 {
            return Err(DomainError::validation("passenger phone number is too short"));
        }
        if self.seats == 0 || self.seats > MAX_SEATS_PER_BOOKING {
            return Err(DomainError::validation(format!(
                "seats must be between 1 and {MAX_SEATS_PER_BOOKING}"
            )));
        }
        Ok(())
    }
}
