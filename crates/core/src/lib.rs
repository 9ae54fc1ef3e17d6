//! `ridebook-core` — shared vocabulary of the booking backend contract.
//!
//! Identifiers, the pagination contract and resource shapes live here so the
//! auth and client crates agree on them. No IO.

pub mod error;
pub mod id;
pub mod models;
pub mod page;

pub use error::{DomainError, DomainResult};
pub use id::{BookingId, DriverId, RideId, RouteId, ScheduleId, UserId, VehicleId};
pub use models::{Booking, BookingStatus, Driver, NewBooking, Ride, RideStatus, Route, Schedule, Vehicle};
pub use page::{Page, PageQuery, SizeParam};
