//! Registry of every resource instance the screens render.
//!
//! Each entry is declared once; the macro generates the handle struct, the
//! closed `ResourceKey` / `ResourceAction` enums and their exhaustive dispatch.

use ridebook_core::{Booking, Driver, Page, Ride, Route, Schedule, Vehicle};

use crate::api::UserAccount;
use crate::resource::{Resource, ResourceEvent};

macro_rules! resource_registry {
    ($( $field:ident : $ty:ty => $variant:ident, $fallback:literal; )+) => {
        /// One handle per resource instance.
        #[derive(Debug, Clone)]
        pub struct Resources {
            $( pub $field: Resource<$ty>, )+
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ResourceKey {
            $( $variant, )+
        }

        /// A transition addressed to one resource instance.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ResourceAction {
            $( $variant(ResourceEvent<$ty>), )+
        }

        impl ResourceKey {
            pub const ALL: &'static [ResourceKey] = &[ $( ResourceKey::$variant, )+ ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( ResourceKey::$variant => stringify!($field), )+
                }
            }
        }

        impl ResourceAction {
            pub fn key(&self) -> ResourceKey {
                match self {
                    $( ResourceAction::$variant(_) => ResourceKey::$variant, )+
                }
            }
        }

        impl Resources {
            pub fn new() -> Self {
                Self {
                    $( $field: Resource::new(stringify!($field), $fallback), )+
                }
            }

            /// Route a transition to its resource. Returns `false` if it was stale.
            pub fn dispatch(&self, action: ResourceAction) -> bool {
                match action {
                    $( ResourceAction::$variant(event) => self.$field.dispatch(event), )+
                }
            }

            pub fn reset(&self, key: ResourceKey) {
                match key {
                    $( ResourceKey::$variant => self.$field.reset(), )+
                }
            }

            pub fn reset_all(&self) {
                $( self.$field.reset(); )+
            }

            pub fn is_loading(&self, key: ResourceKey) -> bool {
                match key {
                    $( ResourceKey::$variant => self.$field.state().loading(), )+
                }
            }

            pub fn error(&self, key: ResourceKey) -> Option<String> {
                match key {
                    $( ResourceKey::$variant => self.$field.state().error().map(str::to_string), )+
                }
            }
        }

        impl Default for Resources {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

resource_registry! {
    drivers: Page<Driver> => Drivers, "Failed to load drivers";
    driver: Driver => Driver, "Failed to load driver";
    driver_mutation: Driver => DriverMutation, "Failed to save driver";
    vehicles: Page<Vehicle> => Vehicles, "Failed to load vehicles";
    vehicle: Vehicle => Vehicle, "Failed to load vehicle";
    vehicle_mutation: Vehicle => VehicleMutation, "Failed to save vehicle";
    routes: Page<Route> => Routes, "Failed to load routes";
    route: Route => Route, "Failed to load route";
    route_mutation: Route => RouteMutation, "Failed to save route";
    rides: Page<Ride> => Rides, "Failed to load rides";
    ride: Ride => Ride, "Failed to load ride";
    ride_mutation: Ride => RideMutation, "Failed to save ride";
    ride_search: Page<Ride> => RideSearch, "No rides could be found";
    schedules: Page<Schedule> => Schedules, "Failed to load schedules";
    schedule_mutation: Schedule => ScheduleMutation, "Failed to save schedule";
    users: Page<UserAccount> => Users, "Failed to load users";
    user: UserAccount => User, "Failed to load user";
    user_mutation: UserAccount => UserMutation, "Failed to save user";
    bookings: Page<Booking> => Bookings, "Failed to load bookings";
    booking: Booking => Booking, "Failed to load booking";
    my_bookings: Page<Booking> => MyBookings, "Failed to load your bookings";
    booking_confirmation: Booking => BookingConfirmation, "Booking could not be completed";
}

#[cfg(test)]
mod tests {
    use ridebook_core::{DriverId, Page};

    use super::*;
    use crate::resource::FetchSeq;

    fn driver() -> Driver {
        Driver {
            id: DriverId::from(1),
            name: "Yaw".into(),
            phone: None,
            license_number: None,
            active: true,
        }
    }

    #[test]
    fn keys_are_unique_and_named_after_fields() {
        let names: std::collections::BTreeSet<&str> =
            ResourceKey::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ResourceKey::ALL.len());
        assert!(names.contains("booking_confirmation"));
    }

    #[tokio::test]
    async fn dispatch_routes_to_the_addressed_resource() {
        let resources = Resources::new();
        let outcome = resources.driver.fetch(async { Ok(driver()) }).await;
        assert!(outcome.is_applied());

        // A stale event addressed to `driver` leaves it untouched.
        let stale = ResourceAction::Driver(ResourceEvent::Rejected(first_seq(), "x".into()));
        assert_eq!(stale.key(), ResourceKey::Driver);
        assert!(!resources.dispatch(stale));
        assert_eq!(resources.driver.state().data(), Some(&driver()));

        assert!(resources.dispatch(ResourceAction::Driver(ResourceEvent::Reset)));
        assert!(resources.driver.state().is_idle());
    }

    #[tokio::test]
    async fn reset_all_clears_every_instance() {
        let resources = Resources::new();
        resources
            .drivers
            .fetch(async {
                Ok(Page {
                    data: vec![driver()],
                    total: 1,
                    page: 1,
                    limit: 10,
                })
            })
            .await;
        resources
            .my_bookings
            .fetch(async { Err(crate::ClientError::unauthenticated()) })
            .await;
        assert!(resources.error(ResourceKey::MyBookings).is_some());

        resources.reset_all();
        for key in ResourceKey::ALL {
            assert!(!resources.is_loading(*key));
            assert!(resources.error(*key).is_none());
        }
        assert!(resources.drivers.state().is_idle());
    }

    fn first_seq() -> FetchSeq {
        let mut m = crate::resource::ResourceMachine::<()>::default();
        m.begin()
    }
}
