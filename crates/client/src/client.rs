//! Client façade: one session, one transport, one resource registry.

use std::sync::Arc;

use serde::Serialize;

use ridebook_auth::{GateDecision, Identity, PermissionRequest, RouteGuard};
use ridebook_core::{
    BookingId, DriverId, NewBooking, PageQuery, RideId, RouteId, ScheduleId, UserId, VehicleId,
};

use crate::api::{
    Api, AuthResponse, LoginCredentials, NewUser, Registration, ResourceKind, RideSearch,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::oauth::parse_callback;
use crate::resource::FetchOutcome;
use crate::resources::Resources;
use crate::session::{AccessToken, SessionStore};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct BookingClient {
    transport: Arc<Transport>,
    api: Api,
    resources: Arc<Resources>,
}

impl BookingClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = Arc::new(Transport::new(Arc::new(config), SessionStore::new())?);
        Ok(Self {
            api: Api::new(Arc::clone(&transport)),
            transport,
            resources: Arc::new(Resources::new()),
        })
    }

    pub fn session(&self) -> &SessionStore {
        self.transport.session()
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn check_route(&self, guard: RouteGuard, path: &str) -> GateDecision {
        self.session().check(guard, path)
    }

    /// Resolve who is signed in at startup.
    ///
    /// The session leaves `Resolving` whatever the outcome; any failure means
    /// anonymous.
    pub async fn bootstrap(&self) -> Option<Identity> {
        self.session().begin_resolution();

        let resolved = match self.api.whoami().await {
            Ok(claims) => claims.validate().map_err(ClientError::from),
            Err(err) => Err(err),
        };
        // A cookie-only session has no access token yet; mint one.
        let token = match resolved {
            Ok(identity) => match self.session().access_token() {
                Some(token) => Ok((identity, token)),
                None => self
                    .transport
                    .refresh_session()
                    .await
                    .and_then(|()| {
                        self.session().access_token().ok_or_else(ClientError::unauthenticated)
                    })
                    .map(|token| (identity, token)),
            },
            Err(err) => Err(err),
        };

        match token {
            Ok((identity, token)) => {
                self.session().establish(identity.clone(), token);
                Some(identity)
            }
            Err(err) => {
                tracing::info!(error = %err, "no active session");
                self.session().clear();
                None
            }
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> ClientResult<Identity> {
        let response = self.api.login(credentials).await?;
        self.establish(response)
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<Identity> {
        let response = self.api.register(registration).await?;
        self.establish(response)
    }

    fn establish(&self, response: AuthResponse) -> ClientResult<Identity> {
        let identity = response.user.validate()?;
        let token = AccessToken::new(response.access_token)
            .ok_or_else(|| ClientError::Decode("empty access token".into()))?;
        self.resources.reset_all();
        self.session().establish(identity.clone(), token);
        Ok(identity)
    }

    /// Finish an OAuth sign-in from the redirect URL.
    pub fn complete_oauth(&self, callback_url: &str) -> ClientResult<Identity> {
        let callback = parse_callback(callback_url)?;
        self.resources.reset_all();
        self.session()
            .establish(callback.identity.clone(), callback.access_token);
        Ok(callback.identity)
    }

    /// Sign out. The local session is cleared even if the backend call fails.
    pub async fn logout(&self) {
        if let Err(err) = self.api.logout().await {
            tracing::warn!(error = %err, "backend logout failed; clearing local session anyway");
        }
        self.session().clear();
        self.resources.reset_all();
    }

    pub async fn fetch_drivers(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .drivers
            .fetch(self.api.list(ResourceKind::Drivers, query))
            .await
    }

    pub async fn load_driver(&self, id: &DriverId) -> FetchOutcome {
        self.resources
            .driver
            .fetch(self.api.get(ResourceKind::Drivers, id))
            .await
    }

    /// Create (`id: None`) or update a driver.
    pub async fn save_driver<B: Serialize>(&self, id: Option<&DriverId>, body: &B) -> FetchOutcome {
        let resource = &self.resources.driver_mutation;
        match id {
            Some(id) => resource.fetch(self.api.update(ResourceKind::Drivers, id, body)).await,
            None => resource.fetch(self.api.create(ResourceKind::Drivers, body)).await,
        }
    }

    pub async fn fetch_vehicles(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .vehicles
            .fetch(self.api.list(ResourceKind::Vehicles, query))
            .await
    }

    pub async fn load_vehicle(&self, id: &VehicleId) -> FetchOutcome {
        self.resources
            .vehicle
            .fetch(self.api.get(ResourceKind::Vehicles, id))
            .await
    }

    pub async fn save_vehicle<B: Serialize>(&self, id: Option<&VehicleId>, body: &B) -> FetchOutcome {
        let resource = &self.resources.vehicle_mutation;
        match id {
            Some(id) => resource.fetch(self.api.update(ResourceKind::Vehicles, id, body)).await,
            None => resource.fetch(self.api.create(ResourceKind::Vehicles, body)).await,
        }
    }

    pub async fn fetch_routes(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .routes
            .fetch(self.api.list(ResourceKind::Routes, query))
            .await
    }

    pub async fn load_route(&self, id: &RouteId) -> FetchOutcome {
        self.resources
            .route
            .fetch(self.api.get(ResourceKind::Routes, id))
            .await
    }

    pub async fn save_route<B: Serialize>(&self, id: Option<&RouteId>, body: &B) -> FetchOutcome {
        let resource = &self.resources.route_mutation;
        match id {
            Some(id) => resource.fetch(self.api.update(ResourceKind::Routes, id, body)).await,
            None => resource.fetch(self.api.create(ResourceKind::Routes, body)).await,
        }
    }

    pub async fn fetch_rides(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .rides
            .fetch(self.api.list(ResourceKind::Rides, query))
            .await
    }

    pub async fn load_ride(&self, id: &RideId) -> FetchOutcome {
        self.resources
            .ride
            .fetch(self.api.get(ResourceKind::Rides, id))
            .await
    }

    pub async fn save_ride<B: Serialize>(&self, id: Option<&RideId>, body: &B) -> FetchOutcome {
        let resource = &self.resources.ride_mutation;
        match id {
            Some(id) => resource.fetch(self.api.update(ResourceKind::Rides, id, body)).await,
            None => resource.fetch(self.api.create(ResourceKind::Rides, body)).await,
        }
    }

    pub async fn search_rides(&self, search: &RideSearch) -> FetchOutcome {
        self.resources
            .ride_search
            .fetch(self.api.search_rides(search))
            .await
    }

    pub async fn fetch_schedules(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .schedules
            .fetch(self.api.list(ResourceKind::Schedules, query))
            .await
    }

    pub async fn save_schedule<B: Serialize>(
        &self,
        id: Option<&ScheduleId>,
        body: &B,
    ) -> FetchOutcome {
        let resource = &self.resources.schedule_mutation;
        match id {
            Some(id) => resource.fetch(self.api.update(ResourceKind::Schedules, id, body)).await,
            None => resource.fetch(self.api.create(ResourceKind::Schedules, body)).await,
        }
    }

    pub async fn fetch_users(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .users
            .fetch(self.api.list(ResourceKind::Users, query))
            .await
    }

    pub async fn load_user(&self, id: &UserId) -> FetchOutcome {
        self.resources
            .user
            .fetch(self.api.get(ResourceKind::Users, id))
            .await
    }

    pub async fn create_user(&self, user: &NewUser) -> FetchOutcome {
        self.resources
            .user_mutation
            .fetch(self.api.create_user(user))
            .await
    }

    pub async fn update_user_role(&self, id: &UserId, access: &PermissionRequest) -> FetchOutcome {
        self.resources
            .user_mutation
            .fetch(self.api.update_user_role(id, access))
            .await
    }

    pub async fn fetch_bookings(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .bookings
            .fetch(self.api.list(ResourceKind::Bookings, query))
            .await
    }

    pub async fn load_booking(&self, id: &BookingId) -> FetchOutcome {
        self.resources
            .booking
            .fetch(self.api.get(ResourceKind::Bookings, id))
            .await
    }

    pub async fn fetch_my_bookings(&self, query: &PageQuery) -> FetchOutcome {
        self.resources
            .my_bookings
            .fetch(self.api.my_bookings(query))
            .await
    }

    pub async fn create_booking(&self, booking: &NewBooking) -> FetchOutcome {
        self.resources
            .booking_confirmation
            .fetch(self.api.create_booking(booking))
            .await
    }

    pub async fn cancel_booking(&self, id: &BookingId) -> FetchOutcome {
        self.resources
            .booking
            .fetch(self.api.cancel_booking(id))
            .await
    }
}
