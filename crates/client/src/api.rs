//! Typed wrappers around the backend's REST endpoints.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ridebook_auth::{IdentityClaims, Permission, PermissionRequest, Role};
use ridebook_core::{
    Booking, BookingId, DomainError, NewBooking, Page, PageQuery, Ride, SizeParam, UserId,
};

use crate::error::{ClientError, ClientResult};
use crate::transport::{ApiRequest, Credentials, Transport};

/// Backend collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Drivers,
    Vehicles,
    Routes,
    Rides,
    Schedules,
    Users,
    Bookings,
}

impl ResourceKind {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Drivers => "drivers",
            ResourceKind::Vehicles => "vehicles",
            ResourceKind::Routes => "routes",
            ResourceKind::Rides => "rides",
            ResourceKind::Schedules => "schedules",
            ResourceKind::Users => "users",
            ResourceKind::Bookings => "bookings",
        }
    }

    /// Schedules and users are served by the older endpoints that read `perPage`.
    pub fn size_param(&self) -> SizeParam {
        match self {
            ResourceKind::Schedules | ResourceKind::Users => SizeParam::PerPage,
            _ => SizeParam::Limit,
        }
    }
}

/// Administrative view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Effective grants: the role's baseline plus any explicit overrides.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    /// Deactivated accounts cannot sign in.
    #[serde(default)]
    pub active: bool,
}

/// Payload of the create-user form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// At least 8 characters.
    pub password: String,
    /// Role and permission checklist, sent inline as `role` / `permissions`.
    #[serde(flatten)]
    pub access: PermissionRequest,
}

impl NewUser {
    pub fn validate(&self) -> ClientResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required").into());
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("email address is invalid").into());
        }
        if self.password.chars().count() < 8 {
            return Err(DomainError::validation("password must be at least 8 characters").into());
        }
        self.access.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Short-lived bearer token. The refresh token arrives as a cookie.
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    /// Unvalidated; see [`IdentityClaims::validate`].
    pub user: IdentityClaims,
}

/// Public ride search from the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RideSearch {
    pub origin: String,
    pub destination: String,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub page: PageQuery,
}

impl RideSearch {
    fn to_query(&self) -> ClientResult<PageQuery> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(DomainError::validation("origin and destination are required").into());
        }
        let mut query = self
            .page
            .clone()
            .with_filter("origin", self.origin.trim())
            .with_filter("destination", self.destination.trim());
        if let Some(date) = &self.date {
            query = query.with_filter("date", date.trim());
        }
        Ok(query)
    }
}

/// Endpoint wrappers. Each method is one transport call.
#[derive(Debug, Clone)]
pub struct Api {
    transport: Arc<Transport>,
}

impl Api {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// `GET {kind}` with pagination and filters.
    pub async fn list<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        query: &PageQuery,
    ) -> ClientResult<Page<T>> {
        let request = ApiRequest::get(kind.path()).query(query.to_pairs(kind.size_param()));
        self.transport.send_json(&request).await
    }

    /// `GET {kind}/{id}`
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        id: &impl core::fmt::Display,
    ) -> ClientResult<T> {
        let request = ApiRequest::get(format!("{}/{}", kind.path(), id));
        self.transport.send_json(&request).await
    }

    pub async fn create<B, T>(&self, kind: ResourceKind, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(kind.path()).json(body)?;
        self.transport.send_json(&request).await
    }

    /// `PATCH {kind}/{id}` with a partial body.
    pub async fn update<B, T>(
        &self,
        kind: ResourceKind,
        id: &impl core::fmt::Display,
        body: &B,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::patch(format!("{}/{}", kind.path(), id)).json(body)?;
        self.transport.send_json(&request).await
    }

    pub async fn delete(&self, kind: ResourceKind, id: &impl core::fmt::Display) -> ClientResult<()> {
        let request = ApiRequest::delete(format!("{}/{}", kind.path(), id));
        self.transport.send(&request).await.map(|_| ())
    }

    pub async fn search_rides(&self, search: &RideSearch) -> ClientResult<Page<Ride>> {
        let query = search.to_query()?;
        let request = ApiRequest::get("rides/search").query(query.to_pairs(SizeParam::Limit));
        self.transport.send_json(&request).await
    }

    pub async fn my_bookings(&self, query: &PageQuery) -> ClientResult<Page<Booking>> {
        let request = ApiRequest::get("bookings/me").query(query.to_pairs(SizeParam::Limit));
        self.transport.send_json(&request).await
    }

    /// Validates locally before anything is sent.
    pub async fn create_booking(&self, booking: &NewBooking) -> ClientResult<Booking> {
        booking.validate()?;
        self.create(ResourceKind::Bookings, booking).await
    }

    pub async fn cancel_booking(&self, id: &BookingId) -> ClientResult<Booking> {
        let request = ApiRequest::patch(format!("bookings/{id}/cancel"));
        self.transport.send_json(&request).await
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<UserAccount> {
        user.validate()?;
        self.create(ResourceKind::Users, user).await
    }

    /// `PATCH users/{id}/role` with `{role, permissions}`.
    pub async fn update_user_role(
        &self,
        id: &UserId,
        access: &PermissionRequest,
    ) -> ClientResult<UserAccount> {
        access.validate()?;
        let request = ApiRequest::patch(format!("users/{id}/role")).json(access)?;
        self.transport.send_json(&request).await
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> ClientResult<AuthResponse> {
        let path = &self.transport.config().login_path;
        let request = ApiRequest::post(path.as_str())
            .json(credentials)?
            .credentials(Credentials::Cookie);
        self.transport.send_json(&request).await
    }

    pub async fn register(&self, registration: &Registration) -> ClientResult<AuthResponse> {
        let path = &self.transport.config().register_path;
        let request = ApiRequest::post(path.as_str())
            .json(registration)?
            .credentials(Credentials::Cookie);
        self.transport.send_json(&request).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        let path = &self.transport.config().logout_path;
        let request = ApiRequest::post(path.as_str()).credentials(Credentials::Cookie);
        self.transport.send(&request).await.map(|_| ())
    }

    /// Bootstrap "who am I" check, authenticated by cookie or bearer token.
    pub async fn whoami(&self) -> ClientResult<IdentityClaims> {
        let path = &self.transport.config().whoami_path;
        self.transport.send_json(&ApiRequest::get(path.as_str())).await
    }
}
