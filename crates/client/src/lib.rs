//! `ridebook-client` — session-aware access to the ride booking backend.
//!
//! Owns the single session, sends every request through the refreshing
//! transport and keeps one state machine per remote resource the views read.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
mod refresh;
pub mod resource;
pub mod resources;
pub mod session;
pub mod transport;

pub use api::{
    Api, AuthResponse, LoginCredentials, NewUser, Registration, ResourceKind, RideSearch,
    UserAccount,
};
pub use client::BookingClient;
pub use config::{ClientConfig, DEV_API_URL};
pub use error::{ClientError, ClientResult};
pub use oauth::{OAuthCallback, parse_callback};
pub use resource::{FetchOutcome, FetchSeq, Resource, ResourceEvent, ResourceMachine, ResourceState};
pub use resources::{ResourceAction, ResourceKey, Resources};
pub use session::{AccessToken, Session, SessionPhase, SessionStore};
pub use transport::{ApiRequest, ApiResponse, Attempt, Credentials, Transport};
