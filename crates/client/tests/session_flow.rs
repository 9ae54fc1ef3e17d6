//! Sign-in, bootstrap and sign-out flows as a view layer drives them.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ridebook_auth::{
    GateDecision, LANDING_ROUTE, LOGIN_ROUTE, Permission, Redirect, Role, RouteGuard,
};
use ridebook_client::{BookingClient, ClientConfig, ClientError, LoginCredentials, SessionPhase};
use ridebook_core::PageQuery;

fn client_for(server: &MockServer) -> BookingClient {
    let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();
    BookingClient::new(config).unwrap()
}

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "ama@example.com".into(),
        password: "hunter22".into(),
    }
}

#[tokio::test]
async fn plain_user_is_sent_away_from_admin_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ama@example.com", "password": "hunter22" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "t1",
            "user": { "id": 7, "email": "ama@example.com", "role": "USER" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = client.login(&credentials()).await.unwrap();

    assert_eq!(identity.role, Role::User);
    assert!(!identity.can(Permission::ViewDashboard));
    assert_eq!(
        client.check_route(RouteGuard::Role(Role::Admin), "/admin/users"),
        GateDecision::Redirect(Redirect {
            to: LANDING_ROUTE,
            return_to: None
        })
    );
    assert!(client.check_route(RouteGuard::Authenticated, "/bookings").is_render());
    assert_eq!(
        client.check_route(RouteGuard::GuestOnly, LOGIN_ROUTE),
        GateDecision::Redirect(Redirect {
            to: LANDING_ROUTE,
            return_to: None
        })
    );
}

#[tokio::test]
async fn wrong_password_does_not_trigger_a_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.login(&credentials()).await.unwrap_err();

    assert!(err.is_unauthenticated());
    assert_eq!(err.user_message("Sign-in failed"), "Invalid credentials");
    assert!(client.session().identity().is_none());
}

#[tokio::test]
async fn bootstrap_without_session_resolves_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.check_route(RouteGuard::Authenticated, "/bookings"),
        GateDecision::Loading
    );

    assert!(client.bootstrap().await.is_none());
    assert_eq!(client.session().phase(), SessionPhase::Resolved);
    assert_eq!(
        client.check_route(RouteGuard::Authenticated, "/bookings"),
        GateDecision::Redirect(Redirect {
            to: LOGIN_ROUTE,
            return_to: Some("/bookings".to_string())
        })
    );
}

#[tokio::test]
async fn bootstrap_with_refresh_cookie_mints_an_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u-9",
            "role": "OFFICER",
            "permissions": ["MANAGE_RIDES", "VIEW_REPORTS"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "cookie-minted" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = client.bootstrap().await.unwrap();

    assert_eq!(identity.role, Role::Officer);
    assert!(identity.can(Permission::ManageRides));
    assert!(!identity.can(Permission::ManageDrivers));
    assert_eq!(
        client.session().access_token().map(|t| t.expose().to_string()),
        Some("cookie-minted".to_string())
    );
    assert!(client.check_route(RouteGuard::Permission(Permission::ManageRides), "/rides").is_render());
}

#[tokio::test]
async fn gate_keeps_loading_while_bootstrap_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer minted"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 1, "role": "ADMIN" }))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "minted" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let midway = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        client.check_route(RouteGuard::Role(Role::Admin), "/admin")
    };
    let (identity, decision) = tokio::join!(client.bootstrap(), midway);

    assert_eq!(decision, GateDecision::Loading);
    assert_eq!(identity.map(|i| i.role), Some(Role::Admin));
    assert!(client.check_route(RouteGuard::Role(Role::Admin), "/admin").is_render());
}

#[tokio::test]
async fn logout_clears_session_and_resources_even_if_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "t1",
            "user": { "id": 2, "role": "BOOKER" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bookings/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "total": 0,
            "page": 1,
            "perPage": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login(&credentials()).await.unwrap();
    assert!(client.fetch_my_bookings(&PageQuery::default()).await.is_applied());
    assert!(client.resources().my_bookings.state().data().is_some());

    client.logout().await;

    assert!(client.session().identity().is_none());
    assert!(client.resources().my_bookings.state().is_idle());
    assert_eq!(
        client.check_route(RouteGuard::Authenticated, "/bookings"),
        GateDecision::Redirect(Redirect {
            to: LOGIN_ROUTE,
            return_to: Some("/bookings".to_string())
        })
    );
}

#[tokio::test]
async fn oauth_callback_establishes_the_session() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let user = "%7B%22id%22%3A5%2C%22role%22%3A%22ADMIN%22%7D";
    let identity = client
        .complete_oauth(&format!("/oauth/callback?token=oauth-token&refresh_token=rt&user={user}"))
        .unwrap();

    assert!(identity.is_admin());
    assert_eq!(client.session().phase(), SessionPhase::Resolved);
    assert!(client.check_route(RouteGuard::Role(Role::Admin), "/admin").is_render());

    assert!(matches!(
        client.complete_oauth("/oauth/callback?token=&user=x"),
        Err(ClientError::InvalidCallback(_))
    ));
}
