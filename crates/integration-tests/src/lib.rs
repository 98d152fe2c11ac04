//! Integration tests for GeekShop.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests, no database needed
//! cargo test -p geekshop-integration-tests
//!
//! # Database tests (each gets a fresh, migrated database)
//! DATABASE_URL=postgres://geekshop@localhost/geekshop \
//!     cargo test -p geekshop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_http` - Routing, auth and admin access through the full router
//! - `shop_database` - Repository behavior against `PostgreSQL`
//! - `pages_database` - Rendered pages through the full router against `PostgreSQL`
//!
//! `storefront_http` uses a lazy pool that never connects, so it only
//! reaches handlers that reject or render before touching the database.

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{HeaderValue, Request, Response, StatusCode, header},
    routing::get,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use geekshop_core::UserId;
use geekshop_storefront::{
    app,
    config::StorefrontConfig,
    middleware::{session_layer_with_store, set_current_user},
    models::CurrentUser,
    state::AppState,
};

/// Unreachable database; the pool is created lazily and never used.
const UNUSED_DATABASE_URL: &str = "postgres://geekshop@127.0.0.1:1/geekshop";

/// Route that logs the request in as a [`TestUser`].
pub const TEST_LOGIN_PATH: &str = "/__test/login/{role}";

/// Identities the test login route can assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestUser {
    /// Ordinary account.
    Shopper,
    /// Staff account without superuser rights.
    Staff,
    /// Superuser account.
    Superuser,
}

impl TestUser {
    const fn role(self) -> &'static str {
        match self {
            Self::Shopper => "shopper",
            Self::Staff => "staff",
            Self::Superuser => "superuser",
        }
    }

    fn from_role(role: &str) -> Option<Self> {
        [Self::Shopper, Self::Staff, Self::Superuser]
            .into_iter()
            .find(|user| user.role() == role)
    }

    /// The session identity for this user.
    #[must_use]
    pub fn current_user(self) -> CurrentUser {
        let (id, is_staff, is_superuser) = match self {
            Self::Shopper => (11, false, false),
            Self::Staff => (12, true, false),
            Self::Superuser => (13, true, true),
        };

        CurrentUser {
            id: UserId::new(id),
            username: self.role().to_string(),
            is_staff,
            is_superuser,
        }
    }
}

/// Application state around an unconnected pool.
///
/// # Panics
///
/// Panics if the lazy pool cannot be built.
#[must_use]
pub fn test_state() -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(UNUSED_DATABASE_URL)
        .expect("lazy pool should build");

    state_with_pool(pool)
}

/// Application state around `pool`.
///
/// # Panics
///
/// Panics if the built-in configuration is rejected.
#[must_use]
pub fn state_with_pool(pool: PgPool) -> AppState {
    let config = StorefrontConfig::from_lookup(|key| match key {
        "GEEKSHOP_DATABASE_URL" => Some(UNUSED_DATABASE_URL.to_string()),
        _ => None,
    })
    .expect("test configuration should parse");

    AppState::new(config, pool)
}

/// The storefront router with in-memory sessions and a test login route.
#[must_use]
pub fn test_app() -> Router {
    router(test_state())
}

/// Like [`test_app`], backed by a real database.
#[must_use]
pub fn test_app_with_pool(pool: PgPool) -> Router {
    router(state_with_pool(pool))
}

fn router(state: AppState) -> Router {
    let store = MemoryStore::default();

    let login = Router::new()
        .route(TEST_LOGIN_PATH, get(test_login))
        .layer(session_layer_with_store(store.clone(), false));

    app(state, session_layer_with_store(store, false)).merge(login)
}

async fn test_login(session: Session, Path(role): Path<String>) -> StatusCode {
    let Some(user) = TestUser::from_role(&role) else {
        return StatusCode::NOT_FOUND;
    };

    match set_current_user(&session, &user.current_user()).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Send one request through a clone of the router.
///
/// # Panics
///
/// Panics if the router fails, which axum routers never do.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

/// Log in as `user` and return the session cookie pair.
///
/// # Panics
///
/// Panics if the login route does not set a session cookie.
pub async fn login(app: &Router, user: TestUser) -> String {
    let path = TEST_LOGIN_PATH.replace("{role}", user.role());
    let response = send(app, get_request(&path, None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
        .expect("login should set a session cookie")
}

/// A GET request, optionally carrying a session cookie.
///
/// # Panics
///
/// Panics if `path` is not a valid URI.
#[must_use]
pub fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// A form POST request, optionally carrying a session cookie.
///
/// # Panics
///
/// Panics if `path` is not a valid URI.
#[must_use]
pub fn post_form(path: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).expect("valid request")
}

/// Mark a request as coming from the basket script.
#[must_use]
pub fn as_async(mut request: Request<Body>) -> Request<Body> {
    request.headers_mut().insert(
        "x-requested-with",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    request
}

/// Read a response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
