//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Landing page (first 4 products)
//! GET  /contact/                        - Contact page
//!
//! # Catalog
//! GET  /products/                       - Random featured product + related
//! GET  /products/{category_id}/         - Category listing (0 = all)
//! GET  /products/{product_id}/detail    - Product detail
//!
//! # Basket
//! GET  /basket/                         - Basket page (empty for anonymous)
//! GET|POST /basket/add/{product_id}/    - Add one unit, redirect back
//! GET|POST /basket/remove/{line_id}/    - Remove line, redirect back
//! GET|POST /basket/edit/{line_id}/{qty}/ - Set quantity, JSON (async only)
//!
//! # Auth
//! GET|POST /auth/login/                 - Login
//! GET|POST /auth/register/              - Registration
//! GET|POST /auth/logout/                - Logout
//!
//! # Admin (superuser)
//! GET  /admin/                          - Redirect to /admin/users/
//! GET  /admin/{resource}/               - List
//! GET|POST /admin/{resource}/create/    - Create
//! GET|POST /admin/{resource}/{id}/update/ - Update
//! GET|POST /admin/{resource}/{id}/delete/ - Soft delete
//! ```

pub mod admin;
pub mod auth;
pub mod basket;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::get,
};

use crate::db::{BasketRepository, CategoryRepository};
use crate::error::Result;
use crate::models::{BasketSummary, Category, CurrentUser};
use crate::state::AppState;

/// Data every storefront page renders in its layout.
pub struct PageContext {
    /// Page title.
    pub title: &'static str,
    /// Logged-in user, if any.
    pub user: Option<CurrentUser>,
    /// Active categories for the catalog menu.
    pub menu: Vec<Category>,
    /// Basket totals for the header.
    pub basket: BasketSummary,
}

impl PageContext {
    /// Load the menu and the user's basket totals.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn load(
        state: &AppState,
        title: &'static str,
        user: Option<CurrentUser>,
    ) -> Result<Self> {
        let menu = CategoryRepository::new(state.pool()).list_active().await?;
        let basket = match &user {
            Some(u) => {
                let lines = BasketRepository::new(state.pool()).lines(u.id).await?;
                BasketSummary::from_lines(&lines)
            }
            None => BasketSummary::default(),
        };

        Ok(Self {
            title,
            user,
            menu,
            basket,
        })
    }

    /// Context without any store access.
    #[must_use]
    pub fn bare(title: &'static str, user: Option<CurrentUser>) -> Self {
        Self {
            title,
            user,
            menu: Vec::new(),
            basket: BasketSummary::default(),
        }
    }

    /// Whether the admin link should be shown.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_superuser)
    }
}

/// Create the catalog routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(products::featured))
        .route("/products/{id}/", get(products::category))
        .route("/products/{id}/detail", get(products::detail))
}

/// Create the basket routes.
pub fn basket_routes() -> Router<AppState> {
    Router::new()
        .route("/basket/", get(basket::show))
        .route("/basket/add/{id}/", get(basket::add).post(basket::add))
        .route("/basket/remove/{id}/", get(basket::remove).post(basket::remove))
        .route(
            "/basket/edit/{id}/{quantity}/",
            get(basket::edit).post(basket::edit),
        )
}

/// Create the auth routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login/", get(auth::login_page).post(auth::login))
        .route(
            "/auth/register/",
            get(auth::register_page).post(auth::register),
        )
        .route("/auth/logout/", get(auth::logout).post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/contact/", get(home::contact))
        .merge(product_routes())
        .merge(basket_routes())
        .merge(auth_routes())
        .merge(admin::routes())
}
