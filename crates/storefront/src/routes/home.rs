//! Landing and contact page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::PageContext;
use crate::db::ProductRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::state::AppState;

/// Number of products on the landing page.
const LANDING_PRODUCTS: i64 = 4;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct LandingTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
}

/// Display the landing page.
#[instrument(skip(state, user))]
pub async fn landing(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, "Home", user).await?;
    let products = ProductRepository::new(state.pool())
        .first_visible(LANDING_PRODUCTS)
        .await?;

    Ok(LandingTemplate { page, products })
}

/// Display the contact page.
#[instrument(skip(state, user))]
pub async fn contact(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, "Contact", user).await?;
    Ok(ContactTemplate { page })
}
